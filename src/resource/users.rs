//! User profiles held by the identity service.

// self
use crate::{
	_prelude::*,
	auth::RequestId,
	error::{ClientError, ConfigError},
	http,
	resource::ResourceClient,
};

#[derive(Deserialize)]
struct UserBody {
	guid: String,
	#[serde(default)]
	profile: ProfileBody,
}

#[derive(Default, Deserialize)]
pub(crate) struct ProfileBody {
	first_name: Option<String>,
	surname: Option<String>,
	email: Option<String>,
}

/// A user known to the identity service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
	/// Globally unique identifier.
	pub guid: String,
	/// Given name.
	pub first_name: Option<String>,
	/// Family name.
	pub surname: Option<String>,
	/// E-mail address.
	pub email: Option<String>,
	host: Url,
}
impl User {
	pub(crate) fn from_profile(guid: String, profile: ProfileBody, host: &Url) -> Self {
		Self {
			guid,
			first_name: profile.first_name,
			surname: profile.surname,
			email: profile.email,
			host: host.clone(),
		}
	}

	/// Given name and surname separated by a space.
	pub fn full_name(&self) -> String {
		format!(
			"{} {}",
			self.first_name.as_deref().unwrap_or_default(),
			self.surname.as_deref().unwrap_or_default()
		)
	}

	/// URL resolving to the user's avatar image, optionally sized (pixels) and tinted
	/// (hex background colour).
	pub fn avatar_url(&self, size: Option<u32>, colour: Option<&str>) -> Result<Url, ConfigError> {
		let mut url = http::endpoint(&self.host, ["users", self.guid.as_str(), "avatar"])?;

		if size.is_some() || colour.is_some() {
			let mut query = url.query_pairs_mut();

			if let Some(size) = size {
				query.append_pair("size", &size.to_string());
			}
			if let Some(colour) = colour {
				query.append_pair("colour", colour);
			}
		}

		Ok(url)
	}
}

impl ResourceClient {
	/// Looks up a user by guid via `GET {host}/users/{guid}`, returning `None` on 404.
	pub async fn find_user(
		&self,
		host: &Url,
		guid: &str,
		request_id: &RequestId,
	) -> Result<Option<User>> {
		let url = http::endpoint(host, ["users", guid])?;
		let body = match self.get_json::<UserBody>(&url, request_id).await {
			Ok(body) => body,
			Err(Error::Client(ClientError::NotFound)) => return Ok(None),
			Err(e) => return Err(e),
		};

		Ok(Some(User::from_profile(body.guid, body.profile, host)))
	}
}
