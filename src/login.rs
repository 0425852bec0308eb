//! Server-side login through the identity service's auth providers.
//!
//! [`Login::generate_url`] sends the user to `{host}/auth/providers/{provider}/login` with a fresh
//! [`LoginState`] for the application to keep in its session. After sign-in the identity service
//! POSTs a signed `persona:payload` form field back to the application, and [`Login::validate`]
//! checks it against the stored state and the app secret.

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{AppId, LoginState, Secret, Token},
	error::ConfigError,
	http,
	obs::{self, OpKind, OpOutcome},
	resource::{User, users::ProfileBody},
};

type HmacSha256 = Hmac<Sha256>;

/// Form field carrying the signed login payload.
pub const PAYLOAD_FIELD: &str = "persona:payload";

const PAYLOAD_ENCODING: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Deserialize)]
struct PayloadBody {
	guid: Option<String>,
	profile: Option<ProfileBody>,
	token: Option<PayloadToken>,
	redirect: Option<String>,
}

#[derive(Deserialize)]
struct PayloadToken {
	access_token: Option<String>,
}

/// Why a login callback was refused. Display renders the message shown to operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum LoginRejection {
	/// The form has no `persona:payload` field.
	#[error("payload missing key persona:payload")]
	MissingPayload,
	/// The field is not base64-encoded JSON describing an object.
	#[error("payload is not valid JSON")]
	InvalidJson,
	/// The payload was issued for another session.
	#[error("payload state does not match provided")]
	StateMismatch,
	/// The payload was not signed with this application's secret.
	#[error("payload signature does not match expected")]
	InvalidSignature,
}
impl LoginRejection {
	/// Stable label for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingPayload => "missing_payload",
			Self::InvalidJson => "invalid_json",
			Self::StateMismatch => "state_mismatch",
			Self::InvalidSignature => "invalid_signature",
		}
	}
}

/// Where to send the user, and the state to remember until the callback arrives.
#[derive(Clone, Debug)]
pub struct LoginRedirect {
	/// Auth provider login URL.
	pub url: Url,
	/// Value to store in the user's session.
	pub state: LoginState,
}

/// A verified login.
#[derive(Clone, Debug)]
pub struct LoginSession {
	/// The signed-in user.
	pub user: User,
	/// Access token issued for the user, when the payload carried one.
	pub access_token: Option<Token>,
	/// Where to send the user next: the payload's `redirect`, else the configured redirect URI.
	pub redirect_uri: String,
}

/// Login flow for an application registered with the identity service.
#[derive(Clone, Debug)]
pub struct Login {
	host: Url,
	app_id: AppId,
	secret: Secret,
	provider: String,
	redirect_uri: String,
}
impl Login {
	/// Configures the flow for one application and auth provider.
	pub fn new(
		host: Url,
		app_id: AppId,
		secret: impl Into<String>,
		provider: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			host,
			app_id,
			secret: Secret::new(secret),
			provider: provider.into(),
			redirect_uri: redirect_uri.into(),
		}
	}

	/// Redirect URI sent to the auth provider.
	pub fn redirect_uri(&self) -> &str {
		&self.redirect_uri
	}

	/// Builds the provider login URL with a fresh state.
	///
	/// `require` asks the identity service for extra user data, e.g. `profile`.
	pub fn generate_url(&self, require: Option<&str>) -> Result<LoginRedirect, ConfigError> {
		let state = LoginState::generate();
		let mut url =
			http::endpoint(&self.host, ["auth", "providers", self.provider.as_str(), "login"])?;

		{
			let mut query = url.query_pairs_mut();

			query.append_pair("app", &self.app_id).append_pair("redirectUri", &self.redirect_uri);

			if let Some(require) = require {
				query.append_pair("require", require);
			}

			query.append_pair("state", &state);
		}

		Ok(LoginRedirect { url, state })
	}

	/// Checks the form POSTed back by the identity service against the state stored when the
	/// login started.
	///
	/// Checks run in order: payload present, payload decodes to a JSON object, state matches,
	/// signature matches. The first failure is returned.
	pub fn validate(
		&self,
		form: &HashMap<String, String>,
		state: &str,
	) -> Result<LoginSession, LoginRejection> {
		const KIND: OpKind = OpKind::ValidateLogin;

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = self.check(form, state);

		if let Err(rejection) = &result {
			obs::trace_rejection(rejection.as_str(), rejection);
		}

		obs::record_result(KIND, &result);

		result
	}

	/// URL that ends the user's identity service session and returns them to `redirect`.
	pub fn logout_url(&self, redirect: &str) -> Result<Url, ConfigError> {
		let mut url = http::endpoint(&self.host, ["auth", "logout"])?;

		url.query_pairs_mut().append_pair("redirectUri", redirect);

		Ok(url)
	}

	fn check(
		&self,
		form: &HashMap<String, String>,
		state: &str,
	) -> Result<LoginSession, LoginRejection> {
		let encoded = form.get(PAYLOAD_FIELD).ok_or(LoginRejection::MissingPayload)?;
		let mut payload = decode_payload(encoded)?;

		if payload.get("state").and_then(Value::as_str) != Some(state) {
			return Err(LoginRejection::StateMismatch);
		}

		let signature = payload.shift_remove("signature");

		verify_signature(&self.secret, &payload, signature.as_ref().and_then(Value::as_str))?;

		let body = serde_json::from_value::<PayloadBody>(Value::Object(payload))
			.map_err(|_| LoginRejection::InvalidJson)?;

		Ok(LoginSession {
			user: User::from_profile(
				body.guid.unwrap_or_default(),
				body.profile.unwrap_or_default(),
				&self.host,
			),
			access_token: body.token.and_then(|token| token.access_token).map(Token::new),
			redirect_uri: body.redirect.unwrap_or_else(|| self.redirect_uri.clone()),
		})
	}
}

fn decode_payload(encoded: &str) -> Result<Map<String, Value>, LoginRejection> {
	let compact = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect::<String>();
	let json = PAYLOAD_ENCODING.decode(compact).map_err(|_| LoginRejection::InvalidJson)?;

	match serde_json::from_slice::<Value>(&json) {
		Ok(Value::Object(payload)) => Ok(payload),
		_ => Err(LoginRejection::InvalidJson),
	}
}

/// Text the identity service signs: compact JSON with forward slashes escaped.
fn signed_text(payload: &Map<String, Value>) -> Result<String, LoginRejection> {
	let json = serde_json::to_string(payload).map_err(|_| LoginRejection::InvalidSignature)?;

	Ok(json.replace('/', "\\/"))
}

fn verify_signature(
	secret: &Secret,
	payload: &Map<String, Value>,
	signature: Option<&str>,
) -> Result<(), LoginRejection> {
	let expected = signature
		.and_then(|signature| hex::decode(signature).ok())
		.ok_or(LoginRejection::InvalidSignature)?;
	let mut mac =
		HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");

	mac.update(signed_text(payload)?.as_bytes());
	mac.verify_slice(&expected).map_err(|_| LoginRejection::InvalidSignature)
}
