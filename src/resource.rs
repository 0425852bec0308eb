//! Authorized requests against services protected by the identity service.
//!
//! [`ResourceClient`] is the surface downstream API wrappers build on: it asks the
//! [`TokenIssuer`] for a bearer token, attaches it, and funnels the response through the shared
//! status policy in [`http::interpret`].

pub mod users;

pub use users::User;

// crates.io
use ::http::{Method, StatusCode, header};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, RequestId},
	http::{self, HttpTransport, JSON},
	issuer::TokenIssuer,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Performs bearer-authenticated JSON requests on behalf of one OAuth client.
#[derive(Clone)]
pub struct ResourceClient {
	issuer: TokenIssuer,
	http: Arc<dyn HttpTransport>,
	credentials: ClientCredentials,
}
impl ResourceClient {
	/// Creates a client issuing tokens for `credentials`.
	pub fn new(
		issuer: TokenIssuer,
		http: Arc<dyn HttpTransport>,
		credentials: ClientCredentials,
	) -> Self {
		Self { issuer, http, credentials }
	}

	/// Credentials used when requesting tokens.
	pub fn credentials(&self) -> &ClientCredentials {
		&self.credentials
	}

	/// Sends `GET url` with a bearer token and decodes the JSON body.
	///
	/// # Errors
	///
	/// Token issuance failures propagate unchanged; the response is classified with
	/// [`http::interpret`].
	pub async fn get_json<T>(&self, url: &Url, request_id: &RequestId) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: OpKind = OpKind::ResourceRequest;

		let span = OpSpan::new(KIND, "get_json");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.issuer.generate(&self.credentials, request_id).await?;
				let request = http::finish(
					http::request(Method::GET, url, request_id)
						.header(header::ACCEPT, JSON)
						.header(header::AUTHORIZATION, token.bearer()),
					Vec::new(),
				)?;

				obs::trace_request(KIND, url, request_id);

				let response = http::send(self.http.as_ref(), request).await?;
				let body = http::interpret(&response, StatusCode::OK)?;

				http::parse_json(body, response.status())
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
impl Debug for ResourceClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResourceClient")
			.field("issuer", &self.issuer)
			.field("credentials", &self.credentials)
			.finish()
	}
}
