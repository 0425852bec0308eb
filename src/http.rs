//! Transport primitives and response interpretation shared by every remote call.
//!
//! The module exposes [`HttpTransport`] so downstream crates can plug in their own HTTP stack
//! (or a fake in tests) while the issuer, key provider, and validator keep identical request
//! shaping and error classification. Requests and responses use the `http` crate types with
//! fully buffered bodies; every response is funnelled through [`interpret`], which maps
//! statuses onto [`Error::Client`], [`Error::Server`], and [`Error::ServerCommunication`].

// std
use std::{sync::LazyLock, time::Duration as StdDuration};
// crates.io
use ::http::{Method, Request, Response, StatusCode, header, request::Builder};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::RequestId,
	error::{ClientError, ConfigError, TransportError},
};

/// Outbound request with a buffered body.
pub type HttpRequest = Request<Vec<u8>>;
/// Inbound response with a buffered body.
pub type HttpResponse = Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Header carrying the caller-supplied correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Media type used for JSON request and response bodies.
pub const JSON: &str = "application/json";
/// Media type used for the plain-text signing key.
pub const PLAIN_TEXT: &str = "text/plain";

static USER_AGENT: LazyLock<String> = LazyLock::new(|| {
	format!(
		"persona-auth/{} rust ({}/{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
});

/// Abstraction over HTTP stacks capable of executing identity-service requests.
///
/// Implementations only move bytes: they must not follow redirects, retry, or interpret
/// statuses. Network failures and timeouts are reported as [`TransportError`] values so they
/// surface as [`Error::ServerCommunication`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Settings applied when building the default reqwest transport.
#[derive(Clone, Debug)]
pub struct HttpConfig {
	/// Upper bound on a whole request, including reading the body.
	pub timeout: StdDuration,
	/// Upper bound on establishing the connection.
	pub connect_timeout: StdDuration,
}
impl HttpConfig {
	/// Overrides the request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the connect timeout.
	pub fn with_connect_timeout(mut self, timeout: StdDuration) -> Self {
		self.connect_timeout = timeout;

		self
	}
}
impl Default for HttpConfig {
	fn default() -> Self {
		Self { timeout: StdDuration::from_secs(30), connect_timeout: StdDuration::from_secs(10) }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Identity-service endpoints answer directly, so clients built by
/// [`ReqwestHttpClient::from_config`] never follow redirects. A 3xx therefore surfaces as
/// [`TransportError::UnexpectedStatus`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured timeouts.
	pub fn from_config(config: &HttpConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(config.timeout)
			.connect_timeout(config.connect_timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// `User-Agent` sent with every request, identifying this library and its runtime.
pub fn user_agent() -> &'static str {
	&USER_AGENT
}

/// Joins `segments` onto `host`, keeping any base path the host already carries.
///
/// Segments are percent-encoded individually, so tokens and identifiers can be passed as-is.
pub fn endpoint<I, S>(host: &Url, segments: I) -> Result<Url, ConfigError>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut url = host.clone();

	url.set_query(None);
	url.set_fragment(None);
	url.path_segments_mut()
		.map_err(|_| ConfigError::CannotBeBase { url: host.to_string() })?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

/// Starts a request carrying the library `User-Agent` and `X-Request-Id`.
pub fn request(method: Method, url: &Url, request_id: &RequestId) -> Builder {
	Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(header::USER_AGENT, user_agent())
		.header(REQUEST_ID_HEADER, request_id.to_string())
}

/// Finishes a request builder, mapping construction failures into [`ConfigError`].
pub fn finish(builder: Builder, body: Vec<u8>) -> Result<HttpRequest> {
	builder.body(body).map_err(|e| ConfigError::from(e).into())
}

/// Sends a request through `transport`, surfacing transport failures as
/// [`Error::ServerCommunication`].
pub async fn send(transport: &dyn HttpTransport, request: HttpRequest) -> Result<HttpResponse> {
	transport.execute(request).await.map_err(Error::from)
}

/// Applies the shared status policy to `response`.
///
/// The expected status yields the body; 4xx becomes a [`ClientError`] carrying the JSON
/// `error_description` when present; 5xx becomes [`Error::Server`]; anything else is treated
/// as a communication failure.
pub fn interpret(response: &HttpResponse, expected: StatusCode) -> Result<&[u8]> {
	let status = response.status();

	if status == expected {
		return Ok(response.body());
	}
	if status.is_client_error() {
		let description = error_description(response.body());

		return Err(ClientError::from_status(status.as_u16(), description).into());
	}
	if status.is_server_error() {
		return Err(Error::Server { status: status.as_u16() });
	}

	Err(TransportError::UnexpectedStatus { status: status.as_u16() }.into())
}

/// Decodes a JSON body, reporting the failing path on error.
pub fn parse_json<T>(body: &[u8], status: StatusCode) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::ResponseParse { source, status: status.as_u16() })
}

fn error_description(body: &[u8]) -> Option<String> {
	#[derive(Deserialize)]
	struct ErrorBody {
		error_description: Option<String>,
	}

	serde_json::from_slice::<ErrorBody>(body).ok()?.error_description
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Status fixture should be valid.");

		response
	}

	fn host(raw: &str) -> Url {
		Url::parse(raw).expect("Host fixture should parse.")
	}

	#[test]
	fn interpret_returns_body_for_expected_status() {
		let response = response(200, "ok");

		assert_eq!(interpret(&response, StatusCode::OK).expect("200 should succeed."), b"ok");
	}

	#[test]
	fn interpret_extracts_error_description_from_client_errors() {
		let err = interpret(
			&response(400, r#"{"error_description":"The client credentials are invalid"}"#),
			StatusCode::OK,
		)
		.expect_err("400 should fail.");

		assert!(matches!(err, Error::Client(ClientError::BadRequest { .. })));
		assert_eq!(err.to_string(), "The client credentials are invalid");

		let err = interpret(&response(404, "not json"), StatusCode::OK)
			.expect_err("404 should fail.");

		assert!(matches!(err, Error::Client(ClientError::NotFound)));
	}

	#[test]
	fn interpret_separates_server_and_communication_failures() {
		let err = interpret(&response(503, ""), StatusCode::OK).expect_err("503 should fail.");

		assert!(matches!(err, Error::Server { status: 503 }));

		let err = interpret(&response(302, ""), StatusCode::OK).expect_err("302 should fail.");

		assert!(matches!(
			err,
			Error::ServerCommunication(TransportError::UnexpectedStatus { status: 302 })
		));

		let err = interpret(&response(201, ""), StatusCode::OK).expect_err("201 should fail.");

		assert!(matches!(err, Error::ServerCommunication(_)));
	}

	#[test]
	fn endpoint_keeps_base_path_and_encodes_segments() {
		let url = endpoint(&host("https://persona.example.com"), ["oauth", "tokens"])
			.expect("Endpoint should join.");

		assert_eq!(url.as_str(), "https://persona.example.com/oauth/tokens");

		let url = endpoint(&host("https://example.com/persona/?x=1"), ["oauth", "keys"])
			.expect("Endpoint should join.");

		assert_eq!(url.as_str(), "https://example.com/persona/oauth/keys");

		let url = endpoint(&host("https://example.com"), ["oauth", "tokens", "a.b/c"])
			.expect("Endpoint should join.");

		assert_eq!(url.as_str(), "https://example.com/oauth/tokens/a.b%2Fc");
	}

	#[test]
	fn requests_carry_user_agent_and_request_id() {
		let request_id = RequestId::new("abc123").expect("Request id fixture should be valid.");
		let request = finish(
			request(Method::GET, &host("https://example.com/oauth/keys"), &request_id),
			Vec::new(),
		)
		.expect("Request should build.");

		assert_eq!(request.headers()[REQUEST_ID_HEADER], "abc123");
		assert!(
			request.headers()[header::USER_AGENT]
				.to_str()
				.expect("User agent should be ASCII.")
				.starts_with("persona-auth/")
		);
	}

	#[test]
	fn parse_json_reports_status_on_failure() {
		let err = parse_json::<HashMap<String, u64>>(b"{\"a\":\"x\"}", StatusCode::OK)
			.expect_err("Mismatched types should fail.");

		assert!(matches!(err, Error::ResponseParse { status: 200, .. }));
	}
}
