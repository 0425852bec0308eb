//! Client-credentials token issuance with digest-keyed caching.
//!
//! [`TokenIssuer::generate`] reuses a cached token for the same client, secret, and host until
//! shortly before the server-declared expiry, and only calls `POST {host}/oauth/tokens` on a
//! miss. Concurrent misses for the same key are not de-duplicated; each caller may issue its
//! own request and the last write wins.

// crates.io
use ::http::{Method, StatusCode, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, RequestId, Token, TokenRecord},
	cache::CacheStore,
	error::{ClientError, ConfigError},
	http::{self, HttpTransport, JSON},
	obs::{self, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::{HttpConfig, ReqwestHttpClient};

type HmacSha256 = Hmac<Sha256>;

/// Path segments of the token endpoint.
pub const TOKEN_PATH: [&str; 2] = ["oauth", "tokens"];
/// Margin subtracted from `expires_in` before caching an issued token.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(5);
/// Longest lifetime accepted from `expires_in`; larger values are capped.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::days(366);

const INVALID_CREDENTIALS: &str = "The client credentials are invalid";

#[derive(Serialize)]
struct TokenRequestBody<'a> {
	client_id: &'a str,
	client_secret: &'a str,
	grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenResponseBody {
	access_token: String,
	expires_in: i64,
}

/// Issues and caches bearer tokens through the client-credentials grant.
#[derive(Clone)]
pub struct TokenIssuer {
	cache: Arc<dyn CacheStore>,
	http: Arc<dyn HttpTransport>,
	safety_margin: Duration,
}
impl TokenIssuer {
	/// Creates an issuer over a caller-owned cache and transport.
	pub fn new(cache: Arc<dyn CacheStore>, http: Arc<dyn HttpTransport>) -> Self {
		Self { cache, http, safety_margin: DEFAULT_SAFETY_MARGIN }
	}

	/// Creates an issuer backed by a reqwest transport built from `config`.
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(cache: Arc<dyn CacheStore>, config: &HttpConfig) -> Result<Self> {
		let http = ReqwestHttpClient::from_config(config)?;

		Ok(Self::new(cache, Arc::new(http)))
	}

	/// Overrides the margin subtracted from `expires_in` (defaults to 5 seconds).
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Returns a bearer token for `credentials`, reusing the cached one when still valid.
	///
	/// # Errors
	///
	/// - [`Error::Client`] when the identity service rejects the credentials; a bare 400/401
	///   reads "The client credentials are invalid".
	/// - [`Error::Server`] for 5xx responses.
	/// - [`Error::ServerCommunication`] when the service cannot be reached or times out.
	pub async fn generate(
		&self,
		credentials: &ClientCredentials,
		request_id: &RequestId,
	) -> Result<Token> {
		const KIND: OpKind = OpKind::IssueToken;

		let span = OpSpan::new(KIND, "generate");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let key = token_cache_key(credentials);

				if let Some(cached) = self.cache.get(&key).await? {
					obs::trace_cache_lookup(KIND, &key, true);
					obs::record_op_outcome(KIND, OpOutcome::CacheHit);

					return Ok(Token::new(cached));
				}

				obs::trace_cache_lookup(KIND, &key, false);

				let issued = self.request_token(credentials, request_id).await?;
				let ttl = cache_ttl(issued.expires_in, self.safety_margin);

				if ttl.is_positive() {
					self.cache.put(&key, issued.access_token.clone(), ttl).await?;
				}

				Ok(Token::with_expiry(
					issued.access_token,
					OffsetDateTime::now_utc().saturating_add(ttl),
				))
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Fetches the authoritative record for `token` from `GET {host}/oauth/tokens/{token}`.
	pub async fn fetch_record(
		&self,
		host: &Url,
		token: &Token,
		request_id: &RequestId,
	) -> Result<TokenRecord> {
		const KIND: OpKind = OpKind::FetchTokenRecord;

		let span = OpSpan::new(KIND, "fetch_record");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let [oauth, tokens] = TOKEN_PATH;
				let url = http::endpoint(host, [oauth, tokens, token.expose()])?;
				let request = http::finish(
					http::request(Method::GET, &url, request_id).header(header::ACCEPT, JSON),
					Vec::new(),
				)?;

				obs::trace_request(KIND, host, request_id);

				let response = http::send(self.http.as_ref(), request).await?;
				let body = http::interpret(&response, StatusCode::OK)?;

				http::parse_json(body, response.status())
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn request_token(
		&self,
		credentials: &ClientCredentials,
		request_id: &RequestId,
	) -> Result<TokenResponseBody> {
		let url = http::endpoint(&credentials.host, TOKEN_PATH)?;
		let body = serde_json::to_vec(&TokenRequestBody {
			client_id: &credentials.client_id,
			client_secret: credentials.client_secret.expose(),
			grant_type: "client_credentials",
		})
		.map_err(|source| ConfigError::RequestBody { source })?;
		let request = http::finish(
			http::request(Method::POST, &url, request_id)
				.header(header::CONTENT_TYPE, JSON)
				.header(header::ACCEPT, JSON),
			body,
		)?;

		obs::trace_request(OpKind::IssueToken, &url, request_id);

		let response = http::send(self.http.as_ref(), request).await?;
		let body = http::interpret(&response, StatusCode::OK).map_err(describe_rejection)?;

		http::parse_json(body, response.status())
	}
}
impl Debug for TokenIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenIssuer").field("safety_margin", &self.safety_margin).finish()
	}
}

/// Cache key for issued tokens: an HMAC-SHA256 over host + client id, keyed by the secret.
pub fn token_cache_key(credentials: &ClientCredentials) -> String {
	let mut mac = HmacSha256::new_from_slice(credentials.client_secret.as_bytes())
		.expect("HMAC can take key of any size");

	mac.update(credentials.host.as_str().as_bytes());
	mac.update(credentials.client_id.as_bytes());

	format!("access_token:{}", URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// How long a token declared valid for `expires_in` seconds may be reused.
///
/// `expires_in` is capped at [`MAX_TOKEN_LIFETIME`] and the result never goes below zero.
fn cache_ttl(expires_in: i64, safety_margin: Duration) -> Duration {
	let lifetime = Duration::seconds(expires_in.clamp(0, MAX_TOKEN_LIFETIME.whole_seconds()));

	lifetime.saturating_sub(safety_margin).max(Duration::ZERO)
}

fn describe_rejection(err: Error) -> Error {
	match err {
		Error::Client(ClientError::BadRequest { description: None }) =>
			ClientError::BadRequest { description: Some(INVALID_CREDENTIALS.into()) }.into(),
		Error::Client(ClientError::Unauthorized { description: None }) =>
			ClientError::Unauthorized { description: Some(INVALID_CREDENTIALS.into()) }.into(),
		other => other,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ClientId, parse_host};

	fn credentials(client: &str, secret: &str, host: &str) -> ClientCredentials {
		ClientCredentials::new(
			ClientId::new(client).expect("Client fixture should be valid."),
			secret,
			parse_host(host).expect("Host fixture should parse."),
		)
	}

	#[test]
	fn cache_key_hides_secret_and_separates_clients() {
		let base = credentials("primate", "bananas", "https://persona.example.com");
		let key = token_cache_key(&base);

		assert!(key.starts_with("access_token:"));
		assert!(!key.contains("bananas"));
		assert!(!key.contains("primate"));
		assert_eq!(key, token_cache_key(&base));

		for other in [
			credentials("primate", "apples", "https://persona.example.com"),
			credentials("gorilla", "bananas", "https://persona.example.com"),
			credentials("primate", "bananas", "https://other.example.com"),
		] {
			assert_ne!(key, token_cache_key(&other));
		}
	}

	#[test]
	fn cache_key_accepts_secrets_of_any_length() {
		let host = "https://persona.example.com";
		let empty = token_cache_key(&credentials("primate", "", host));
		let long = token_cache_key(&credentials("primate", &"x".repeat(512), host));

		assert!(empty.starts_with("access_token:"));
		assert!(long.starts_with("access_token:"));
		assert_ne!(empty, long);
	}

	#[test]
	fn cache_ttl_stays_within_bounds_for_any_expiry() {
		assert_eq!(cache_ttl(900, DEFAULT_SAFETY_MARGIN), Duration::seconds(895));
		assert_eq!(cache_ttl(5, DEFAULT_SAFETY_MARGIN), Duration::ZERO);
		assert_eq!(cache_ttl(-30, DEFAULT_SAFETY_MARGIN), Duration::ZERO);
		assert_eq!(cache_ttl(i64::MIN, DEFAULT_SAFETY_MARGIN), Duration::ZERO);
		assert_eq!(
			cache_ttl(i64::MAX, DEFAULT_SAFETY_MARGIN),
			MAX_TOKEN_LIFETIME - DEFAULT_SAFETY_MARGIN
		);
		assert_eq!(cache_ttl(i64::MAX, Duration::MAX), Duration::ZERO);
	}

	#[test]
	fn bare_credential_rejections_get_a_description() {
		let err = describe_rejection(ClientError::from_status(401, None).into());

		assert_eq!(err.to_string(), INVALID_CREDENTIALS);

		let err = describe_rejection(ClientError::from_status(400, Some("nope".into())).into());

		assert_eq!(err.to_string(), "nope");

		let err = describe_rejection(ClientError::NotFound.into());

		assert!(matches!(err, Error::Client(ClientError::NotFound)));
	}

	#[test]
	fn request_body_uses_client_credentials_grant() {
		let body = serde_json::to_value(TokenRequestBody {
			client_id: "primate",
			client_secret: "bananas",
			grant_type: "client_credentials",
		})
		.expect("Request body should serialize.");

		assert_eq!(
			body,
			serde_json::json!({
				"client_id": "primate",
				"client_secret": "bananas",
				"grant_type": "client_credentials",
			})
		);
	}
}
