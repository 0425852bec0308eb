//! Validates an inbound JWT against a mock identity service's signing key and prints the outcome
//! for a few scope requirements.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use persona_auth::{
	auth::{ScopeSet, Token, parse_host},
	cache::{CacheStore, MemoryCache},
	http::{HttpConfig, HttpTransport, ReqwestHttpClient},
	issuer::TokenIssuer,
	jsonwebtoken::{self, Algorithm, EncodingKey, Header},
	keys::PublicKeyProvider,
	validator::{TokenValidator, ValidationRequest},
};

const SIGNING_KEY: &str = include_str!("../tests/fixtures/signing_key.pem");
const PUBLIC_KEY: &str = include_str!("../tests/fixtures/signing_key.pub.pem");
const REQUIREMENTS: [(&str, bool); 4] = [
	("", true),
	("feeds:read", true),
	("feeds:read feeds:write", true),
	("feeds:read feeds:write", false),
];

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let keys_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/keys");
			then.status(200).header("content-type", "text/plain").body(PUBLIC_KEY);
		})
		.await;
	let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::default());
	let http: Arc<dyn HttpTransport> =
		Arc::new(ReqwestHttpClient::from_config(&HttpConfig::default())?);
	let validator = TokenValidator::new(
		PublicKeyProvider::new(cache.clone(), http.clone()),
		TokenIssuer::new(cache, http),
	);
	let exp = (OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp();
	let token = Token::new(jsonwebtoken::encode(
		&Header::new(Algorithm::RS256),
		&serde_json::json!({ "exp": exp, "scopes": ["feeds:read"] }),
		&EncodingKey::from_rsa_pem(SIGNING_KEY.as_bytes())?,
	)?);
	let host = parse_host(&format!("http://{}", server.address()))?;

	for (scopes, all) in REQUIREMENTS {
		let request = ValidationRequest::new(host.clone())
			.with_scopes(scopes.parse::<ScopeSet>()?)
			.with_all(all);
		let outcome = validator.validate(&token, &request).await?;

		println!("scopes=[{scopes}] all={all}: {outcome}.");
	}

	keys_mock.assert_async().await;

	Ok(())
}
