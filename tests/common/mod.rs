#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use time::{Duration, OffsetDateTime};
// self
use persona_auth::{
	auth::{ClientCredentials, ClientId, RequestId, Token, parse_host},
	cache::{CacheStore, MemoryCache},
	http::{HttpConfig, HttpTransport, ReqwestHttpClient},
	issuer::TokenIssuer,
	keys::PublicKeyProvider,
	url::Url,
	validator::TokenValidator,
};

pub const SIGNING_KEY: &str = include_str!("../fixtures/signing_key.pem");
pub const ROGUE_KEY: &str = include_str!("../fixtures/rogue_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/signing_key.pub.pem");

/// Plain-http base URL of `server`.
pub fn host(server: &MockServer) -> Url {
	parse_host(&format!("http://{}", server.address()))
		.expect("Mock server URL should parse as a host.")
}

pub fn transport() -> Arc<dyn HttpTransport> {
	Arc::new(
		ReqwestHttpClient::from_config(&HttpConfig::default())
			.expect("Reqwest transport should build for tests."),
	)
}

pub fn credentials(host: Url, client_id: &str, secret: &str) -> ClientCredentials {
	ClientCredentials::new(
		ClientId::new(client_id).expect("Client identifier fixture should be valid."),
		secret,
		host,
	)
}

pub fn request_id() -> RequestId {
	RequestId::generate()
}

pub fn issuer(cache: &MemoryCache) -> TokenIssuer {
	TokenIssuer::new(Arc::new(cache.clone()) as Arc<dyn CacheStore>, transport())
}

pub fn validator(cache: &MemoryCache) -> TokenValidator {
	let store = Arc::new(cache.clone()) as Arc<dyn CacheStore>;
	let http = transport();

	TokenValidator::new(
		PublicKeyProvider::new(store.clone(), http.clone()),
		TokenIssuer::new(store, http),
	)
}

pub fn exp_in(seconds: i64) -> i64 {
	(OffsetDateTime::now_utc() + Duration::seconds(seconds)).unix_timestamp()
}

pub fn sign(private_pem: &str, claims: serde_json::Value) -> Token {
	let key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
		.expect("Signing key fixture should parse.");
	let encoded = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
		.expect("Token fixture should encode.");

	Token::new(encoded)
}

pub async fn mock_public_key<'a>(server: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/keys").header("accept", "text/plain");
			then.status(200).header("content-type", "text/plain").body(body);
		})
		.await
}
