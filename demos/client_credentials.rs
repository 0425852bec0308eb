//! Issues a client-credentials token against a mock identity service and shows the second call
//! being served from the in-memory cache.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use persona_auth::{
	auth::{ClientCredentials, ClientId, RequestId, parse_host},
	cache::{CacheStore, MemoryCache},
	http::HttpConfig,
	issuer::TokenIssuer,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/tokens");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":900}");
		})
		.await;
	let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::default());
	let issuer = TokenIssuer::with_reqwest(cache, &HttpConfig::default())?;
	let credentials = ClientCredentials::new(
		ClientId::new("demo-client")?,
		"super-secret",
		parse_host(&format!("http://{}", server.address()))?,
	);
	let first = issuer.generate(&credentials, &RequestId::generate()).await?;
	let second = issuer.generate(&credentials, &RequestId::generate()).await?;

	println!("Issued token: {}.", first.expose());
	println!("Cached token: {}.", second.expose());

	token_mock.assert_async().await;

	Ok(())
}
