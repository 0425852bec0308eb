//! Signing key retrieval with per-host caching.

// std
use std::env;
// crates.io
use ::http::{Method, StatusCode, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::DecodingKey;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::RequestId,
	cache::CacheStore,
	error::ConfigError,
	http::{self, HttpTransport, PLAIN_TEXT},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Path segments of the signing key endpoint.
pub const KEYS_PATH: [&str; 2] = ["oauth", "keys"];
/// Environment variable overriding how long a fetched key is reused, in seconds.
pub const ENV_KEY_EXPIRY: &str = "PUBLIC_KEY_EXPIRY_SECONDS";

/// Caching policy for signing keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKeyCacheOptions {
	/// How long a fetched key is reused.
	pub ttl: Duration,
	/// Grace window during which a just-expired key keeps being served while one caller refills.
	pub race_condition_ttl: Duration,
}
impl PublicKeyCacheOptions {
	/// Overrides the key lifetime.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Overrides the race-condition window.
	pub fn with_race_condition_ttl(mut self, race_condition_ttl: Duration) -> Self {
		self.race_condition_ttl = race_condition_ttl;

		self
	}

	/// Defaults, with the lifetime taken from `PUBLIC_KEY_EXPIRY_SECONDS` when set.
	pub fn from_env() -> Result<Self, ConfigError> {
		let options = Self::default();

		match env::var(ENV_KEY_EXPIRY) {
			Ok(raw) => {
				let seconds = raw.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnv {
					name: ENV_KEY_EXPIRY,
					value: raw.clone(),
				})?;

				Ok(options.with_ttl(Duration::seconds(seconds.into())))
			},
			Err(_) => Ok(options),
		}
	}
}
impl Default for PublicKeyCacheOptions {
	fn default() -> Self {
		Self { ttl: Duration::minutes(7), race_condition_ttl: Duration::seconds(10) }
	}
}

/// RSA public key served by the identity service, ready for RS256 verification.
///
/// Clones share the parsed key.
#[derive(Clone)]
pub struct PublicKey {
	pem: Arc<str>,
	decoding: Arc<DecodingKey>,
}
impl PublicKey {
	/// Parses a PEM-encoded RSA public key.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidKey`] when the text is not a usable RSA key.
	pub fn from_pem(pem: impl AsRef<str>) -> Result<Self> {
		let pem = pem.as_ref();
		let decoding = DecodingKey::from_rsa_pem(pem.as_bytes())
			.map_err(|source| Error::InvalidKey { source })?;

		Ok(Self { pem: pem.into(), decoding: Arc::new(decoding) })
	}

	/// PEM text as served by the identity service.
	pub fn pem(&self) -> &str {
		&self.pem
	}

	/// Verification key handed to `jsonwebtoken`.
	pub fn decoding_key(&self) -> &DecodingKey {
		&self.decoding
	}
}
impl Debug for PublicKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PublicKey").field("pem_len", &self.pem.len()).finish()
	}
}

/// Fetches the identity service's signing key and caches it per host.
///
/// The cache stores PEM text. Each provider also remembers the last key it parsed per cache key,
/// so a cache hit serving the same PEM does not parse it again.
#[derive(Clone)]
pub struct PublicKeyProvider {
	cache: Arc<dyn CacheStore>,
	http: Arc<dyn HttpTransport>,
	options: PublicKeyCacheOptions,
	parsed: Arc<RwLock<HashMap<String, PublicKey>>>,
}
impl PublicKeyProvider {
	/// Creates a provider with the default caching policy.
	pub fn new(cache: Arc<dyn CacheStore>, http: Arc<dyn HttpTransport>) -> Self {
		Self {
			cache,
			http,
			options: PublicKeyCacheOptions::default(),
			parsed: Default::default(),
		}
	}

	/// Replaces the caching policy.
	pub fn with_options(mut self, options: PublicKeyCacheOptions) -> Self {
		self.options = options;

		self
	}

	/// Caching policy in effect.
	pub fn options(&self) -> &PublicKeyCacheOptions {
		&self.options
	}

	/// Returns the signing key for `host`, fetching `GET {host}/oauth/keys` on a cache miss.
	///
	/// Only keys that parse are cached, so a corrupt response is fetched again on the next call.
	///
	/// # Errors
	///
	/// - [`Error::InvalidKey`] when the served text is not an RSA public key.
	/// - [`Error::Client`], [`Error::Server`], or [`Error::ServerCommunication`] when the
	///   endpoint cannot be read.
	pub async fn fetch(&self, host: &Url, request_id: &RequestId) -> Result<PublicKey> {
		const KIND: OpKind = OpKind::FetchPublicKey;

		let span = OpSpan::new(KIND, "fetch");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let key = public_key_cache_key(host);

				if let Some(pem) =
					self.cache.get_or_claim(&key, self.options.race_condition_ttl).await?
				{
					obs::trace_cache_lookup(KIND, &key, true);
					obs::record_op_outcome(KIND, OpOutcome::CacheHit);

					return self.parse(&key, &pem);
				}

				obs::trace_cache_lookup(KIND, &key, false);

				let pem = self.download(host, request_id).await?;
				let public_key = self.parse(&key, &pem)?;

				self.cache.put(&key, pem, self.options.ttl).await?;

				Ok(public_key)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	fn parse(&self, key: &str, pem: &str) -> Result<PublicKey> {
		if let Some(known) = self.parsed.read().get(key).filter(|known| known.pem() == pem) {
			return Ok(known.clone());
		}

		let public_key = PublicKey::from_pem(pem)?;

		self.parsed.write().insert(key.to_owned(), public_key.clone());

		Ok(public_key)
	}

	async fn download(&self, host: &Url, request_id: &RequestId) -> Result<String> {
		let url = http::endpoint(host, KEYS_PATH)?;
		let request = http::finish(
			http::request(Method::GET, &url, request_id).header(header::ACCEPT, PLAIN_TEXT),
			Vec::new(),
		)?;

		obs::trace_request(OpKind::FetchPublicKey, &url, request_id);

		let response = http::send(self.http.as_ref(), request).await?;
		let body = http::interpret(&response, StatusCode::OK)?;

		Ok(String::from_utf8_lossy(body).into_owned())
	}
}
impl Debug for PublicKeyProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PublicKeyProvider").field("options", &self.options).finish()
	}
}

/// Cache key for a host's signing key: SHA-256 of the host URL.
pub fn public_key_cache_key(host: &Url) -> String {
	format!("public_key:{}", URL_SAFE_NO_PAD.encode(Sha256::digest(host.as_str().as_bytes())))
}
