//! OAuth client credentials threaded explicitly through every issuing call.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, Secret},
	error::ConfigError,
};

/// Identity service host used when `PERSONA_HOST` is unset.
pub const DEFAULT_HOST: &str = "https://users.talisaspire.com";

/// Environment variable holding the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "PERSONA_OAUTH_CLIENT";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "PERSONA_OAUTH_SECRET";
/// Environment variable overriding the identity service host.
pub const ENV_HOST: &str = "PERSONA_HOST";

/// Client-credentials grant inputs for a single identity service host.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret; never logged.
	pub client_secret: Secret,
	/// Identity service base URL.
	pub host: Url,
}
impl ClientCredentials {
	/// Bundles credentials for the provided host.
	pub fn new(client_id: ClientId, client_secret: impl Into<String>, host: Url) -> Self {
		Self { client_id, client_secret: Secret::new(client_secret), host }
	}

	/// Reads `PERSONA_OAUTH_CLIENT`, `PERSONA_OAUTH_SECRET`, and the optional `PERSONA_HOST`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let client_id = ClientId::new(required_env(ENV_CLIENT_ID)?)?;
		let client_secret = required_env(ENV_CLIENT_SECRET)?;
		let host = env::var(ENV_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_owned());
		let host = parse_host(&host)?;

		Ok(Self::new(client_id, client_secret, host))
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("host", &self.host.as_str())
			.finish()
	}
}

/// Parses a host string into a base URL suitable for endpoint joins.
pub fn parse_host(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw)
		.map_err(|source| ConfigError::InvalidHost { url: raw.to_owned(), source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeBase { url: raw.to_owned() });
	}

	Ok(url)
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
	match env::var(name) {
		Ok(value) if !value.is_empty() => Ok(value),
		_ => Err(ConfigError::MissingEnv { name }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_output_redacts_secret() {
		let credentials = ClientCredentials::new(
			ClientId::new("primate").expect("Client fixture should be valid."),
			"bananas",
			parse_host("https://persona.example.com").expect("Host fixture should parse."),
		);
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("primate"));
		assert!(!rendered.contains("bananas"));
	}

	#[test]
	fn parse_host_rejects_non_base_urls() {
		assert!(matches!(parse_host("not a url"), Err(ConfigError::InvalidHost { .. })));
		assert!(matches!(
			parse_host("mailto:persona@example.com"),
			Err(ConfigError::CannotBeBase { .. })
		));
	}
}
