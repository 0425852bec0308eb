//! Bearer tokens issued by, or presented to, the identity service.

pub mod claims;
pub mod record;

// self
use crate::{_prelude::*, auth::Secret};

/// Immutable bearer credential.
///
/// Tokens minted by [`TokenIssuer`](crate::issuer::TokenIssuer) remember the instant their
/// cache entry lapses; tokens wrapped from inbound strings carry only the encoded value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
	encoded: Secret,
	expires_at: Option<OffsetDateTime>,
}
impl Token {
	/// Wraps an encoded token (JWT or opaque string), e.g. one received from an upstream caller.
	pub fn new(encoded: impl Into<String>) -> Self {
		Self { encoded: Secret::new(encoded), expires_at: None }
	}

	pub(crate) fn with_expiry(encoded: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { encoded: Secret::new(encoded), expires_at: Some(expires_at) }
	}

	/// Returns the encoded token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.encoded.expose()
	}

	/// Instant after which the issuer stops reusing this token, when known.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Formats the `Authorization` header value for outbound requests.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.encoded.expose())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("encoded", &self.encoded)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
impl From<String> for Token {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<&str> for Token {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
