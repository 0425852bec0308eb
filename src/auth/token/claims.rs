//! Claim set embedded in identity-service JWTs.

// self
use crate::_prelude::*;

/// Claims the validator reads from a verified JWT.
///
/// `scopes` is absent when the service could not embed the full list, in which case
/// `scope_count` reports how many scopes the token carries and the list must be fetched
/// remotely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Expiry as seconds since the Unix epoch.
	pub exp: i64,
	/// Embedded scope list, in issuance order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scopes: Option<Vec<String>>,
	/// Marker set when the scope list was too large to embed.
	#[serde(default, rename = "scopeCount", skip_serializing_if = "Option::is_none")]
	pub scope_count: Option<u64>,
}
impl TokenClaims {
	/// Expiry as an [`OffsetDateTime`], if representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp).ok()
	}

	/// Whether the scope list has to be fetched from the identity service.
	pub fn scopes_truncated(&self) -> bool {
		self.scope_count.is_some()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn claims_read_scope_count_marker() {
		let claims: TokenClaims = serde_json::from_str(r#"{"exp":1700000000,"scopeCount":26}"#)
			.expect("Claims with a scope count should deserialize.");

		assert!(claims.scopes_truncated());
		assert_eq!(claims.scopes, None);
		assert_eq!(
			claims.expires_at().map(OffsetDateTime::unix_timestamp),
			Some(1_700_000_000)
		);
	}

	#[test]
	fn claims_keep_scope_order() {
		let claims: TokenClaims =
			serde_json::from_str(r#"{"exp":1700000000,"scopes":["b","a"]}"#)
				.expect("Claims with scopes should deserialize.");

		assert!(!claims.scopes_truncated());
		assert_eq!(claims.scopes, Some(vec!["b".to_owned(), "a".to_owned()]));
	}
}
