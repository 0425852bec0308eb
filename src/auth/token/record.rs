//! Token record returned by the identity service's token lookup endpoint.

// self
use crate::_prelude::*;

/// Authoritative token record from `GET {host}/oauth/tokens/{token}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Space-separated scope list.
	#[serde(default)]
	pub scope: String,
	/// Expiry as seconds since the Unix epoch, when reported.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<i64>,
}
impl TokenRecord {
	/// Splits the scope list into an ordered sequence.
	pub fn scopes(&self) -> Vec<String> {
		self.scope.split_whitespace().map(ToOwned::to_owned).collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_split_on_whitespace_in_order() {
		let record: TokenRecord = serde_json::from_str(r#"{"scope":"c a  b","expires":10}"#)
			.expect("Token record should deserialize.");

		assert_eq!(record.scopes(), vec!["c", "a", "b"]);
		assert_eq!(record.expires, Some(10));
	}

	#[test]
	fn missing_scope_yields_empty_list() {
		let record: TokenRecord =
			serde_json::from_str("{}").expect("Token record without scope should deserialize.");

		assert!(record.scopes().is_empty());
	}
}
