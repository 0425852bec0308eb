//! Sensitive strings: client secrets, login app secrets, and encoded bearer tokens.

// self
use crate::_prelude::*;

const MASK: &str = "***";

/// String kept out of `Debug` and `Display` output.
///
/// Read it with [`Secret::expose`] only at the point where it leaves the process, such as a
/// request body, an `Authorization` header, or an HMAC key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Secret(Box<str>);
impl Secret {
	/// Takes ownership of `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into().into_boxed_str())
	}

	/// Plain value. Never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Plain value as bytes, e.g. for keying a MAC.
	pub fn as_bytes(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Returns true for an empty secret, which the identity service always rejects.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Secret({MASK})")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(MASK)
	}
}
