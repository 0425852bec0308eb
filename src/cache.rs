//! Cache contracts and built-in cache implementations for tokens and signing keys.
//!
//! The issuer and key provider receive a caller-owned [`CacheStore`] handle at construction, so
//! the composing application decides whether caches are shared, isolated, or disabled.

pub mod memory;
pub mod null;

pub use memory::MemoryCache;
pub use null::NullCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CacheStore`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Expiring key/value store shared by the issuer and key provider.
///
/// Implementations must be internally synchronized; callers never add their own locking.
/// A value must never be returned once its deadline has passed, except through the
/// race-condition window documented on [`CacheStore::get_or_claim`].
pub trait CacheStore
where
	Self: Send + Sync,
{
	/// Returns the value for `key` if present and unexpired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

	/// Stores `value` under `key` for `ttl`. Non-positive TTLs drop any existing entry.
	fn put<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> CacheFuture<'a, ()>;

	/// Returns true if `key` holds an unexpired value.
	fn contains<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool>;

	/// Removes `key`, returning whether an entry existed.
	fn remove<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool>;

	/// Drops every entry.
	fn clear(&self) -> CacheFuture<'_, ()>;

	/// Looks up `key`, claiming the refill when the entry has just expired.
	///
	/// When the entry expired no more than `race_condition_ttl` ago, the store pushes its
	/// deadline out by `race_condition_ttl` and reports a miss to this caller only; concurrent
	/// callers keep receiving the stale value until the refill is written. Stores without
	/// race-condition support fall back to [`CacheStore::get`].
	fn get_or_claim<'a>(
		&'a self,
		key: &'a str,
		race_condition_ttl: Duration,
	) -> CacheFuture<'a, Option<String>> {
		let _ = race_condition_ttl;

		self.get(key)
	}
}

/// Error type produced by [`CacheStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
