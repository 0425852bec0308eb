//! [`CacheStore`] that never retains anything.

// crates.io
use time::Duration;
// self
use crate::cache::{CacheFuture, CacheStore};

/// Cache that discards writes, forcing every lookup to hit the remote service.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCache;
impl CacheStore for NullCache {
	fn get<'a>(&'a self, _key: &'a str) -> CacheFuture<'a, Option<String>> {
		Box::pin(async { Ok(None) })
	}

	fn put<'a>(&'a self, _key: &'a str, _value: String, _ttl: Duration) -> CacheFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}

	fn contains<'a>(&'a self, _key: &'a str) -> CacheFuture<'a, bool> {
		Box::pin(async { Ok(false) })
	}

	fn remove<'a>(&'a self, _key: &'a str) -> CacheFuture<'a, bool> {
		Box::pin(async { Ok(false) })
	}

	fn clear(&self) -> CacheFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}
