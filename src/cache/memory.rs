//! Thread-safe in-memory [`CacheStore`] with race-condition tolerant refills.

// crates.io
use parking_lot::RwLockUpgradableReadGuard;
// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, CacheStore},
};

type CacheMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

#[derive(Clone, Debug)]
struct CacheEntry {
	value: String,
	expires_at: OffsetDateTime,
}

/// Process-local cache keeping entries with absolute deadlines.
///
/// Reading an expired entry with [`CacheStore::get`] evicts it. Expired entries reached only
/// through [`CacheStore::get_or_claim`] stay until claimed, overwritten, or purged, so a recently
/// expired value can still be served while one caller refills it. Deadlines beyond the
/// representable range saturate.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Deadline of the entry stored under `key`, whether or not it has passed.
	pub fn expires_at(&self, key: &str) -> Option<OffsetDateTime> {
		self.0.read().get(key).map(|entry| entry.expires_at)
	}

	/// Number of stored entries, including expired ones awaiting eviction.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true if nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Evicts entries whose deadline is at or before `now`, returning how many were dropped.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|_, entry| entry.expires_at > now);

		before - guard.len()
	}

	fn peek_at(map: &CacheMap, key: &str, now: OffsetDateTime) -> bool {
		map.read().get(key).is_some_and(|entry| now < entry.expires_at)
	}

	fn get_at(map: &CacheMap, key: &str, now: OffsetDateTime) -> Option<String> {
		let guard = map.upgradable_read();
		let entry = guard.get(key)?;

		if now < entry.expires_at {
			return Some(entry.value.clone());
		}

		RwLockUpgradableReadGuard::upgrade(guard).remove(key);

		None
	}

	fn put_at(map: &CacheMap, key: &str, value: String, ttl: Duration, now: OffsetDateTime) {
		let mut guard = map.write();

		if ttl.is_positive() {
			guard.insert(key.to_owned(), CacheEntry { value, expires_at: now.saturating_add(ttl) });
		} else {
			guard.remove(key);
		}
	}

	fn claim_at(
		map: &CacheMap,
		key: &str,
		race_condition_ttl: Duration,
		now: OffsetDateTime,
	) -> Option<String> {
		let mut guard = map.write();
		let entry = guard.get_mut(key)?;

		if now < entry.expires_at {
			return Some(entry.value.clone());
		}
		if race_condition_ttl.is_positive() && now - entry.expires_at <= race_condition_ttl {
			entry.expires_at = now.saturating_add(race_condition_ttl);

			return None;
		}

		guard.remove(key);

		None
	}
}
impl CacheStore for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_at(&map, key, OffsetDateTime::now_utc())) })
	}

	fn put<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::put_at(&map, key, value, ttl, OffsetDateTime::now_utc());

			Ok(())
		})
	}

	fn contains<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::peek_at(&map, key, OffsetDateTime::now_utc())) })
	}

	fn remove<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key).is_some()) })
	}

	fn clear(&self) -> CacheFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().clear();

			Ok(())
		})
	}

	fn get_or_claim<'a>(
		&'a self,
		key: &'a str,
		race_condition_ttl: Duration,
	) -> CacheFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(Self::claim_at(&map, key, race_condition_ttl, OffsetDateTime::now_utc()))
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const NOW: OffsetDateTime = macros::datetime!(2025-11-10 12:00 UTC);

	fn cache_with(key: &str, value: &str, ttl: Duration) -> MemoryCache {
		let cache = MemoryCache::default();

		MemoryCache::put_at(&cache.0, key, value.into(), ttl, NOW);

		cache
	}

	#[test]
	fn expired_entries_are_never_returned_by_get() {
		let cache = cache_with("k", "v", Duration::seconds(10));

		assert_eq!(MemoryCache::get_at(&cache.0, "k", NOW + Duration::seconds(9)), Some("v".into()));
		assert!(!MemoryCache::peek_at(&cache.0, "k", NOW + Duration::seconds(10)));
		assert_eq!(cache.expires_at("k"), Some(NOW + Duration::seconds(10)));
		assert_eq!(MemoryCache::get_at(&cache.0, "k", NOW + Duration::seconds(10)), None);
	}

	#[test]
	fn get_evicts_expired_entries() {
		let cache = cache_with("old", "v", Duration::seconds(1));

		MemoryCache::put_at(&cache.0, "new", "v".into(), Duration::hours(1), NOW);

		assert_eq!(MemoryCache::get_at(&cache.0, "old", NOW + Duration::seconds(5)), None);
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.expires_at("old"), None);
		assert_eq!(
			MemoryCache::get_at(&cache.0, "new", NOW + Duration::seconds(5)),
			Some("v".into())
		);
	}

	#[test]
	fn oversized_ttl_saturates_instead_of_overflowing() {
		let cache = cache_with("k", "v", Duration::MAX);

		assert!(
			cache.expires_at("k").is_some_and(|deadline| deadline > NOW + Duration::days(365))
		);
		assert_eq!(MemoryCache::get_at(&cache.0, "k", NOW), Some("v".into()));

		let cache = cache_with("k", "stale", Duration::seconds(1));

		assert_eq!(
			MemoryCache::claim_at(&cache.0, "k", Duration::MAX, NOW + Duration::seconds(2)),
			None
		);
		assert!(cache.expires_at("k").is_some_and(|deadline| deadline > NOW));
	}

	#[test]
	fn non_positive_ttl_drops_entry() {
		let cache = cache_with("k", "v", Duration::seconds(10));

		MemoryCache::put_at(&cache.0, "k", "w".into(), Duration::ZERO, NOW);

		assert!(cache.is_empty());
	}

	#[test]
	fn claim_extends_recently_expired_entry_for_other_readers() {
		let cache = cache_with("k", "stale", Duration::seconds(10));
		let race = Duration::seconds(10);
		let just_expired = NOW + Duration::seconds(12);

		assert_eq!(MemoryCache::claim_at(&cache.0, "k", race, just_expired), None);
		assert_eq!(
			MemoryCache::claim_at(&cache.0, "k", race, just_expired + Duration::seconds(1)),
			Some("stale".into()),
			"Concurrent readers should see the stale value while the claimer refills.",
		);
		assert_eq!(cache.expires_at("k"), Some(just_expired + race));
	}

	#[test]
	fn claim_evicts_entries_beyond_race_window() {
		let cache = cache_with("k", "stale", Duration::seconds(10));

		assert_eq!(
			MemoryCache::claim_at(&cache.0, "k", Duration::seconds(10), NOW + Duration::minutes(5)),
			None
		);
		assert!(cache.is_empty());
	}

	#[test]
	fn claim_without_race_window_behaves_like_get() {
		let cache = cache_with("k", "v", Duration::seconds(10));

		assert_eq!(MemoryCache::claim_at(&cache.0, "k", Duration::ZERO, NOW), Some("v".into()));
		assert_eq!(
			MemoryCache::claim_at(&cache.0, "k", Duration::ZERO, NOW + Duration::seconds(11)),
			None
		);
		assert!(cache.is_empty());
	}

	#[test]
	fn purge_expired_drops_only_lapsed_entries() {
		let cache = cache_with("old", "v", Duration::seconds(1));

		MemoryCache::put_at(&cache.0, "new", "v".into(), Duration::hours(1), NOW);

		assert_eq!(cache.purge_expired(NOW + Duration::seconds(5)), 1);
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn store_contract_round_trips_values() {
		let cache = MemoryCache::default();

		cache.put("k", "v".into(), Duration::minutes(1)).await.expect("Put should succeed.");

		assert!(cache.contains("k").await.expect("Contains should succeed."));
		assert_eq!(cache.get("k").await.expect("Get should succeed."), Some("v".into()));
		assert!(cache.remove("k").await.expect("Remove should succeed."));
		assert!(!cache.contains("k").await.expect("Contains should succeed."));

		cache.put("k", "v".into(), Duration::minutes(1)).await.expect("Put should succeed.");
		cache.clear().await.expect("Clear should succeed.");

		assert!(cache.is_empty());
	}
}
