// std
use std::sync::Arc;
// crates.io
use time::Duration;
// self
use persona_auth::cache::{CacheStore, MemoryCache, NullCache};

#[tokio::test]
async fn put_get_contains_remove_and_clear() {
	let cache = MemoryCache::default();

	cache
		.put("access_token:a", "abc".into(), Duration::minutes(1))
		.await
		.expect("Put should succeed.");
	cache
		.put("public_key:b", "pem".into(), Duration::minutes(1))
		.await
		.expect("Put should succeed.");

	assert_eq!(
		cache.get("access_token:a").await.expect("Get should succeed."),
		Some("abc".to_owned())
	);
	assert!(cache.contains("public_key:b").await.expect("Contains should succeed."));
	assert!(cache.remove("public_key:b").await.expect("Remove should succeed."));
	assert!(!cache.remove("public_key:b").await.expect("Remove should succeed."));

	cache.clear().await.expect("Clear should succeed.");

	assert!(cache.is_empty());
}

#[tokio::test]
async fn expired_values_are_not_served_but_can_be_claimed() {
	let cache = MemoryCache::default();

	cache
		.put("public_key:host", "stale".into(), Duration::milliseconds(20))
		.await
		.expect("Put should succeed.");
	tokio::time::sleep(std::time::Duration::from_millis(60)).await;

	assert!(!cache.contains("public_key:host").await.expect("Contains should succeed."));
	assert_eq!(
		cache
			.get_or_claim("public_key:host", Duration::seconds(10))
			.await
			.expect("Claim should succeed."),
		None,
		"The first caller after expiry refills.",
	);
	assert_eq!(
		cache
			.get_or_claim("public_key:host", Duration::seconds(10))
			.await
			.expect("Claim should succeed."),
		Some("stale".to_owned()),
		"Other callers keep the stale value during the refill.",
	);

	cache
		.put("public_key:host", "fresh".into(), Duration::minutes(7))
		.await
		.expect("Refill should succeed.");

	assert_eq!(
		cache.get("public_key:host").await.expect("Get should succeed."),
		Some("fresh".to_owned())
	);
}

#[tokio::test]
async fn get_drops_expired_tokens() {
	let cache = MemoryCache::default();

	for client in ["a", "b", "c"] {
		cache
			.put(&format!("access_token:{client}"), "abc".into(), Duration::milliseconds(20))
			.await
			.expect("Put should succeed.");
	}
	tokio::time::sleep(std::time::Duration::from_millis(60)).await;

	assert_eq!(cache.len(), 3);

	for client in ["a", "b", "c"] {
		assert_eq!(
			cache.get(&format!("access_token:{client}")).await.expect("Get should succeed."),
			None
		);
	}

	assert!(cache.is_empty());
}

#[tokio::test]
async fn concurrent_writers_leave_one_value() {
	let cache = Arc::new(MemoryCache::default());
	let mut handles = Vec::new();

	for i in 0..16 {
		let cache = cache.clone();

		handles.push(tokio::spawn(async move {
			cache
				.put("access_token:shared", format!("token-{i}"), Duration::minutes(1))
				.await
				.expect("Concurrent put should succeed.");
		}));
	}
	for handle in handles {
		handle.await.expect("Writer task should not panic.");
	}

	let value = cache
		.get("access_token:shared")
		.await
		.expect("Get should succeed.")
		.expect("A value should be stored.");

	assert!(value.starts_with("token-"));
	assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn null_cache_never_stores() {
	let cache = NullCache;

	cache.put("k", "v".into(), Duration::minutes(1)).await.expect("Put should succeed.");

	assert_eq!(cache.get("k").await.expect("Get should succeed."), None);
	assert!(!cache.contains("k").await.expect("Contains should succeed."));
}
