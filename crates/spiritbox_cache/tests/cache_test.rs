//! Tests for the TtlCache and CooldownTracker implementations.

use spiritbox_cache::{CooldownTracker, TtlCache, TtlCacheConfig};
use std::time::Duration;

#[test]
fn test_cache_insert_and_get() {
    let config = TtlCacheConfig::default()
        .with_default_ttl(10)
        .with_max_size(100);
    let mut cache: TtlCache<(i64, i64), String> = TtlCache::new(config);

    cache.insert((1, 10), "profile-a".to_string(), Some(10));

    assert_eq!(cache.get(&(1, 10)), Some(&"profile-a".to_string()));

    // Non-existent key should return None
    assert!(cache.get(&(2, 10)).is_none());
}

#[test]
fn test_cache_expiration() {
    let config = TtlCacheConfig::default().with_default_ttl(1); // 1 second TTL
    let mut cache: TtlCache<(i64, i64), String> = TtlCache::new(config);

    cache.insert((1, 10), "profile-a".to_string(), Some(1));
    assert!(cache.get(&(1, 10)).is_some());

    // Wait for expiration
    std::thread::sleep(Duration::from_secs(2));

    // Should be expired now
    assert!(cache.get(&(1, 10)).is_none());
}

#[test]
fn test_cache_clear() {
    let mut cache: TtlCache<(i64, i64), i32> = TtlCache::default();

    cache.insert((1, 10), 1, None);
    cache.insert((2, 10), 2, None);

    assert_eq!(cache.len(), 2);

    cache.clear();

    assert_eq!(cache.len(), 0);
    assert!(cache.get(&(1, 10)).is_none());
    assert!(cache.get(&(2, 10)).is_none());
}

#[test]
fn test_cache_update_existing_key() {
    let mut cache: TtlCache<(i64, i64), i32> = TtlCache::default();

    cache.insert((1, 10), 1, None);
    assert_eq!(cache.get(&(1, 10)), Some(&1));

    // Update with new value
    cache.insert((1, 10), 2, None);
    assert_eq!(cache.get(&(1, 10)), Some(&2));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_cleanup_expired_entries() {
    let config = TtlCacheConfig::default().with_default_ttl(1);
    let mut cache: TtlCache<(i64, i64), i32> = TtlCache::new(config);

    cache.insert((1, 10), 1, Some(1));
    cache.insert((2, 10), 2, Some(1));

    assert_eq!(cache.len(), 2);

    // Wait for expiration
    std::thread::sleep(Duration::from_secs(2));

    // Cleanup expired entries
    let removed = cache.cleanup_expired();
    assert_eq!(removed, 2);
    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
}

#[test]
fn test_cache_lru_eviction() {
    let config = TtlCacheConfig::default().with_max_size(2);
    let mut cache: TtlCache<(i64, i64), i32> = TtlCache::new(config);

    cache.insert((1, 10), 1, None);
    std::thread::sleep(Duration::from_millis(10));
    cache.insert((2, 10), 2, None);

    assert_eq!(cache.len(), 2);

    // Touch the older entry so (2, 10) becomes least recently used
    std::thread::sleep(Duration::from_millis(10));
    assert!(cache.get(&(1, 10)).is_some());

    std::thread::sleep(Duration::from_millis(10));
    cache.insert((3, 10), 3, None);

    assert_eq!(cache.len(), 2);
    assert!(cache.get(&(2, 10)).is_none());
    assert!(cache.get(&(1, 10)).is_some());
    assert!(cache.get(&(3, 10)).is_some());
}

#[test]
fn test_cooldown_gate() {
    let mut tracker = CooldownTracker::new(Duration::from_secs(60));

    // First message passes and stamps the window
    assert!(tracker.check_and_touch(1, 10));
    // Second message inside the window is denied
    assert!(!tracker.check_and_touch(1, 10));
    // A different member is unaffected
    assert!(tracker.check_and_touch(2, 10));
    // Same user in a different guild is a separate key
    assert!(tracker.check_and_touch(1, 11));

    assert!(tracker.remaining(1, 10).is_some());
    assert!(tracker.remaining(3, 10).is_none());
}

#[test]
fn test_cooldown_window_elapses() {
    let mut tracker = CooldownTracker::new(Duration::from_millis(50));

    assert!(tracker.check_and_touch(1, 10));
    assert!(!tracker.check_and_touch(1, 10));

    std::thread::sleep(Duration::from_millis(60));

    assert!(tracker.check_and_touch(1, 10));
}

#[test]
fn test_cooldown_sweep() {
    let mut tracker = CooldownTracker::new(Duration::from_millis(50));

    tracker.check_and_touch(1, 10);
    tracker.check_and_touch(2, 10);
    assert_eq!(tracker.len(), 2);

    std::thread::sleep(Duration::from_millis(60));

    let removed = tracker.sweep();
    assert_eq!(removed, 2);
    assert!(tracker.is_empty());
}
