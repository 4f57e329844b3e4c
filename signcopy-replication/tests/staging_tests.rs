mod common;

use common::loc;
use pretty_assertions::assert_eq;
use signcopy_replication::{ManualClock, StagedText, StagingCache};
use signcopy_types::ActorId;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TTL_MS: u64 = 300_000;

fn staged(front: &str) -> StagedText {
    StagedText {
        actor: ActorId::new(),
        front: vec![front.to_string()],
        back: Vec::new(),
        front_glowing: false,
        back_glowing: false,
    }
}

fn cache_at(start: u64) -> (StagingCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let cache = StagingCache::with_clock(Duration::from_millis(TTL_MS), clock.clone());
    (cache, clock)
}

#[test]
fn entry_survives_until_ttl_elapses() {
    let (cache, clock) = cache_at(10_000);
    cache.put(loc(1), staged("hi"));

    clock.set(10_000 + TTL_MS - 1);
    assert_eq!(cache.cleanup_expired(), 0);
    assert!(cache.contains(&loc(1)));

    clock.set(10_000 + TTL_MS);
    assert_eq!(cache.cleanup_expired(), 0, "exactly at the TTL is not yet expired");

    clock.set(10_000 + TTL_MS + 1);
    assert_eq!(cache.cleanup_expired(), 1);
    assert!(!cache.contains(&loc(1)));
    assert!(cache.is_empty());
}

#[test]
fn cleanup_only_evicts_expired_entries() {
    let (cache, clock) = cache_at(0);
    cache.put(loc(1), staged("old"));
    clock.advance(200_000);
    cache.put(loc(2), staged("new"));

    clock.advance(100_001);

    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.get(&loc(1)), None);
    assert_eq!(cache.get(&loc(2)).map(|s| s.front), Some(vec!["new".to_string()]));
}

#[test]
fn put_replaces_and_refreshes_timestamp() {
    let (cache, clock) = cache_at(0);
    cache.put(loc(1), staged("first"));
    clock.advance(TTL_MS);

    let previous = cache.put(loc(1), staged("second"));
    clock.advance(10);

    assert_eq!(previous.map(|s| s.front), Some(vec!["first".to_string()]));
    assert_eq!(cache.cleanup_expired(), 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn put_if_absent_keeps_existing_entry() {
    let (cache, _clock) = cache_at(0);
    assert_eq!(cache.put_if_absent(loc(1), staged("first")), None);

    let existing = cache.put_if_absent(loc(1), staged("second"));

    assert_eq!(existing.map(|s| s.front), Some(vec!["first".to_string()]));
    assert_eq!(cache.get(&loc(1)).map(|s| s.front), Some(vec!["first".to_string()]));
}

#[test]
fn remove_takes_entry_once() {
    let (cache, _clock) = cache_at(0);
    cache.put(loc(1), staged("x"));

    assert!(cache.remove(&loc(1)).is_some());
    assert!(cache.remove(&loc(1)).is_none());
    assert_eq!(cache.cleanup_expired(), 0);
}

#[test]
fn get_does_not_remove() {
    let (cache, _clock) = cache_at(0);
    cache.put(loc(1), staged("x"));

    assert!(cache.get(&loc(1)).is_some());
    assert!(cache.get(&loc(1)).is_some());
    assert_eq!(cache.len(), 1);
}

#[test]
fn concurrent_flows_at_distinct_locations_do_not_interfere() {
    let (cache, _clock) = cache_at(0);
    let cache = Arc::new(cache);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200 {
                    let location = loc(worker * 1_000 + i);
                    cache.put(location.clone(), staged(&format!("{worker}-{i}")));
                    let taken = cache.remove(&location).map(|s| s.front);
                    assert_eq!(taken, Some(vec![format!("{worker}-{i}")]));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.is_empty());
}

#[test]
fn cleanup_racing_with_puts_keeps_fresh_entries() {
    let (cache, clock) = cache_at(0);
    let cache = Arc::new(cache);
    for i in 0..100 {
        cache.put(loc(i), staged("stale"));
    }
    clock.advance(TTL_MS + 1);

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 100..200 {
                cache.put(loc(i), staged("fresh"));
            }
        })
    };
    let evicted = cache.cleanup_expired();
    writer.join().unwrap();

    assert_eq!(evicted, 100);
    assert_eq!(cache.len(), 100);
    assert!((100..200).all(|i| cache.contains(&loc(i))));
}
