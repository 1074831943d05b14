//! Match ranking and eviction ordering
//!
//! Both orderings are total so the outcome never depends on the iteration
//! order of the underlying store.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::CacheEntry;

/// Ordering of two lookup candidates, `Less` meaning `a` is the better match
///
/// Smallest distance wins, then highest hit count, then most recent
/// creation, then id.
pub fn compare_matches(a: (&CacheEntry, f32), b: (&CacheEntry, f32)) -> Ordering {
    let (entry_a, distance_a) = a;
    let (entry_b, distance_b) = b;

    distance_a
        .total_cmp(&distance_b)
        .then_with(|| entry_b.hit_count().cmp(&entry_a.hit_count()))
        .then_with(|| entry_b.created_at().cmp(&entry_a.created_at()))
        .then_with(|| entry_a.id().cmp(entry_b.id()))
}

/// Ordering of two eviction candidates, `Less` meaning `a` goes first
///
/// Expired entries go before live ones, oldest `created_at` first. Among
/// live entries the least recently hit goes first, fewer hits breaking ties.
pub fn compare_for_eviction(a: &CacheEntry, b: &CacheEntry, now: DateTime<Utc>) -> Ordering {
    match (a.is_live_at(now), b.is_live_at(now)) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, false) => a
            .created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id())),
        (true, true) => a
            .last_access()
            .cmp(&b.last_access())
            .then_with(|| a.hit_count().cmp(&b.hit_count()))
            .then_with(|| a.id().cmp(b.id())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::time::Duration;

    fn entry(text: &str, ttl_secs: u64, created_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(vec![1.0, 0.0], text, serde_json::json!(text), Duration::from_secs(ttl_secs))
            .with_created_at(created_at)
    }

    #[test]
    fn test_closer_match_wins() {
        let now = Utc::now();
        let a = entry("a", 60, now);
        let b = entry("b", 60, now).with_hit_count(100);

        assert_eq!(compare_matches((&a, 0.01), (&b, 0.02)), Ordering::Less);
    }

    #[test]
    fn test_tie_prefers_more_hits_then_newer() {
        let now = Utc::now();
        let popular = entry("popular", 60, now - TimeDelta::seconds(30)).with_hit_count(5);
        let fresh = entry("fresh", 60, now).with_hit_count(1);
        let fresher = entry("fresher", 60, now + TimeDelta::seconds(1)).with_hit_count(1);

        assert_eq!(compare_matches((&popular, 0.1), (&fresh, 0.1)), Ordering::Less);
        assert_eq!(compare_matches((&fresher, 0.1), (&fresh, 0.1)), Ordering::Less);
    }

    #[test]
    fn test_expired_evicted_before_live() {
        let now = Utc::now();
        let live_old = entry("live", 3600, now - TimeDelta::seconds(100));
        let expired_new = entry("expired", 1, now - TimeDelta::seconds(5));

        assert_eq!(
            compare_for_eviction(&expired_new, &live_old, now),
            Ordering::Less
        );
    }

    #[test]
    fn test_oldest_expired_first() {
        let now = Utc::now();
        let older = entry("older", 1, now - TimeDelta::seconds(50));
        let newer = entry("newer", 1, now - TimeDelta::seconds(10));

        assert_eq!(compare_for_eviction(&older, &newer, now), Ordering::Less);
    }

    #[test]
    fn test_least_recently_hit_live_first() {
        let now = Utc::now();
        let created = now - TimeDelta::seconds(100);
        let recently_hit = entry("recent", 3600, created).with_last_hit_at(now - TimeDelta::seconds(1));
        let stale = entry("stale", 3600, created).with_last_hit_at(now - TimeDelta::seconds(60));
        let never_hit = entry("never", 3600, now - TimeDelta::seconds(90));

        assert_eq!(compare_for_eviction(&stale, &recently_hit, now), Ordering::Less);
        assert_eq!(compare_for_eviction(&never_hit, &stale, now), Ordering::Less);
    }
}
