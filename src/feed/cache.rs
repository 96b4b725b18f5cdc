use std::cell::RefCell;
use std::collections::HashMap;

use super::types::ProfileFeed;

/// Entries stay fresh for 6 hours.
pub const CACHE_TTL_MS: u64 = 6 * 60 * 60 * 1000;

/// One cached feed per (handle, count) pair. Same handle with a different
/// count is a different entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub handle: String,
    pub count: usize,
}

struct CacheEntry {
    feed: ProfileFeed,
    stored_at: u64,
}

/// In-memory feed cache, one instance per isolate.
///
/// Staleness is only checked on read; a stale entry sits in the map until
/// the next successful fetch for its key overwrites it. There is no size
/// bound and no eviction beyond that overwrite — fine for a handful of
/// promotional handles, not a general-purpose cache.
///
/// The clock is injected (milliseconds) so freshness logic is testable
/// without a JS runtime.
pub struct FeedCache {
    entries: RefCell<HashMap<CacheKey, CacheEntry>>,
    ttl_ms: u64,
    clock: Box<dyn Fn() -> u64>,
}

impl FeedCache {
    pub fn new(ttl_ms: u64, clock: Box<dyn Fn() -> u64>) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            ttl_ms,
            clock,
        }
    }

    /// Returns the cached feed and its age in whole minutes, or `None` when
    /// the key is absent or the entry has outlived the TTL.
    pub fn lookup(&self, key: &CacheKey) -> Option<(ProfileFeed, u64)> {
        let entries = self.entries.borrow();
        let entry = entries.get(key)?;

        let age_ms = (self.clock)().saturating_sub(entry.stored_at);
        if age_ms >= self.ttl_ms {
            return None;
        }

        Some((entry.feed.clone(), age_ms / 60_000))
    }

    /// Stores a freshly fetched feed, replacing any prior entry for the key.
    pub fn store(&self, key: CacheKey, feed: ProfileFeed) {
        let entry = CacheEntry {
            feed,
            stored_at: (self.clock)(),
        };
        self.entries.borrow_mut().insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::feed::types::FeedItem;

    fn item(shortcode: &str) -> FeedItem {
        FeedItem {
            shortcode: shortcode.to_string(),
            url: format!("https://www.instagram.com/p/{shortcode}/"),
            thumbnail: String::new(),
            image_url: String::new(),
            caption: String::new(),
            likes: 0,
            comments: 0,
            timestamp: 0,
            is_video: false,
        }
    }

    fn feed(handle: &str, shortcodes: &[&str]) -> ProfileFeed {
        ProfileFeed {
            username: handle.to_string(),
            items: shortcodes.iter().map(|s| item(s)).collect(),
        }
    }

    fn key(handle: &str, count: usize) -> CacheKey {
        CacheKey {
            handle: handle.to_string(),
            count,
        }
    }

    /// Builds a cache driven by a manually advanced clock.
    fn test_cache(ttl_ms: u64) -> (FeedCache, Rc<Cell<u64>>) {
        let now = Rc::new(Cell::new(0u64));
        let clock = Rc::clone(&now);
        let cache = FeedCache::new(ttl_ms, Box::new(move || clock.get()));
        (cache, now)
    }

    #[test]
    fn hit_within_ttl_returns_identical_feed() {
        let (cache, now) = test_cache(CACHE_TTL_MS);
        let stored = feed("museum_demo", &["AAA", "BBB"]);
        cache.store(key("museum_demo", 2), stored.clone());

        let (found, age) = cache.lookup(&key("museum_demo", 2)).unwrap();
        assert_eq!(found, stored);
        assert_eq!(age, 0);

        // Still fresh one millisecond before expiry
        now.set(CACHE_TTL_MS - 1);
        assert!(cache.lookup(&key("museum_demo", 2)).is_some());
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        let (cache, now) = test_cache(CACHE_TTL_MS);
        cache.store(key("museum_demo", 5), feed("museum_demo", &["AAA"]));

        now.set(CACHE_TTL_MS);
        assert!(cache.lookup(&key("museum_demo", 5)).is_none());
    }

    #[test]
    fn age_is_reported_in_whole_minutes() {
        let (cache, now) = test_cache(CACHE_TTL_MS);
        cache.store(key("museum_demo", 5), feed("museum_demo", &["AAA"]));

        now.set(90_000); // 1.5 minutes
        let (_, age) = cache.lookup(&key("museum_demo", 5)).unwrap();
        assert_eq!(age, 1);
    }

    #[test]
    fn counts_are_distinct_keys() {
        let (cache, _) = test_cache(CACHE_TTL_MS);
        cache.store(key("museum_demo", 2), feed("museum_demo", &["AAA", "BBB"]));

        assert!(cache.lookup(&key("museum_demo", 5)).is_none());
        assert!(cache.lookup(&key("museum_demo", 2)).is_some());
    }

    #[test]
    fn store_overwrites_prior_entry() {
        let (cache, now) = test_cache(CACHE_TTL_MS);
        cache.store(key("museum_demo", 1), feed("museum_demo", &["OLD"]));

        now.set(1_000);
        let replacement = feed("museum_demo", &["NEW"]);
        cache.store(key("museum_demo", 1), replacement.clone());

        let (found, _) = cache.lookup(&key("museum_demo", 1)).unwrap();
        assert_eq!(found, replacement);
    }

    #[test]
    fn stale_entry_survives_until_overwritten() {
        // A failed refresh never touches the store, so the stale entry is
        // still there for the next successful fetch to replace.
        let (cache, now) = test_cache(CACHE_TTL_MS);
        cache.store(key("museum_demo", 5), feed("museum_demo", &["OLD"]));

        now.set(CACHE_TTL_MS + 1);
        assert!(cache.lookup(&key("museum_demo", 5)).is_none());

        cache.store(key("museum_demo", 5), feed("museum_demo", &["NEW"]));
        let (found, age) = cache.lookup(&key("museum_demo", 5)).unwrap();
        assert_eq!(found.items[0].shortcode, "NEW");
        assert_eq!(age, 0);
    }
}
