pub mod cache;
pub mod extract;
pub mod outbound;
pub mod profile_page;
pub mod types;
pub mod web_api;

use worker::{console_log, Date};

use self::cache::{FeedCache, CACHE_TTL_MS};
use self::types::{FeedError, ProfileFeed};

thread_local! {
    /// One cache per isolate, alive until the runtime recycles it.
    static FEED_CACHE: FeedCache =
        FeedCache::new(CACHE_TTL_MS, Box::new(|| Date::now().as_millis()));
}

/// Runs `f` against the isolate-wide feed cache.
pub fn with_cache<R>(f: impl FnOnce(&FeedCache) -> R) -> R {
    FEED_CACHE.with(|cache| f(cache))
}

/// Orchestrator: web profile API first, profile-page scrape as fallback.
///
/// The fallback only runs when the primary strategy errs or finds zero
/// items; once fallen back there is no second look at the API. Two
/// concurrent misses for the same key may both land here — last writer
/// wins, and both compute the same data, so nobody is serialized.
pub async fn fetch_profile_feed(handle: &str, count: usize) -> Result<ProfileFeed, FeedError> {
    console_log!("[feed] fetching fresh data for {} (count={})", handle, count);

    match web_api::fetch_web_profile(handle, count).await {
        Ok(feed) => {
            console_log!("[feed] web api SUCCESS for {} ({} items)", handle, feed.items.len());
            return Ok(feed);
        }
        Err(e) => {
            console_log!("[feed] web api failed for {}: {} — trying profile page", handle, e);
        }
    }

    match profile_page::fetch_profile_page(handle, count).await {
        Ok(feed) => {
            console_log!("[feed] profile page SUCCESS for {} ({} items)", handle, feed.items.len());
            Ok(feed)
        }
        Err(e) => {
            console_log!("[feed] profile page failed for {}: {}", handle, e);
            Err(e)
        }
    }
}
