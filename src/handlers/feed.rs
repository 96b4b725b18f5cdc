use serde_json::{json, Value};
use worker::*;

use crate::feed::cache::CacheKey;
use crate::feed::types::{FeedError, ProfileFeed};
use crate::feed::{fetch_profile_feed, with_cache};
use crate::utils::query::{FeedQuery, DEFAULT_COUNT};

/// Shared-cache directive matching the 6-hour TTL (21600 seconds).
const CACHE_DIRECTIVE: &str = "s-maxage=21600, stale-while-revalidate";

/// `GET /feed?handle=<string>&count=<integer>`
pub async fn handle(req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let url = req.url()?;

    let query = match FeedQuery::from_url(&url, default_count(&ctx.env)) {
        Ok(query) => query,
        Err(e) => return error_response(&e),
    };

    let key = CacheKey {
        handle: query.handle.clone(),
        count: query.count,
    };

    if let Some((feed, age_minutes)) = with_cache(|cache| cache.lookup(&key)) {
        console_log!("[feed] cache HIT for {} (age={}m)", key.handle, age_minutes);
        return feed_response(&feed, Some(age_minutes));
    }
    console_log!("[feed] cache MISS for {} (count={})", key.handle, key.count);

    match fetch_profile_feed(&query.handle, query.count).await {
        Ok(feed) => {
            with_cache(|cache| cache.store(key, feed.clone()));
            feed_response(&feed, None)
        }
        Err(e) => error_response(&e),
    }
}

/// `OPTIONS /feed` — CORS preflight.
pub fn preflight(_req: Request, _ctx: RouteContext<()>) -> Result<Response> {
    Ok(Response::empty()?.with_headers(cors_headers()?))
}

/// Any method other than GET/OPTIONS on the feed route.
pub fn method_not_allowed(_req: Request, _ctx: RouteContext<()>) -> Result<Response> {
    json_response(&json!({ "error": "Method not allowed" }), 405, false)
}

/// Per-isolate override for the default post count, falling back to 5.
fn default_count(env: &Env) -> usize {
    env.var("DEFAULT_FEED_COUNT")
        .ok()
        .and_then(|v| v.to_string().parse::<usize>().ok())
        .filter(|&c| c >= 1)
        .unwrap_or(DEFAULT_COUNT)
}

fn feed_response(feed: &ProfileFeed, cache_age_minutes: Option<u64>) -> Result<Response> {
    json_response(&feed_body(feed, cache_age_minutes), 200, true)
}

fn error_response(err: &FeedError) -> Result<Response> {
    let (status, body) = error_body(err);
    json_response(&body, status, false)
}

/// Shapes the outward success body. `cached`/`cacheAgeMinutes` only appear
/// truthfully for store-served responses.
fn feed_body(feed: &ProfileFeed, cache_age_minutes: Option<u64>) -> Value {
    let mut body = json!({
        "success": true,
        "handle": feed.username,
        "items": feed.items,
        "cached": cache_age_minutes.is_some(),
    });
    if let Some(age) = cache_age_minutes {
        body["cacheAgeMinutes"] = json!(age);
    }
    body
}

/// Maps the error taxonomy onto (status, body). Schema mismatch and
/// no-content both surface as 404; only server errors carry the underlying
/// message.
fn error_body(err: &FeedError) -> (u16, Value) {
    match err {
        FeedError::InvalidRequest => (
            400,
            json!({ "success": false, "error": err.to_string() }),
        ),
        FeedError::SchemaMismatch | FeedError::NoContent => (
            404,
            json!({ "success": false, "error": err.to_string() }),
        ),
        FeedError::UpstreamUnreachable(msg) => (
            500,
            json!({
                "success": false,
                "error": "Failed to fetch profile feed",
                "message": msg,
            }),
        ),
    }
}

fn json_response(body: &Value, status: u16, cacheable: bool) -> Result<Response> {
    let text = serde_json::to_string(body)
        .map_err(|e| Error::RustError(format!("JSON serialization error: {e}")))?;

    let headers = cors_headers()?;
    headers.set("Content-Type", "application/json")?;
    if cacheable {
        headers.set("Cache-Control", CACHE_DIRECTIVE)?;
    }

    Ok(Response::ok(text)?
        .with_status(status)
        .with_headers(headers))
}

/// Permissive CORS set carried on every response from this route.
fn cors_headers() -> Result<Headers> {
    let headers = Headers::new();
    headers.set("Access-Control-Allow-Origin", "*")?;
    headers.set("Access-Control-Allow-Methods", "GET,OPTIONS")?;
    headers.set("Access-Control-Allow-Headers", "Content-Type")?;
    Ok(headers)
}
