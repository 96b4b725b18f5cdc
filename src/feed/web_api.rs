use serde_json::Value;
use worker::console_log;

use super::extract::items_from_user;
use super::outbound::{browser_headers, encode_handle, get_with_timeout};
use super::types::{FeedError, ProfileFeed};

const IG_APP_ID: &str = "936619743392459";

/// Primary strategy: the structured `web_profile_info` JSON endpoint.
///
/// Returns the whole profile graph in one call when Instagram feels like
/// serving it; datacenter IPs often get a login wall instead, which lands
/// in `SchemaMismatch` and hands control to the profile-page fallback.
pub async fn fetch_web_profile(handle: &str, count: usize) -> Result<ProfileFeed, FeedError> {
    let url = format!(
        "https://www.instagram.com/api/v1/users/web_profile_info/?username={}",
        encode_handle(handle)
    );

    let headers = browser_headers().map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;
    headers
        .set("Accept", "application/json")
        .map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;
    headers
        .set("X-Ig-App-Id", IG_APP_ID)
        .map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;

    let (status, body) = get_with_timeout(&url, headers).await?;
    console_log!("[web_api] status={} len={} for {}", status, body.len(), handle);

    if status != 200 {
        return Err(FeedError::UpstreamUnreachable(format!(
            "web profile endpoint returned {status}"
        )));
    }

    parse_web_profile(&body, handle, count)
}

/// Parses the `web_profile_info` response into a normalized feed.
pub fn parse_web_profile(body: &str, handle: &str, count: usize) -> Result<ProfileFeed, FeedError> {
    let json: Value = serde_json::from_str(body).map_err(|_| FeedError::SchemaMismatch)?;

    let user = json
        .get("data")
        .and_then(|d| d.get("user"))
        .filter(|u| !u.is_null())
        .ok_or(FeedError::SchemaMismatch)?;

    let items = items_from_user(user, count).ok_or(FeedError::SchemaMismatch)?;
    if items.is_empty() {
        return Err(FeedError::NoContent);
    }

    Ok(ProfileFeed {
        username: handle.to_string(),
        items,
    })
}
