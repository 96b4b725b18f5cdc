use serde_json::Value;

use super::types::FeedItem;

/// Normalizes a user graph's timeline into feed items, truncated to `count`.
///
/// Both strategies end up with the same `edge_owner_to_timeline_media`
/// shape, so this is the single place the upstream schema is interpreted.
/// Returns `None` when the timeline key itself is missing (schema drift),
/// as opposed to an empty vec for a present-but-empty timeline.
pub fn items_from_user(user: &Value, count: usize) -> Option<Vec<FeedItem>> {
    let edges = user
        .get("edge_owner_to_timeline_media")?
        .get("edges")?
        .as_array()?;

    let items = edges
        .iter()
        .take(count)
        .filter_map(|edge| edge.get("node"))
        .map(item_from_node)
        .collect();

    Some(items)
}

/// Converts one timeline node into a `FeedItem`, defaulting absent fields.
fn item_from_node(node: &Value) -> FeedItem {
    let shortcode = node
        .get("shortcode")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let caption = node
        .get("edge_media_to_caption")
        .and_then(|c| c.get("edges"))
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|edge| edge.get("node"))
        .and_then(|n| n.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    FeedItem {
        url: format!("https://www.instagram.com/p/{shortcode}/"),
        thumbnail: node
            .get("thumbnail_src")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        image_url: node
            .get("display_url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        caption,
        likes: node
            .get("edge_liked_by")
            .and_then(|l| l.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        comments: node
            .get("edge_media_to_comment")
            .and_then(|c| c.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        timestamp: node
            .get("taken_at_timestamp")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        is_video: node
            .get("is_video")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        shortcode,
    }
}
