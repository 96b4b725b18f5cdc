use serde_json::Value;
use worker::console_log;

use super::extract::items_from_user;
use super::outbound::{browser_headers, encode_handle, get_with_timeout};
use super::types::{FeedError, ProfileFeed};

/// Fallback strategy: scrape the public profile page HTML.
///
/// Two embedding conventions are known, tried in order:
/// 1. a `window._sharedData = {...};` bootstrap assignment whose
///    `entry_data.ProfilePage[0].graphql.user` holds the timeline graph
/// 2. an `application/ld+json` script block carrying the same graph
///    somewhere inside it
pub async fn fetch_profile_page(handle: &str, count: usize) -> Result<ProfileFeed, FeedError> {
    let url = format!("https://www.instagram.com/{}/", encode_handle(handle));

    let headers = browser_headers().map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;
    headers
        .set("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;

    let (status, html) = get_with_timeout(&url, headers).await?;
    console_log!("[profile_page] status={} html_len={} for {}", status, html.len(), handle);

    if status != 200 {
        return Err(FeedError::UpstreamUnreachable(format!(
            "profile page returned {status}"
        )));
    }

    parse_profile_page(&html, handle, count)
}

/// Locates the embedded user graph in profile HTML and normalizes it.
pub fn parse_profile_page(html: &str, handle: &str, count: usize) -> Result<ProfileFeed, FeedError> {
    let user = user_from_shared_data(html)
        .or_else(|| user_from_linked_data(html))
        .ok_or(FeedError::SchemaMismatch)?;

    let items = items_from_user(&user, count).ok_or(FeedError::SchemaMismatch)?;
    if items.is_empty() {
        return Err(FeedError::NoContent);
    }

    Ok(ProfileFeed {
        username: handle.to_string(),
        items,
    })
}

/// Pattern 1: `window._sharedData = {...};` bootstrap blob.
fn user_from_shared_data(html: &str) -> Option<Value> {
    let needle = "window._sharedData";
    let start = html.find(needle)?;
    let after = &html[start + needle.len()..];
    let eq = after.find('=')?;

    let json_text = balanced_json_object(&after[eq + 1..])?;
    let shared: Value = serde_json::from_str(json_text).ok()?;

    shared
        .get("entry_data")?
        .get("ProfilePage")?
        .as_array()?
        .first()?
        .get("graphql")?
        .get("user")
        .cloned()
}

/// Pattern 2: `<script type="application/ld+json">` block. The graph moves
/// around inside these, so search the parsed value for whichever object
/// carries the timeline key.
fn user_from_linked_data(html: &str) -> Option<Value> {
    let open = "<script type=\"application/ld+json\">";
    let start = html.find(open)? + open.len();
    let rest = &html[start..];
    let end = rest.find("</script>")?;

    let parsed: Value = serde_json::from_str(rest[..end].trim()).ok()?;
    find_user_graph(&parsed)
}

/// Depth-first search for the object holding `edge_owner_to_timeline_media`.
fn find_user_graph(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            if map.contains_key("edge_owner_to_timeline_media") {
                return Some(value.clone());
            }
            map.values().find_map(find_user_graph)
        }
        Value::Array(items) => items.iter().find_map(find_user_graph),
        _ => None,
    }
}

/// Extracts the first balanced `{...}` JSON object from `text`, tracking
/// string literals and escapes so braces inside captions don't end it early.
fn balanced_json_object(text: &str) -> Option<&str> {
    let obj_start = text.find('{')?;

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[obj_start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if ch == '"' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[obj_start..obj_start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::feed::testutil::{timeline_node, user_with_nodes};

    fn shared_data_html(nodes: Vec<Value>) -> String {
        let shared = json!({
            "entry_data": {
                "ProfilePage": [ { "graphql": { "user": user_with_nodes(nodes) } } ]
            }
        });
        format!(
            "<html><body><script type=\"text/javascript\">window._sharedData = {};</script></body></html>",
            shared
        )
    }

    fn linked_data_html(nodes: Vec<Value>) -> String {
        let ld = json!({
            "@context": "http://schema.org",
            "@type": "ProfilePage",
            "mainEntityofPage": user_with_nodes(nodes)
        });
        format!(
            "<html><head><script type=\"application/ld+json\">{}</script></head></html>",
            ld
        )
    }

    #[test]
    fn shared_data_pattern_parses() {
        let html = shared_data_html(vec![timeline_node("AAA", 3), timeline_node("BBB", 4)]);
        let feed = parse_profile_page(&html, "museum_demo", 5).unwrap();

        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].shortcode, "AAA");
        assert_eq!(feed.items[0].url, "https://www.instagram.com/p/AAA/");
    }

    #[test]
    fn linked_data_pattern_parses_single_item() {
        let html = linked_data_html(vec![timeline_node("ONLY", 1)]);
        let feed = parse_profile_page(&html, "museum_demo", 5).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].shortcode, "ONLY");
    }

    #[test]
    fn braces_inside_captions_do_not_break_extraction() {
        let mut node = timeline_node("AAA", 1);
        node["edge_media_to_caption"]["edges"][0]["node"]["text"] =
            json!("tricky { caption } with \"quotes\" and \\ escapes");
        let html = shared_data_html(vec![node]);

        let feed = parse_profile_page(&html, "museum_demo", 5).unwrap();
        assert_eq!(
            feed.items[0].caption,
            "tricky { caption } with \"quotes\" and \\ escapes"
        );
    }

    #[test]
    fn page_without_either_pattern_is_schema_mismatch() {
        let html = "<html><body><h1>Login required</h1></body></html>";
        assert!(matches!(
            parse_profile_page(html, "museum_demo", 5),
            Err(FeedError::SchemaMismatch)
        ));
    }

    #[test]
    fn empty_timeline_is_no_content() {
        let html = shared_data_html(vec![]);
        assert!(matches!(
            parse_profile_page(&html, "museum_demo", 5),
            Err(FeedError::NoContent)
        ));
    }

    #[test]
    fn truncates_to_requested_count_in_order() {
        let nodes = (0..10).map(|i| timeline_node(&format!("P{i}"), i)).collect();
        let feed = parse_profile_page(&shared_data_html(nodes), "museum_demo", 3).unwrap();

        assert_eq!(feed.items.len(), 3);
        assert_eq!(
            feed.items.iter().map(|i| i.shortcode.as_str()).collect::<Vec<_>>(),
            vec!["P0", "P1", "P2"]
        );
    }

    #[test]
    fn balanced_extraction_ignores_trailing_script() {
        let text = " = {\"a\": {\"b\": 1}};</script><script>other()</script>";
        assert_eq!(balanced_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }
}
