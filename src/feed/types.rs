use serde::Serialize;
use thiserror::Error;

/// A single normalized post from a profile timeline.
///
/// Field names serialize to the camelCase keys the site's gallery script
/// consumes. Numeric fields default to zero and strings to empty when the
/// upstream graph omits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub shortcode: String,
    pub url: String,
    pub thumbnail: String,
    pub image_url: String,
    pub caption: String,
    pub likes: u64,
    pub comments: u64,
    pub timestamp: u64,
    pub is_video: bool,
}

/// Normalized result of one upstream fetch: the profile's posts in upstream
/// chronological order, already truncated to the requested count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileFeed {
    pub username: String,
    pub items: Vec<FeedItem>,
}

/// Everything that can go wrong between the query string and a shaped feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Handle parameter is required")]
    InvalidRequest,

    /// Network failure, timeout, or a non-200 upstream status.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Neither extraction strategy found a recognizable timeline graph.
    #[error("Could not extract profile data, account may be private")]
    SchemaMismatch,

    /// The graph was there but held zero posts.
    #[error("No posts found or account is private")]
    NoContent,
}
