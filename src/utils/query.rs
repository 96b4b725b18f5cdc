use url::Url;

use crate::feed::types::FeedError;

/// How many posts a request gets when it doesn't say.
pub const DEFAULT_COUNT: usize = 5;

/// Validated query parameters for the feed route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub handle: String,
    pub count: usize,
}

impl FeedQuery {
    /// Requires a non-empty `handle`; `count` is optional and falls back to
    /// `default_count` when missing, unparsable, or zero. There is no upper
    /// bound on count: oversized values just truncate against whatever the
    /// upstream actually returns.
    pub fn from_url(url: &Url, default_count: usize) -> Result<Self, FeedError> {
        let handle = get_query_param(url, "handle")
            .filter(|h| !h.is_empty())
            .ok_or(FeedError::InvalidRequest)?;

        let count = get_query_param(url, "count")
            .and_then(|c| c.parse::<usize>().ok())
            .filter(|&c| c >= 1)
            .unwrap_or(default_count);

        Ok(Self { handle, count })
    }
}

/// Extracts a single query parameter value from a URL.
pub fn get_query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
