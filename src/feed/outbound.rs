use std::future::Future;
use std::time::Duration;

use futures_util::future::{select, Either};
use futures_util::pin_mut;
use worker::{AbortController, Delay, Fetch, Headers, Method, Request, RequestInit};

use super::types::FeedError;

/// Hard ceiling on any single upstream request.
pub const FETCH_TIMEOUT_MS: u64 = 10_000;

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Builds the browser-ish headers both strategies send.
pub fn browser_headers() -> worker::Result<Headers> {
    let headers = Headers::new();
    headers.set("User-Agent", CHROME_UA)?;
    headers.set("Accept-Language", "en-US,en;q=0.9")?;
    Ok(headers)
}

/// Percent-encodes a handle for interpolation into an upstream URL, so a
/// handle carrying `&`, `/`, `?`, or `#` cannot rewrite the request.
pub fn encode_handle(handle: &str) -> String {
    url::form_urlencoded::byte_serialize(handle.as_bytes()).collect()
}

/// Issues a GET bounded at [`FETCH_TIMEOUT_MS`], returning the response
/// status and body. The deadline covers the whole round trip — response
/// headers and the body read both — and on expiry the request is aborted
/// and reported as unreachable. No retry: a failed fetch surfaces
/// immediately to the strategy that asked for it.
pub async fn get_with_timeout(url: &str, headers: Headers) -> Result<(u16, String), FeedError> {
    let mut init = RequestInit::new();
    init.with_method(Method::Get).with_headers(headers);

    let request = Request::new_with_init(url, &init)
        .map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;

    let controller = AbortController::default();
    let signal = controller.signal();

    let upstream = Fetch::Request(request);
    let round_trip = async {
        let mut resp = upstream
            .send_with_signal(&signal)
            .await
            .map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;
        let status = resp.status_code();
        let body = resp
            .text()
            .await
            .map_err(|e| FeedError::UpstreamUnreachable(e.to_string()))?;
        Ok((status, body))
    };

    let deadline = Delay::from(Duration::from_millis(FETCH_TIMEOUT_MS));
    with_deadline(round_trip, deadline, move || controller.abort()).await
}

/// Races `work` against `deadline`. When the deadline wins, `cancel` runs
/// (aborting the in-flight request) and the operation reports as
/// unreachable. `work` stays in the race across all of its suspension
/// points, not just the first one.
async fn with_deadline<T>(
    work: impl Future<Output = Result<T, FeedError>>,
    deadline: impl Future<Output = ()>,
    cancel: impl FnOnce(),
) -> Result<T, FeedError> {
    pin_mut!(work);
    pin_mut!(deadline);

    match select(work, deadline).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            cancel();
            Err(FeedError::UpstreamUnreachable(format!(
                "timed out after {FETCH_TIMEOUT_MS}ms"
            )))
        }
    }
}
