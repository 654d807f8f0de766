//! Single blocking HTTP GET.
//!
//! Uses the curl crate (libcurl). No custom request headers are sent; the
//! response `Content-Type` and the full body are captured in memory.

mod parse;

pub use parse::ResponseHead;

use std::cell::RefCell;
use std::str;
use std::time::Duration;

use crate::error::{LoadError, LoadResult};

/// Transport knobs for [`fetch`]. Timeouts are off unless set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub connect_timeout: Option<Duration>,
    /// Bound on the whole transfer, body included.
    pub timeout: Option<Duration>,
    /// Redirect hops to follow; `None` leaves libcurl's own limit.
    pub max_redirections: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            timeout: None,
            max_redirections: Some(10),
        }
    }
}

/// A completed 200 OK response. Any other status is an error, so none is kept.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Performs one GET and returns the body of a 200 response.
///
/// Transfer failures before any status line map to `Network`, failures after
/// a 200 status line to `Read`. Any other final status is `InvalidUrl`; the
/// body of such a response is never buffered.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch(url: &str, opts: &FetchOptions) -> LoadResult<FetchedResponse> {
    check_url(url)?;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts).map_err(network)?;

    let head = RefCell::new(ResponseHead::default());
    let body = RefCell::new(Vec::new());
    let outcome = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    if head.borrow_mut().push_line(s) {
                        body.borrow_mut().clear();
                    }
                }
                true
            })
            .map_err(network)?;
        transfer
            .write_function(|data| {
                if head.borrow().status == Some(200) {
                    body.borrow_mut().extend_from_slice(data);
                }
                Ok(data.len())
            })
            .map_err(network)?;
        transfer.perform()
    };
    let head = head.into_inner();

    if let Err(e) = outcome {
        tracing::debug!(url, status = ?head.status, "GET failed: {}", e);
        return Err(match head.status {
            Some(200) => LoadError::Read(e.to_string()),
            // A redirect that could not be followed never produced a response.
            Some(status) if (300..400).contains(&status) => network(e),
            Some(status) => LoadError::InvalidUrl { status },
            None => network(e),
        });
    }

    let status = easy.response_code().map_err(network)?;
    if status == 0 {
        return Err(LoadError::Network(format!("no response from {}", url)));
    }
    if status != 200 {
        tracing::debug!(url, status, "GET returned non-200");
        return Err(LoadError::InvalidUrl { status });
    }

    let body = body.into_inner();
    tracing::debug!(
        url,
        status,
        content_type = ?head.content_type,
        bytes = body.len(),
        "GET complete"
    );
    Ok(FetchedResponse {
        content_type: head.content_type,
        body,
    })
}

fn configure(
    easy: &mut curl::easy::Easy,
    url: &str,
    opts: &FetchOptions,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    if let Some(n) = opts.max_redirections {
        easy.max_redirections(n)?;
    }
    if let Some(d) = opts.connect_timeout {
        easy.connect_timeout(d)?;
    }
    if let Some(d) = opts.timeout {
        easy.timeout(d)?;
    }
    Ok(())
}

/// Only absolute http(s) URLs can be fetched.
fn check_url(url: &str) -> LoadResult<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| LoadError::Network(format!("invalid URL {:?}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(LoadError::Network(format!(
            "unsupported URL scheme {:?} in {:?}",
            other, url
        ))),
    }
}

fn network(e: curl::Error) -> LoadError {
    LoadError::Network(e.to_string())
}
