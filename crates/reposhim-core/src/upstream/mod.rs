//! Blocking upstream HTTP calls built on libcurl.
//!
//! Everything here runs on the calling thread; async callers go through
//! `spawn_blocking`. Credentials are attached to every request.

mod fetch;
mod headers;
mod probe;
mod redirect;

pub use fetch::fetch_text;
pub use headers::ResponseHead;
pub use probe::exists;
pub use redirect::resolve_redirection;

pub(crate) use headers::parse_header_lines;

use crate::credentials::Credentials;
use crate::error::ShimError;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request settings shared by all upstream calls.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions<'a> {
    pub credentials: Option<&'a Credentials>,
    pub timeout: Duration,
}

impl Default for RequestOptions<'_> {
    fn default() -> Self {
        Self {
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Apply URL, timeouts, credentials and `extra_headers` to `easy`.
pub(crate) fn configure(
    easy: &mut curl::easy::Easy,
    url: &str,
    opts: RequestOptions<'_>,
    extra_headers: &[(String, String)],
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    easy.timeout(opts.timeout)?;

    let mut list = curl::easy::List::new();
    for (k, v) in extra_headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if let Some(creds) = opts.credentials {
        creds.apply(easy, &mut list)?;
    }
    easy.http_headers(list)?;
    Ok(())
}

pub(crate) fn transport_error(url: &str, source: curl::Error) -> ShimError {
    ShimError::Upstream {
        url: url.to_string(),
        source,
    }
}

/// Map a non-success status to the error taxonomy.
pub(crate) fn status_error(url: &str, status: u32) -> ShimError {
    match status {
        401 | 403 => ShimError::Unauthorized {
            url: url.to_string(),
            status,
        },
        _ => ShimError::UpstreamStatus {
            url: url.to_string(),
            status,
        },
    }
}
