//! Single-hop redirect resolution.

use super::{configure, parse_header_lines, transport_error, RequestOptions};
use crate::error::{Result, ShimError};
use std::str;
use url::Url;

/// Issue a HEAD to `url` without following redirects. On 301/302 return the
/// `Location` resolved against `url`; otherwise return `url` unchanged.
///
/// Only headers are read, and the connection is closed before returning.
pub fn resolve_redirection(url: &Url, opts: RequestOptions<'_>) -> Result<Url> {
    let mut lines: Vec<String> = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url.as_str(), opts, &[]).map_err(|e| transport_error(url.as_str(), e))?;
    easy.nobody(true)
        .and_then(|_| easy.follow_location(false))
        .and_then(|_| easy.forbid_reuse(true))
        .map_err(|e| transport_error(url.as_str(), e))?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(|e| transport_error(url.as_str(), e))?;
        transfer
            .perform()
            .map_err(|e| transport_error(url.as_str(), e))?;
    }
    drop(easy);

    let head = parse_header_lines(&lines);
    let location = match head.status {
        301 | 302 => head.header("location"),
        _ => None,
    };
    let Some(location) = location else {
        return Ok(url.clone());
    };
    let resolved = url.join(location).map_err(|source| ShimError::InvalidUrl {
        url: location.to_string(),
        source,
    })?;
    tracing::debug!(from = %url, to = %resolved, "resolved redirection");
    Ok(resolved)
}
