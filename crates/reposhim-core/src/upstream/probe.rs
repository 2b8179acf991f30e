//! Existence probe for CDN candidate URLs.

use super::{configure, status_error, transport_error, RequestOptions};
use crate::error::Result;

/// HEAD `url` following redirects. `Ok(false)` on 404, `Ok(true)` on 2xx,
/// error otherwise.
pub fn exists(url: &str, opts: RequestOptions<'_>) -> Result<bool> {
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts, &[]).map_err(|e| transport_error(url, e))?;
    easy.nobody(true)
        .and_then(|_| easy.follow_location(true))
        .and_then(|_| easy.max_redirections(10))
        .map_err(|e| transport_error(url, e))?;
    easy.perform().map_err(|e| transport_error(url, e))?;

    let code = easy.response_code().map_err(|e| transport_error(url, e))?;
    match code {
        200..=299 => Ok(true),
        404 => Ok(false),
        other => Err(status_error(url, other)),
    }
}
