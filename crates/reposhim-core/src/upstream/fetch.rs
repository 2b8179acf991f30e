//! Whole-body GET used for catalog listings.

use super::{configure, status_error, transport_error, RequestOptions};
use crate::error::Result;

/// GET `url` and return the body as text. Redirects are followed.
///
/// 401/403 become [`ShimError::Unauthorized`](crate::ShimError::Unauthorized);
/// any other non-2xx status is an error too, never an empty body.
pub fn fetch_text(url: &str, opts: RequestOptions<'_>) -> Result<String> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts, &[]).map_err(|e| transport_error(url, e))?;
    easy.follow_location(true)
        .and_then(|_| easy.max_redirections(10))
        .map_err(|e| transport_error(url, e))?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(|e| transport_error(url, e))?;
        transfer.perform().map_err(|e| transport_error(url, e))?;
    }

    let code = easy.response_code().map_err(|e| transport_error(url, e))?;
    if !(200..300).contains(&code) {
        return Err(status_error(url, code));
    }
    tracing::debug!(url, bytes = body.len(), "fetched upstream document");
    Ok(String::from_utf8_lossy(&body).into_owned())
}
