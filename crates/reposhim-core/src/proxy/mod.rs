//! Streams a resolved upstream download back to the shim client.
//!
//! The transfer runs on a blocking thread with a pooled curl handle. Response
//! headers are handed to the async side before the first body byte; body
//! chunks follow over a bounded channel so slow clients apply backpressure to
//! the upstream read.

mod key;
mod pool;

pub use key::HostKey;
pub use pool::{ConnectionPool, DEFAULT_CONNECTIONS_PER_HOST};

use crate::credentials::Credentials;
use crate::error::{Result, ShimError};
use crate::server::ShimBody;
use crate::upstream::{self, parse_header_lines, transport_error, ResponseHead, RequestOptions};
use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyExt, Empty, StreamBody};
use hyper::body::Frame;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Response, StatusCode};
use std::cell::RefCell;
use std::str;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use url::Url;

/// Inbound request headers passed on to the upstream. `Host` is never
/// forwarded; curl derives it from the target URL.
pub const FORWARDED_REQUEST_HEADERS: &[&str] = &[
    "accept",
    "user-agent",
    "range",
    "if-none-match",
    "if-modified-since",
    "if-range",
];

/// Upstream response headers copied to the client.
pub const FORWARDED_RESPONSE_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-range",
    "content-disposition",
    "accept-ranges",
    "last-modified",
    "etag",
    "cache-control",
];

const BODY_CHANNEL_DEPTH: usize = 16;

#[derive(Debug)]
pub struct ReverseProxy {
    pool: Arc<ConnectionPool>,
    timeout: Duration,
}

impl ReverseProxy {
    pub fn new(pool: Arc<ConnectionPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Fetch `target` and stream it back. `head_only` issues a HEAD upstream.
    ///
    /// Errors only when the upstream fails before any response header
    /// arrived; later failures end the body stream with an error.
    pub async fn forward(
        &self,
        target: Url,
        head_only: bool,
        headers: Vec<(String, String)>,
        credentials: Option<Credentials>,
    ) -> Result<Response<ShimBody>> {
        let key = HostKey::from_url(&target).ok_or_else(|| ShimError::InvalidUrl {
            url: target.to_string(),
            source: url::ParseError::EmptyHost,
        })?;
        let (head_tx, head_rx) = oneshot::channel::<Result<ResponseHead>>();
        let (body_tx, body_rx) = mpsc::channel::<std::io::Result<Bytes>>(BODY_CHANNEL_DEPTH);
        let pool = Arc::clone(&self.pool);
        let timeout = self.timeout;

        tracing::debug!(url = %target, head_only, "proxying upstream request");
        tokio::task::spawn_blocking(move || {
            let transfer = Transfer {
                target,
                head_only,
                headers,
                credentials,
                timeout,
            };
            transfer.run(&pool, key, head_tx, body_tx);
        });

        let head = match head_rx.await {
            Ok(head) => head?,
            Err(_) => {
                return Err(ShimError::Runtime(std::io::Error::other(
                    "proxy transfer ended without a response",
                )))
            }
        };
        Ok(build_response(head, head_only, body_rx))
    }
}

struct Transfer {
    target: Url,
    head_only: bool,
    headers: Vec<(String, String)>,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl Transfer {
    fn run(
        self,
        pool: &ConnectionPool,
        key: HostKey,
        head_tx: oneshot::Sender<Result<ResponseHead>>,
        body_tx: mpsc::Sender<std::io::Result<Bytes>>,
    ) {
        let url = self.target.as_str();
        let mut easy = pool.checkout(&key);
        let opts = RequestOptions {
            credentials: self.credentials.as_ref(),
            timeout: self.timeout,
        };
        let setup = upstream::configure(&mut easy, url, opts, &self.headers)
            .and_then(|_| easy.follow_location(true))
            .and_then(|_| easy.max_redirections(10))
            .and_then(|_| easy.nobody(self.head_only));
        if let Err(e) = setup {
            let _ = head_tx.send(Err(transport_error(url, e)));
            return;
        }

        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let head_tx = RefCell::new(Some(head_tx));
        let send_head = || {
            if let Some(tx) = head_tx.borrow_mut().take() {
                let _ = tx.send(Ok(parse_header_lines(&lines.borrow())));
            }
        };

        let outcome = {
            let mut transfer = easy.transfer();
            let configured = transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        lines.borrow_mut().push(s.trim_end().to_string());
                    }
                    true
                })
                .and_then(|_| {
                    transfer.write_function(|data| {
                        send_head();
                        match body_tx.blocking_send(Ok(Bytes::copy_from_slice(data))) {
                            Ok(()) => Ok(data.len()),
                            // Client went away.
                            Err(_) => Ok(0),
                        }
                    })
                });
            configured.and_then(|_| transfer.perform())
        };

        match outcome {
            Ok(()) => {
                send_head();
                pool.checkin(key, easy);
            }
            Err(e) => match head_tx.borrow_mut().take() {
                Some(tx) => {
                    tracing::warn!(url = %url, "upstream failed before response: {}", e);
                    let _ = tx.send(Err(transport_error(url, e)));
                }
                None => {
                    tracing::warn!(url = %url, "upstream failed mid-stream: {}", e);
                    let _ = body_tx.blocking_send(Err(std::io::Error::other(e)));
                }
            },
        }
    }
}

fn build_response(
    head: ResponseHead,
    head_only: bool,
    mut body_rx: mpsc::Receiver<std::io::Result<Bytes>>,
) -> Response<ShimBody> {
    let body: ShimBody = if head_only {
        Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
    } else {
        let stream = futures_util::stream::poll_fn(move |cx| body_rx.poll_recv(cx))
            .map(|chunk| chunk.map(Frame::data));
        BodyExt::boxed(StreamBody::new(stream))
    };

    let mut response = Response::new(body);
    *response.status_mut() =
        StatusCode::from_u16(head.status as u16).unwrap_or(StatusCode::BAD_GATEWAY);
    for (name, value) in &head.headers {
        let lower = name.to_ascii_lowercase();
        if !FORWARDED_RESPONSE_HEADERS.contains(&lower.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(lower.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

/// Inbound headers worth forwarding, in a form [`upstream::configure`] takes.
pub fn forwardable_headers(headers: &hyper::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| FORWARDED_REQUEST_HEADERS.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
