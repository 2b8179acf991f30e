//! Response builders for the shim routes.

use crate::descriptor::SerializedDescriptor;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use url::Url;

/// Body type shared by every shim response, streamed or not.
pub type ShimBody = BoxBody<Bytes, std::io::Error>;

pub const CHECKSUM_HEADER: &str = "x-checksum-sha1";
pub const DESCRIPTOR_CONTENT_TYPE: &str = "text/xml";

fn empty() -> ShimBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

fn full(body: impl Into<Bytes>) -> ShimBody {
    Full::new(body.into()).map_err(|never| match never {}).boxed()
}

fn status_only(status: StatusCode) -> Response<ShimBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

fn text(status: StatusCode, reason: String) -> Response<ShimBody> {
    let mut response = Response::new(full(reason));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

pub fn not_found() -> Response<ShimBody> {
    status_only(StatusCode::NOT_FOUND)
}

pub fn unauthorized(reason: String) -> Response<ShimBody> {
    text(StatusCode::UNAUTHORIZED, reason)
}

pub fn bad_gateway(reason: String) -> Response<ShimBody> {
    text(StatusCode::BAD_GATEWAY, reason)
}

pub fn internal_error(reason: String) -> Response<ShimBody> {
    text(StatusCode::INTERNAL_SERVER_ERROR, reason)
}

/// 200 with checksum headers. The body is omitted for HEAD, but
/// `Content-Length` still reports its size.
pub fn descriptor(descriptor: &SerializedDescriptor, head_only: bool) -> Response<ShimBody> {
    let length = descriptor.body.len();
    let mut response = if head_only {
        Response::new(empty())
    } else {
        Response::new(full(descriptor.body.clone()))
    };
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(DESCRIPTOR_CONTENT_TYPE),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Ok(sha1) = HeaderValue::from_str(&descriptor.sha1) {
        headers.insert(CHECKSUM_HEADER, sha1);
    }
    if let Ok(etag) = HeaderValue::from_str(&descriptor.etag()) {
        headers.insert(header::ETAG, etag);
    }
    response
}

/// `302 Found` pointing at `location`.
pub fn redirect(location: &Url) -> Response<ShimBody> {
    let mut response = status_only(StatusCode::FOUND);
    if let Ok(value) = HeaderValue::from_str(location.as_str()) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}
