//! Request dispatch for the two shim routes.

use super::response::{self, ShimBody};
use super::ShimContext;
use crate::descriptor;
use crate::error::ShimError;
use crate::identity::{ArtifactIdentity, Route};
use crate::proxy::forwardable_headers;
use crate::resolver::{DownloadTarget, Resolution};
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

pub(crate) async fn handle(
    ctx: Arc<ShimContext>,
    req: Request<Incoming>,
) -> Result<Response<ShimBody>, Infallible> {
    let head_only = match *req.method() {
        Method::GET => false,
        Method::HEAD => true,
        _ => return Ok(response::not_found()),
    };
    let Some(route) = Route::parse(req.uri().path()) else {
        tracing::debug!(path = req.uri().path(), "no shim route");
        return Ok(response::not_found());
    };

    let response = match route {
        Route::Descriptor(identity) => descriptor_route(&ctx, identity, head_only).await,
        Route::Download(identity) => {
            let headers = forwardable_headers(req.headers());
            download_route(&ctx, identity, head_only, headers).await
        }
    };
    Ok(response)
}

async fn descriptor_route(
    ctx: &Arc<ShimContext>,
    identity: ArtifactIdentity,
    head_only: bool,
) -> Response<ShimBody> {
    tracing::info!(upstream = %ctx.upstream, identity = %identity, head_only, "descriptor request");
    let resolver = Arc::clone(ctx);
    let lookup = identity.clone();
    let resolved =
        match tokio::task::spawn_blocking(move || resolver.resolver.resolve(&lookup)).await {
            Ok(resolved) => resolved,
            Err(e) => return response::internal_error(format!("descriptor lookup aborted: {e}")),
        };

    match resolved {
        Ok(Resolution::Found(module)) => match descriptor::serialize(&module) {
            Ok(serialized) => {
                tracing::debug!(identity = %identity, sha1 = %serialized.sha1, "serving descriptor");
                response::descriptor(&serialized, head_only)
            }
            Err(e) => error_response(&identity, e),
        },
        Ok(Resolution::NotFound) => {
            tracing::debug!(identity = %identity, "descriptor not found");
            response::not_found()
        }
        Err(e) => error_response(&identity, e),
    }
}

async fn download_route(
    ctx: &Arc<ShimContext>,
    identity: ArtifactIdentity,
    head_only: bool,
    headers: Vec<(String, String)>,
) -> Response<ShimBody> {
    tracing::info!(upstream = %ctx.upstream, identity = %identity, head_only, "download request");
    let resolver = Arc::clone(ctx);
    let lookup = identity.clone();
    let target =
        match tokio::task::spawn_blocking(move || resolver.resolver.download_target(&lookup)).await
        {
            Ok(target) => target,
            Err(e) => return response::internal_error(format!("download lookup aborted: {e}")),
        };

    match target {
        Ok(DownloadTarget::Redirect(url)) => {
            tracing::info!(identity = %identity, location = %url, "redirecting download");
            response::redirect(&url)
        }
        Ok(DownloadTarget::Proxy(url)) => {
            tracing::info!(identity = %identity, target = %url, "proxying download");
            let credentials = ctx.resolver.credentials().cloned();
            match ctx.proxy.forward(url, head_only, headers, credentials).await {
                Ok(response) => response,
                Err(e) => error_response(&identity, e),
            }
        }
        Ok(DownloadTarget::NotFound) => {
            tracing::debug!(identity = %identity, "download not found");
            response::not_found()
        }
        Err(e) => error_response(&identity, e),
    }
}

/// Map a failed lookup or transfer onto an HTTP status.
fn error_response(identity: &ArtifactIdentity, err: ShimError) -> Response<ShimBody> {
    match &err {
        ShimError::Unauthorized { url, status } => {
            tracing::error!(identity = %identity, upstream = %url, status, "upstream rejected credentials");
            response::unauthorized(err.to_string())
        }
        ShimError::Upstream { .. }
        | ShimError::UpstreamStatus { .. }
        | ShimError::ListingParse { .. }
        | ShimError::InvalidUrl { .. } => {
            tracing::warn!(identity = %identity, "upstream failure: {}", err);
            response::bad_gateway(err.to_string())
        }
        _ => {
            tracing::error!(identity = %identity, "shim failure: {}", err);
            response::internal_error(err.to_string())
        }
    }
}
