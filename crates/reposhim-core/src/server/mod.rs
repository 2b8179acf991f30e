//! Local HTTP listener impersonating an Ivy repository for one upstream.
//!
//! Each server owns a small multi-threaded tokio runtime. Binding happens on
//! the caller's thread so port conflicts are seen (and retried) before
//! `start` returns; the accept loop then runs on the server's runtime until
//! [`ShimServer::close`].

mod bind;
mod response;
mod routes;

pub use bind::{PortAllocator, DEFAULT_BASE_PORT};
pub use response::{ShimBody, CHECKSUM_HEADER, DESCRIPTOR_CONTENT_TYPE};

use crate::error::{Result, ShimError};
use crate::proxy::{ConnectionPool, ReverseProxy, DEFAULT_CONNECTIONS_PER_HOST};
use crate::resolver::IdentityResolver;
use crate::upstream::DEFAULT_TIMEOUT;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use url::Url;

pub const DEFAULT_IO_THREADS: usize = 4;

/// Listener and proxy tuning shared by every shim a process starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimSettings {
    pub base_port: u16,
    pub io_threads: usize,
    pub proxy_timeout: Duration,
    pub connections_per_host: usize,
}

impl Default for ShimSettings {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_BASE_PORT,
            io_threads: DEFAULT_IO_THREADS,
            proxy_timeout: DEFAULT_TIMEOUT,
            connections_per_host: DEFAULT_CONNECTIONS_PER_HOST,
        }
    }
}

/// State shared by every request a shim serves.
pub(crate) struct ShimContext {
    pub(crate) upstream: String,
    pub(crate) resolver: IdentityResolver,
    pub(crate) proxy: ReverseProxy,
}

enum State {
    Bound {
        runtime: Runtime,
        shutdown: watch::Sender<bool>,
    },
    Closed,
}

pub struct ShimServer {
    url: Url,
    port: u16,
    upstream: String,
    state: Mutex<State>,
}

impl std::fmt::Debug for ShimServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShimServer")
            .field("url", &self.url.as_str())
            .field("upstream", &self.upstream)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ShimServer {
    /// Bind and start serving. `upstream` only labels logs.
    pub fn start(
        upstream: impl Into<String>,
        resolver: IdentityResolver,
        settings: &ShimSettings,
        ports: &PortAllocator,
    ) -> Result<Self> {
        let upstream = upstream.into();
        let std_listener = ports.bind(settings.base_port).inspect_err(|e| {
            tracing::error!(upstream = %upstream, base_port = settings.base_port, "shim bind failed: {}", e);
        })?;
        let port = std_listener
            .local_addr()
            .map_err(|source| ShimError::Bind {
                port: settings.base_port,
                source,
            })?
            .port();
        let base = format!("http://127.0.0.1:{port}");
        let url = Url::parse(&base).map_err(|source| ShimError::InvalidUrl { url: base, source })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(settings.io_threads.max(1))
            .thread_name("reposhim-io")
            .enable_all()
            .build()
            .map_err(ShimError::Runtime)?;
        let registered = {
            let _guard = runtime.enter();
            TcpListener::from_std(std_listener)
        };
        let listener = match registered {
            Ok(listener) => listener,
            Err(e) => {
                // A runtime must not be dropped from async context.
                runtime.shutdown_background();
                return Err(ShimError::Runtime(e));
            }
        };

        let ctx = Arc::new(ShimContext {
            upstream: upstream.clone(),
            proxy: ReverseProxy::new(
                Arc::new(ConnectionPool::new(settings.connections_per_host)),
                settings.proxy_timeout,
            ),
            resolver,
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        runtime.spawn(accept_loop(listener, ctx, shutdown_rx));

        tracing::info!(upstream = %upstream, url = %url, "shim started");
        Ok(Self {
            url,
            port,
            upstream,
            state: Mutex::new(State::Bound { runtime, shutdown }),
        })
    }

    /// Local base URL, e.g. `http://127.0.0.1:7348/`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn is_closed(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        matches!(*state, State::Closed)
    }

    /// Stop accepting and abort in-flight connections. Idempotent.
    pub fn close(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::replace(&mut *state, State::Closed)
        };
        if let State::Bound { runtime, shutdown } = previous {
            let _ = shutdown.send(true);
            runtime.shutdown_background();
            tracing::info!(upstream = %self.upstream, url = %self.url, "shim stopped");
        }
    }
}

impl Drop for ShimServer {
    fn drop(&mut self) {
        self.close();
    }
}

async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<ShimContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| routes::handle(Arc::clone(&ctx), req));
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            tracing::debug!(%peer, "shim connection ended: {}", e);
                        }
                    });
                }
                Err(e) => tracing::warn!("shim accept failed: {}", e),
            },
        }
    }
}
