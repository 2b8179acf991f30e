//! Error taxonomy for shim operations.
//!
//! "Not found" is absent: an identity that cannot be mapped is an
//! ordinary [`Resolution::NotFound`](crate::resolver::Resolution) answered with
//! 404, not a failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShimError {
    /// Upstream rejected the supplied credentials (HTTP 401/403).
    #[error("upstream {url} rejected credentials (HTTP {status})")]
    Unauthorized { url: String, status: u32 },

    /// Upstream answered with a non-success status other than an auth failure.
    #[error("upstream {url} returned HTTP {status}")]
    UpstreamStatus { url: String, status: u32 },

    /// Transport failure talking to the upstream (connect, TLS, timeout).
    #[error("upstream {url} unavailable: {source}")]
    Upstream {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("could not parse listing from {url}: {reason}")]
    ListingParse { url: String, reason: String },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Every candidate port from `base_port` up to `last_port` was in use.
    #[error("no free port for shim listener (tried {base_port}..={last_port})")]
    BindExhausted { base_port: u16, last_port: u16 },

    #[error("failed to bind shim listener on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start shim runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("descriptor serialization failed: {0}")]
    Descriptor(String),

    /// The running platform has no binary archive convention.
    #[error("unsupported platform for binary downloads: {0}")]
    UnsupportedPlatform(String),
}

impl ShimError {
    /// True for failures that should be reported to the client as 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ShimError::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, ShimError>;
