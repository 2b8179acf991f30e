pub mod config;
pub mod logging;

pub mod candidates;
pub mod credentials;
pub mod descriptor;
pub mod error;
pub mod identity;
pub mod listing;
pub mod manager;
pub mod platform;
pub mod proxy;
pub mod resolver;
pub mod server;
pub mod upstream;

pub use error::{Result, ShimError};
pub use manager::{ShimManager, Upstream, UpstreamKind};
pub use server::{ShimServer, ShimSettings};
