//! CLI command handlers, one file per command.

mod descriptor;
mod link;
mod listing;
mod serve;

pub use descriptor::{run_descriptor, DescriptorArgs};
pub use link::run_link;
pub use listing::run_listing;
pub use serve::run_serve;

#[cfg(test)]
pub(crate) use serve::collect_upstreams;
