//! `reposhim listing` – fetch a plugin listing and dump it as JSON.

use anyhow::{Context, Result};
use reposhim_core::config::ReposhimConfig;
use reposhim_core::listing::UpstreamListing;
use reposhim_core::upstream::RequestOptions;
use std::time::Duration;
use url::Url;

pub async fn run_listing(cfg: &ReposhimConfig, url: &str) -> Result<()> {
    let source = Url::parse(url).with_context(|| format!("invalid listing URL {url}"))?;
    let timeout = Duration::from_secs(cfg.proxy_timeout_secs);
    let listing = tokio::task::spawn_blocking(move || {
        UpstreamListing::fetch(
            &source,
            RequestOptions {
                credentials: None,
                timeout,
            },
        )
    })
    .await??;

    println!("{}", serde_json::to_string_pretty(&listing.entries)?);
    eprintln!("{} entries ({:?})", listing.entries.len(), listing.format);
    Ok(())
}
