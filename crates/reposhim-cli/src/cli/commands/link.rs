//! `reposhim link` – resolve one plugin's download link through a listing.

use anyhow::{bail, Context, Result};
use reposhim_core::config::ReposhimConfig;
use reposhim_core::identity::ArtifactIdentity;
use reposhim_core::resolver::ListingResolver;
use std::time::Duration;
use url::Url;

pub async fn run_link(cfg: &ReposhimConfig, url: &str, id: &str, version: &str) -> Result<()> {
    let source = Url::parse(url).with_context(|| format!("invalid listing URL {url}"))?;
    let resolver = ListingResolver::new(source, None)
        .with_group(cfg.listing_group.clone())
        .with_timeout(Duration::from_secs(cfg.proxy_timeout_secs));
    let identity = ArtifactIdentity::new(cfg.listing_group.clone(), id, version);

    let lookup = identity.clone();
    let link = tokio::task::spawn_blocking(move || resolver.resolve_download_link(&lookup)).await??;
    match link {
        Some(link) => {
            println!("{link}");
            Ok(())
        }
        None => bail!("{identity} is not in the listing"),
    }
}
