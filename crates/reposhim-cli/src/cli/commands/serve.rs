//! `reposhim serve` – run shims until interrupted.

use anyhow::{bail, Context, Result};
use reposhim_core::config::ReposhimConfig;
use reposhim_core::{ShimManager, Upstream, UpstreamKind};

/// Configured upstreams followed by the ones given on the command line.
pub(crate) fn collect_upstreams(
    cfg: &ReposhimConfig,
    extra: &[String],
    kind: UpstreamKind,
) -> Result<Vec<Upstream>> {
    let mut upstreams = cfg.upstreams.clone();
    for url in extra {
        let upstream =
            Upstream::new(url, kind).with_context(|| format!("bad --upstream {url}"))?;
        upstreams.push(upstream);
    }
    Ok(upstreams)
}

pub async fn run_serve(
    cfg: &ReposhimConfig,
    extra: &[String],
    kind: UpstreamKind,
    port: Option<u16>,
) -> Result<()> {
    let upstreams = collect_upstreams(cfg, extra, kind)?;
    if upstreams.is_empty() {
        bail!("no upstreams configured; add [[upstreams]] to the config or pass --upstream");
    }

    let mut settings = cfg.shim_settings();
    if let Some(port) = port {
        settings.base_port = port;
    }
    let manager = ShimManager::new(settings)
        .with_products(cfg.product_table())
        .with_listing_group(cfg.listing_group.clone());

    for upstream in &upstreams {
        let shim = manager
            .get(upstream)
            .with_context(|| format!("failed to start shim for {}", upstream.url))?;
        println!("{:<8} {} -> {}", upstream.kind, upstream.url, shim.url());
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for Ctrl-C")?;
    tracing::info!("stopping {} shim(s)", manager.len());
    manager.close_all();
    Ok(())
}
