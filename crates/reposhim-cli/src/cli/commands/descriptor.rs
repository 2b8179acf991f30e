//! `reposhim descriptor` – show the static mapping for one identity, offline.

use anyhow::{anyhow, bail, Context, Result};
use reposhim_core::config::ReposhimConfig;
use reposhim_core::descriptor;
use reposhim_core::identity::ArtifactIdentity;
use reposhim_core::platform::{Arch, Os, Target};
use reposhim_core::resolver::{Resolution, StaticResolver};
use url::Url;

/// Used when only the descriptor is printed; it does not appear in it.
const DEFAULT_CDN: &str = "https://download.jetbrains.com";

#[derive(Debug)]
pub struct DescriptorArgs {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub candidates: Option<String>,
}

pub(crate) fn target_from(os: Option<&str>, arch: Option<&str>) -> Result<Target> {
    let current = Target::current();
    let os = match os {
        Some(os) => os.parse::<Os>().map_err(|e| anyhow!(e))?,
        None => current
            .as_ref()
            .map(|t| t.os)
            .ok_or_else(|| anyhow!("unsupported host OS; pass --os"))?,
    };
    let arch = match arch {
        Some(arch) => Arch::from(arch),
        None => Arch::from(std::env::consts::ARCH),
    };
    Ok(Target::new(os, arch))
}

pub fn run_descriptor(cfg: &ReposhimConfig, args: DescriptorArgs) -> Result<()> {
    let target = target_from(args.os.as_deref(), args.arch.as_deref())?;
    let cdn = args.candidates.as_deref().unwrap_or(DEFAULT_CDN);
    let cdn = Url::parse(cdn).with_context(|| format!("invalid CDN URL {cdn}"))?;
    let resolver = StaticResolver::new(cfg.product_table(), target, cdn);
    let identity = ArtifactIdentity::new(args.group, args.artifact, args.version);

    if args.candidates.is_some() {
        let candidates = resolver.download_candidates(&identity);
        if candidates.is_empty() {
            bail!("no binary mapping for {identity}");
        }
        for url in candidates {
            println!("{url}");
        }
        return Ok(());
    }

    match resolver.resolve(&identity) {
        Resolution::Found(module) => {
            let serialized = descriptor::serialize(&module)?;
            println!("{}", serialized.body);
            eprintln!("sha1 {} ({})", serialized.sha1, resolver.target());
            Ok(())
        }
        Resolution::NotFound => bail!("no binary mapping for {identity}"),
    }
}
