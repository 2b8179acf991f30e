use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::manager::Upstream;
use crate::resolver::{Product, ProductTable, DEFAULT_LISTING_GROUP};
use crate::server::{ShimSettings, DEFAULT_BASE_PORT, DEFAULT_IO_THREADS};
use crate::proxy::DEFAULT_CONNECTIONS_PER_HOST;

/// Extra static-mapping row (optional `[[products]]` tables in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub code: String,
    /// Dependency coordinates the build asks for.
    pub group: String,
    pub artifact: String,
    /// Binary CDN coordinates; a product without them is never served.
    #[serde(default)]
    pub binary_group: Option<String>,
    #[serde(default)]
    pub binary_artifact: Option<String>,
}

impl ProductConfig {
    pub fn to_product(&self) -> Product {
        let binary = match (&self.binary_group, &self.binary_artifact) {
            (Some(g), Some(a)) => Some((g.as_str(), a.as_str())),
            _ => None,
        };
        Product::new(&self.code, Some((self.group.as_str(), self.artifact.as_str())), binary)
    }
}

/// Global configuration loaded from `~/.config/reposhim/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReposhimConfig {
    /// First port tried for shim listeners; later shims and conflicts move up.
    pub base_port: u16,
    /// Worker threads per shim listener.
    pub io_threads: usize,
    /// Ceiling in seconds for one proxied upstream request.
    pub proxy_timeout_secs: u64,
    /// Idle upstream connections kept per host.
    pub connections_per_host: usize,
    /// Group that listing-backed plugins are published under.
    pub listing_group: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductConfig>,
    /// Upstreams started by `reposhim serve`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<Upstream>,
}

impl Default for ReposhimConfig {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_BASE_PORT,
            io_threads: DEFAULT_IO_THREADS,
            proxy_timeout_secs: 30,
            connections_per_host: DEFAULT_CONNECTIONS_PER_HOST,
            listing_group: DEFAULT_LISTING_GROUP.to_string(),
            products: Vec::new(),
            upstreams: Vec::new(),
        }
    }
}

impl ReposhimConfig {
    pub fn shim_settings(&self) -> ShimSettings {
        ShimSettings {
            base_port: self.base_port,
            io_threads: self.io_threads,
            proxy_timeout: Duration::from_secs(self.proxy_timeout_secs),
            connections_per_host: self.connections_per_host,
        }
    }

    /// Built-in products followed by the configured extras.
    pub fn product_table(&self) -> ProductTable {
        ProductTable::with_extra(self.products.iter().map(ProductConfig::to_product))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("reposhim")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ReposhimConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ReposhimConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<ReposhimConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: ReposhimConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
