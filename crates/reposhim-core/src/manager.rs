//! Registry of running shims, one per upstream URL.
//!
//! The registry is an ordinary owned value; a process (or a test) creates as
//! many as it needs. Creation is exactly-once per key: concurrent `get` calls
//! for one upstream race on a per-key cell, so only one listener is bound,
//! while lookups for other keys never wait on it.

use crate::credentials::Credentials;
use crate::error::{Result, ShimError};
use crate::platform::Target;
use crate::resolver::{IdentityResolver, ListingResolver, ProductTable, StaticResolver, DEFAULT_LISTING_GROUP};
use crate::server::{PortAllocator, ShimServer, ShimSettings};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use url::Url;

/// Which resolution strategy an upstream is served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamKind {
    /// Remote plugin catalog; downloads are proxied.
    Listing,
    /// Binary CDN with a non-Maven layout; downloads are redirected.
    Cdn,
}

impl FromStr for UpstreamKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "listing" => Ok(UpstreamKind::Listing),
            "cdn" => Ok(UpstreamKind::Cdn),
            other => Err(format!("unknown upstream kind '{other}' (expected listing or cdn)")),
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpstreamKind::Listing => "listing",
            UpstreamKind::Cdn => "cdn",
        })
    }
}

/// A real repository a shim stands in for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    pub url: Url,
    pub kind: UpstreamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl Upstream {
    pub fn new(url: &str, kind: UpstreamKind) -> Result<Self> {
        let url = Url::parse(url).map_err(|source| ShimError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self {
            url,
            kind,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Registry key: the parsed URL without trailing slashes.
    pub fn key(&self) -> String {
        normalize_url(&self.url)
    }
}

fn normalize_url(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

type Slot = Arc<OnceCell<Arc<ShimServer>>>;

pub struct ShimManager {
    settings: ShimSettings,
    products: ProductTable,
    target: Option<Target>,
    listing_group: String,
    ports: PortAllocator,
    shims: RwLock<HashMap<String, Slot>>,
}

impl ShimManager {
    pub fn new(settings: ShimSettings) -> Self {
        Self {
            settings,
            products: ProductTable::builtin(),
            target: Target::current(),
            listing_group: DEFAULT_LISTING_GROUP.to_string(),
            ports: PortAllocator::new(),
            shims: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_products(mut self, products: ProductTable) -> Self {
        self.products = products;
        self
    }

    /// Platform CDN shims resolve binaries for. Defaults to the running one.
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_listing_group(mut self, group: impl Into<String>) -> Self {
        self.listing_group = group.into();
        self
    }

    pub fn settings(&self) -> &ShimSettings {
        &self.settings
    }

    /// Running shim for `upstream`, starting one on first use.
    ///
    /// The returned shim is always one the registry tracks: if `stop` removed
    /// the slot while it was starting, that server is closed and another one
    /// is started in a fresh slot.
    pub fn get(&self, upstream: &Upstream) -> Result<Arc<ShimServer>> {
        let key = upstream.key();
        loop {
            let slot = self.slot(&key);
            let shim = match slot.get_or_try_init(|| self.start(upstream).map(Arc::new)) {
                Ok(shim) => Arc::clone(shim),
                Err(e) => {
                    self.discard(&key, &slot);
                    return Err(e);
                }
            };
            if self.is_current(&key, &slot) {
                return Ok(shim);
            }
            tracing::debug!(upstream = %upstream.url, "shim stopped while starting, retrying");
            shim.close();
        }
    }

    /// Running shim for `url`, without starting one.
    pub fn find(&self, url: &Url) -> Option<Arc<ShimServer>> {
        let shims = self.shims.read().unwrap_or_else(|p| p.into_inner());
        shims.get(&normalize_url(url))?.get().cloned()
    }

    /// Close and forget the shim for `url`. Unknown URLs are ignored.
    pub fn stop(&self, url: &Url) {
        let removed = {
            let mut shims = self.shims.write().unwrap_or_else(|p| p.into_inner());
            shims.remove(&normalize_url(url))
        };
        if let Some(shim) = removed.as_ref().and_then(|slot| slot.get()) {
            shim.close();
        }
    }

    /// Close every running shim.
    pub fn close_all(&self) {
        let drained: Vec<Slot> = {
            let mut shims = self.shims.write().unwrap_or_else(|p| p.into_inner());
            shims.drain().map(|(_, slot)| slot).collect()
        };
        for shim in drained.iter().filter_map(|slot| slot.get()) {
            shim.close();
        }
    }

    /// Number of running shims.
    pub fn len(&self) -> usize {
        let shims = self.shims.read().unwrap_or_else(|p| p.into_inner());
        shims.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Slot {
        {
            let shims = self.shims.read().unwrap_or_else(|p| p.into_inner());
            if let Some(slot) = shims.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut shims = self.shims.write().unwrap_or_else(|p| p.into_inner());
        Arc::clone(shims.entry(key.to_string()).or_default())
    }

    fn is_current(&self, key: &str, slot: &Slot) -> bool {
        let shims = self.shims.read().unwrap_or_else(|p| p.into_inner());
        shims.get(key).is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Drop `slot` after a failed start, unless it was replaced or filled.
    fn discard(&self, key: &str, slot: &Slot) {
        let mut shims = self.shims.write().unwrap_or_else(|p| p.into_inner());
        let stale = shims
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && current.get().is_none());
        if stale {
            shims.remove(key);
        }
    }

    fn resolver_for(&self, upstream: &Upstream) -> Result<IdentityResolver> {
        let resolver = match upstream.kind {
            UpstreamKind::Listing => ListingResolver::new(upstream.url.clone(), upstream.credentials.clone())
                .with_group(self.listing_group.clone())
                .with_timeout(self.settings.proxy_timeout)
                .into(),
            UpstreamKind::Cdn => {
                let target = self.target.clone().ok_or_else(|| {
                    ShimError::UnsupportedPlatform(format!(
                        "{}-{}",
                        std::env::consts::OS,
                        std::env::consts::ARCH
                    ))
                })?;
                StaticResolver::new(self.products.clone(), target, upstream.url.clone())
                    .with_credentials(upstream.credentials.clone())
                    .with_timeout(self.settings.proxy_timeout)
                    .into()
            }
        };
        Ok(resolver)
    }

    fn start(&self, upstream: &Upstream) -> Result<ShimServer> {
        let resolver = self.resolver_for(upstream)?;
        tracing::debug!(upstream = %upstream.url, kind = %upstream.kind, "starting shim");
        ShimServer::start(upstream.key(), resolver, &self.settings, &self.ports)
    }
}

impl Default for ShimManager {
    fn default() -> Self {
        Self::new(ShimSettings::default())
    }
}

impl Drop for ShimManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

impl fmt::Debug for ShimManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShimManager")
            .field("settings", &self.settings)
            .field("running", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ignore_trailing_slash_and_host_case() {
        let a = Upstream::new("https://Plugins.Example.com/repo/", UpstreamKind::Listing).unwrap();
        let b = Upstream::new("https://plugins.example.com/repo", UpstreamKind::Listing).unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), "https://plugins.example.com/repo");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("CDN".parse::<UpstreamKind>().unwrap(), UpstreamKind::Cdn);
        assert_eq!("listing".parse::<UpstreamKind>().unwrap(), UpstreamKind::Listing);
        assert!("maven".parse::<UpstreamKind>().is_err());
    }

    #[test]
    fn upstream_from_toml() {
        let upstream: Upstream = toml::from_str(
            r#"
            url = "https://plugins.example.com/plugins.xml"
            kind = "listing"
            credentials = { type = "header", name = "X-Token", value = "s3cret" }
            "#,
        )
        .unwrap();
        assert_eq!(upstream.kind, UpstreamKind::Listing);
        assert!(upstream.credentials.is_some());
    }

    #[test]
    fn failed_start_leaves_no_slot() {
        let mut manager = ShimManager::default();
        manager.target = None;
        let upstream = Upstream::new("https://download.example.com", UpstreamKind::Cdn).unwrap();
        let err = manager.get(&upstream).unwrap_err();
        assert!(matches!(err, ShimError::UnsupportedPlatform(_)));
        assert!(manager.shims.read().unwrap().is_empty());
    }

    #[test]
    fn stop_unknown_is_a_no_op() {
        let manager = ShimManager::default();
        manager.stop(&Url::parse("https://nowhere.example.com/").unwrap());
        assert!(manager.is_empty());
    }
}
