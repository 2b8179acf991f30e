//! Plugin catalog lookups answered with direct descriptors.

use super::Resolution;
use crate::credentials::Credentials;
use crate::descriptor::IvyModule;
use crate::error::Result;
use crate::identity::ArtifactIdentity;
use crate::listing::{ListingEntry, UpstreamListing};
use crate::upstream::{self, RequestOptions, DEFAULT_TIMEOUT};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LISTING_GROUP: &str = "com.jetbrains.plugins";

/// Resolves `{listing_group}/{plugin id}/{version}` against a remote catalog.
///
/// The catalog is fetched on first use and kept for the resolver's lifetime.
/// A failed fetch leaves the cache empty so the next lookup tries again.
#[derive(Debug)]
pub struct ListingResolver {
    source: Url,
    group: String,
    credentials: Option<Credentials>,
    timeout: Duration,
    listing: OnceCell<Arc<UpstreamListing>>,
}

impl ListingResolver {
    pub fn new(source: Url, credentials: Option<Credentials>) -> Self {
        Self {
            source,
            group: DEFAULT_LISTING_GROUP.to_string(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
            listing: OnceCell::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolver over an already parsed catalog; never touches the network.
    pub fn preloaded(listing: UpstreamListing) -> Self {
        let resolver = Self::new(listing.source.clone(), None);
        // Fresh cell, cannot already be set.
        let _ = resolver.listing.set(Arc::new(listing));
        resolver
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn options(&self) -> RequestOptions<'_> {
        RequestOptions {
            credentials: self.credentials.as_ref(),
            timeout: self.timeout,
        }
    }

    /// The cached catalog, fetching it on first call. Blocking.
    pub fn listing(&self) -> Result<Arc<UpstreamListing>> {
        self.listing
            .get_or_try_init(|| UpstreamListing::fetch(&self.source, self.options()).map(Arc::new))
            .cloned()
    }

    fn entry(&self, identity: &ArtifactIdentity) -> Result<Option<ListingEntry>> {
        if identity.group != self.group {
            return Ok(None);
        }
        let listing = self.listing()?;
        Ok(listing.find(&identity.artifact, &identity.version).cloned())
    }

    /// Direct descriptor carrying only the packaging type. The download URL
    /// stays out of the descriptor and is looked up again at download time.
    pub fn resolve(&self, identity: &ArtifactIdentity) -> Result<Resolution> {
        let resolution = match self.entry(identity)? {
            Some(entry) => Resolution::Found(IvyModule::direct(
                &identity.group,
                &identity.artifact,
                &identity.version,
                entry.packaging(),
            )),
            None => Resolution::NotFound,
        };
        Ok(resolution)
    }

    /// Real download URL of the matching entry.
    pub fn resolve_download_url(&self, identity: &ArtifactIdentity) -> Result<Option<Url>> {
        Ok(self.entry(identity)?.map(|e| e.download_url))
    }

    /// Download URL of the matching entry after following one redirect hop.
    pub fn resolve_download_link(&self, identity: &ArtifactIdentity) -> Result<Option<Url>> {
        match self.resolve_download_url(identity)? {
            Some(url) => upstream::resolve_redirection(&url, self.options()).map(Some),
            None => Ok(None),
        }
    }
}
