//! Identity resolution strategies.
//!
//! A shim picks exactly one strategy when it is built:
//! - [`StaticResolver`]: closed product table, redirecting descriptors, CDN
//!   downloads answered with a redirect.
//! - [`ListingResolver`]: remote plugin catalog, direct descriptors, downloads
//!   proxied from the catalog's URL.

mod listing;
pub mod products;
mod static_mapping;

pub use listing::{ListingResolver, DEFAULT_LISTING_GROUP};
pub use products::{Coordinates, Product, ProductTable};
pub use static_mapping::StaticResolver;

use crate::credentials::Credentials;
use crate::descriptor::IvyModule;
use crate::error::Result;
use crate::identity::ArtifactIdentity;
use url::Url;

/// Outcome of a lookup. Never partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(IvyModule),
    NotFound,
}

/// How the download route answers for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// `302 Found` to this URL.
    Redirect(Url),
    /// Stream the bytes of this URL through the shim.
    Proxy(Url),
    NotFound,
}

#[derive(Debug)]
pub enum IdentityResolver {
    Static(StaticResolver),
    Listing(ListingResolver),
}

impl IdentityResolver {
    /// Blocking: may fetch the listing on first use.
    pub fn resolve(&self, identity: &ArtifactIdentity) -> Result<Resolution> {
        match self {
            IdentityResolver::Static(r) => Ok(r.resolve(identity)),
            IdentityResolver::Listing(r) => r.resolve(identity),
        }
    }

    /// Blocking: probes the CDN or consults the listing.
    pub fn download_target(&self, identity: &ArtifactIdentity) -> Result<DownloadTarget> {
        let target = match self {
            IdentityResolver::Static(r) => match r.resolve_download_url(identity)? {
                Some(url) => DownloadTarget::Redirect(url),
                None => DownloadTarget::NotFound,
            },
            IdentityResolver::Listing(r) => match r.resolve_download_url(identity)? {
                Some(url) => DownloadTarget::Proxy(url),
                None => DownloadTarget::NotFound,
            },
        };
        Ok(target)
    }

    /// Credentials attached to outbound requests for this upstream.
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            IdentityResolver::Static(r) => r.credentials(),
            IdentityResolver::Listing(r) => r.credentials(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IdentityResolver::Static(_) => "static",
            IdentityResolver::Listing(_) => "listing",
        }
    }
}

impl From<StaticResolver> for IdentityResolver {
    fn from(r: StaticResolver) -> Self {
        IdentityResolver::Static(r)
    }
}

impl From<ListingResolver> for IdentityResolver {
    fn from(r: ListingResolver) -> Self {
        IdentityResolver::Listing(r)
    }
}
