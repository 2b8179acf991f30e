//! Product table lookups answered with redirecting descriptors.

use super::products::{Coordinates, ProductTable};
use super::Resolution;
use crate::candidates::{self, Candidate};
use crate::credentials::Credentials;
use crate::descriptor::{Dependency, DependencyArtifact, IvyModule};
use crate::error::{Result, ShimError};
use crate::identity::ArtifactIdentity;
use crate::platform::{Os, Target};
use crate::upstream::{self, RequestOptions, DEFAULT_TIMEOUT};
use std::cell::RefCell;
use std::time::Duration;
use url::Url;

/// Maps product coordinates to binary CDN coordinates for one [`Target`].
#[derive(Debug, Clone)]
pub struct StaticResolver {
    products: ProductTable,
    target: Target,
    cdn: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl StaticResolver {
    pub fn new(products: ProductTable, target: Target, cdn: Url) -> Self {
        Self {
            products,
            target,
            cdn,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Ceiling for each CDN probe.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn binary_for(&self, identity: &ArtifactIdentity) -> Option<&Coordinates> {
        self.products
            .find(&identity.group, &identity.artifact)?
            .binary
            .as_ref()
    }

    /// Redirecting descriptor naming the real binary coordinates, or
    /// `NotFound` for unknown products and products without binaries.
    pub fn resolve(&self, identity: &ArtifactIdentity) -> Resolution {
        let Some(binary) = self.binary_for(identity) else {
            return Resolution::NotFound;
        };
        let extension = self.target.archive_extension();
        let dependency = Dependency {
            organisation: binary.group.clone(),
            name: binary.artifact.clone(),
            version: identity.version.clone(),
            artifacts: vec![DependencyArtifact {
                name: binary.artifact.clone(),
                kind: extension.to_string(),
                classifier: self.target.classifier().map(str::to_string),
                extension: extension.to_string(),
            }],
        };
        Resolution::Found(IvyModule::redirecting(
            &identity.group,
            &identity.artifact,
            &identity.version,
            dependency,
        ))
    }

    /// CDN layouts to probe for `identity`, most specific first. Empty when
    /// the identity has no binary coordinates.
    pub fn download_candidates(&self, identity: &ArtifactIdentity) -> Vec<Url> {
        let Some(binary) = self.binary_for(identity) else {
            return Vec::new();
        };
        let ext = self.target.archive_extension();
        let version = &identity.version;
        let name = &binary.artifact;
        let classifier = match self.target.os {
            Os::Windows => Some("win"),
            _ => self.target.classifier(),
        };

        let mut files = Vec::with_capacity(3);
        if let Some(c) = classifier {
            files.push(format!("{name}-{version}-{c}.{ext}"));
            files.push(format!("{name}-{version}.{c}.{ext}"));
        }
        files.push(format!("{name}-{version}.{ext}"));

        let base = self.cdn.as_str().trim_end_matches('/');
        let flat = files.iter().map(|f| format!("{}/{}/{}", base, binary.group, f));
        let nested = files
            .iter()
            .map(|f| format!("{}/{}/{}/{}", base, binary.group, version, f));
        flat.chain(nested)
            .filter_map(|s| Url::parse(&s).ok())
            .collect()
    }

    /// First CDN candidate that exists. Blocking; one HEAD per candidate.
    ///
    /// When no candidate exists and the CDN rejected the credentials for at
    /// least one of them, the rejection is returned instead of `None`.
    pub fn resolve_download_url(&self, identity: &ArtifactIdentity) -> Result<Option<Url>> {
        let opts = RequestOptions {
            credentials: self.credentials.as_ref(),
            timeout: self.timeout,
        };
        let rejected: RefCell<Option<ShimError>> = RefCell::new(None);
        let list = self.download_candidates(identity).into_iter().map(|url| {
            let rejected = &rejected;
            Candidate::new(url.to_string(), move || {
                match upstream::exists(url.as_str(), opts) {
                    Ok(found) => Ok(found.then_some(url)),
                    Err(e) if e.is_unauthorized() => {
                        tracing::warn!(candidate = %url, "CDN rejected credentials: {}", e);
                        let message = e.to_string();
                        let mut first = rejected.borrow_mut();
                        if first.is_none() {
                            *first = Some(e);
                        }
                        Err(anyhow::anyhow!(message))
                    }
                    Err(e) => Err(e.into()),
                }
            })
        });
        match candidates::first_match(list) {
            Some((_, url)) => Ok(Some(url)),
            None => match rejected.into_inner() {
                Some(e) => Err(e),
                None => Ok(None),
            },
        }
    }
}
