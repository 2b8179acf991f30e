//! Artifact identity and the two fixed shim path templates.
//!
//! ```text
//! /{group}/{artifact}/{version}/descriptor.ivy
//! /{group}/{artifact}/{version}/download
//! ```

use std::fmt;

pub const DESCRIPTOR_SUFFIX: &str = "descriptor.ivy";
pub const DOWNLOAD_SUFFIX: &str = "download";

/// `(group, artifact, version)` lookup key taken verbatim from a request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactIdentity {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl ArtifactIdentity {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Which of the two logical routes a request path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Descriptor(ArtifactIdentity),
    Download(ArtifactIdentity),
}

impl Route {
    /// Match a request path against the two templates.
    ///
    /// Exactly four non-empty segments are required; anything else is `None`
    /// and answered with 404 by the server.
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let [group, artifact, version, marker] = segments.as_slice() else {
            return None;
        };
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return None;
        }
        let identity = ArtifactIdentity::new(*group, *artifact, *version);
        match *marker {
            DESCRIPTOR_SUFFIX => Some(Route::Descriptor(identity)),
            DOWNLOAD_SUFFIX => Some(Route::Download(identity)),
            _ => None,
        }
    }

    pub fn identity(&self) -> &ArtifactIdentity {
        match self {
            Route::Descriptor(id) | Route::Download(id) => id,
        }
    }
}

/// Path of the descriptor route for `identity`, relative to a shim base URL.
pub fn descriptor_path(identity: &ArtifactIdentity) -> String {
    format!(
        "/{}/{}/{}/{}",
        identity.group, identity.artifact, identity.version, DESCRIPTOR_SUFFIX
    )
}

/// Path of the download route for `identity`, relative to a shim base URL.
pub fn download_path(identity: &ArtifactIdentity) -> String {
    format!(
        "/{}/{}/{}/{}",
        identity.group, identity.artifact, identity.version, DOWNLOAD_SUFFIX
    )
}
