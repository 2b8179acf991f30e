//! Remote plugin catalogs.
//!
//! A listing is fetched with the upstream's credentials, parsed, and then only
//! ever read. Refreshing requires a new shim (and in practice a new process).

mod parse;

pub use parse::ListingFormat;

use crate::error::{Result, ShimError};
use crate::upstream::{self, RequestOptions};
use serde::Serialize;
use url::Url;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub id: String,
    pub version: String,
    pub download_url: Url,
}

impl ListingEntry {
    /// Packaging type derived from the download file name.
    pub fn packaging(&self) -> &'static str {
        let is_jar = self
            .download_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|name| name.to_ascii_lowercase().ends_with(".jar"))
            .unwrap_or(false);
        if is_jar {
            "jar"
        } else {
            "zip"
        }
    }
}

/// Parsed snapshot of a remote catalog.
#[derive(Debug, Clone)]
pub struct UpstreamListing {
    pub source: Url,
    pub format: ListingFormat,
    pub entries: Vec<ListingEntry>,
}

impl UpstreamListing {
    /// Parse a catalog document fetched from `source`.
    pub fn parse(xml: &str, source: &Url) -> Result<Self> {
        let format = ListingFormat::detect(xml).ok_or_else(|| ShimError::ListingParse {
            url: source.to_string(),
            reason: "unrecognised root element".to_string(),
        })?;
        let entries = parse::parse_entries(xml, format, source).map_err(|reason| {
            ShimError::ListingParse {
                url: source.to_string(),
                reason,
            }
        })?;
        Ok(Self {
            source: source.clone(),
            format,
            entries,
        })
    }

    /// Fetch and parse the catalog at `source`. Blocking.
    pub fn fetch(source: &Url, opts: RequestOptions<'_>) -> Result<Self> {
        let xml = upstream::fetch_text(source.as_str(), opts)?;
        let listing = Self::parse(&xml, source)?;
        tracing::info!(
            url = %source,
            entries = listing.entries.len(),
            "loaded plugin listing"
        );
        Ok(listing)
    }

    /// Exact `(id, version)` match.
    pub fn find(&self, id: &str, version: &str) -> Option<&ListingEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id && e.version == version)
    }
}
