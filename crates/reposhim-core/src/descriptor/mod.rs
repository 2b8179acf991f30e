//! Synthetic Ivy descriptors.
//!
//! Descriptors are built fresh for every request and serialized to the Ivy
//! XML wire format read by the build tool's metadata parser. The SHA-1 of the
//! serialized body is exposed for the `X-Checksum-Sha1` and `ETag` headers.

mod checksum;
mod model;

pub use checksum::{sha1_etag, sha1_hex};
pub use model::{
    Configuration, Configurations, Dependencies, Dependency, DependencyArtifact, Info, IvyModule,
    Publication, Publications, DEFAULT_CONF, IVY_VERSION,
};

use crate::error::{Result, ShimError};
use serde::Serialize;

/// A serialized descriptor together with its content digest.
#[derive(Debug, Clone)]
pub struct SerializedDescriptor {
    pub body: String,
    pub sha1: String,
}

impl SerializedDescriptor {
    pub fn etag(&self) -> String {
        sha1_etag(&self.sha1)
    }
}

/// Serialize `module` to indented Ivy XML.
pub fn serialize(module: &IvyModule) -> Result<SerializedDescriptor> {
    let mut body = String::new();
    let mut ser = quick_xml::se::Serializer::new(&mut body);
    ser.indent(' ', 2);
    module
        .serialize(ser)
        .map_err(|e| ShimError::Descriptor(e.to_string()))?;
    let sha1 = sha1_hex(body.as_bytes());
    Ok(SerializedDescriptor { body, sha1 })
}

/// Parse an Ivy XML document back into the model.
pub fn parse(xml: &str) -> Result<IvyModule> {
    quick_xml::de::from_str(xml).map_err(|e| ShimError::Descriptor(e.to_string()))
}

#[cfg(test)]
mod tests;
