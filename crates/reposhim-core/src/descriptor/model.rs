//! Ivy module document types.
//!
//! Attribute fields carry the `@` prefix understood by quick-xml's serde
//! support; everything else becomes a child element.

use serde::{Deserialize, Serialize};

pub const IVY_VERSION: &str = "2.0";
pub const DEFAULT_CONF: &str = "default";

/// Root `<ivy-module>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "ivy-module")]
pub struct IvyModule {
    #[serde(rename = "@version")]
    pub version: String,
    pub info: Info,
    #[serde(default)]
    pub configurations: Configurations,
    #[serde(default, skip_serializing_if = "Publications::is_empty")]
    pub publications: Publications,
    #[serde(default, skip_serializing_if = "Dependencies::is_empty")]
    pub dependencies: Dependencies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(rename = "@organisation")]
    pub organisation: String,
    #[serde(rename = "@module")]
    pub module: String,
    #[serde(rename = "@revision")]
    pub revision: String,
    #[serde(
        rename = "@publication",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publication: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configurations {
    #[serde(rename = "conf", default)]
    pub confs: Vec<Configuration>,
}

impl Default for Configurations {
    fn default() -> Self {
        Self {
            confs: vec![Configuration {
                name: DEFAULT_CONF.to_string(),
                visibility: "public".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@visibility")]
    pub visibility: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publications {
    #[serde(rename = "artifact", default)]
    pub artifacts: Vec<Publication>,
}

impl Publications {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// `<publications><artifact .../></publications>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "@ext", default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(rename = "@conf", default, skip_serializing_if = "Option::is_none")]
    pub conf: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(rename = "dependency", default)]
    pub entries: Vec<Dependency>,
}

impl Dependencies {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<dependency org=".." name=".." rev="..">` with nested artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "@org")]
    pub organisation: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@rev")]
    pub version: String,
    #[serde(rename = "artifact", default)]
    pub artifacts: Vec<DependencyArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyArtifact {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(
        rename = "@classifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub classifier: Option<String>,
    #[serde(rename = "@ext")]
    pub extension: String,
}

impl IvyModule {
    fn with_info(organisation: &str, module: &str, revision: &str) -> Self {
        Self {
            version: IVY_VERSION.to_string(),
            info: Info {
                organisation: organisation.to_string(),
                module: module.to_string(),
                revision: revision.to_string(),
                publication: None,
            },
            configurations: Configurations::default(),
            publications: Publications::default(),
            dependencies: Dependencies::default(),
        }
    }

    /// Descriptor that publishes a single artifact of `packaging` type. The
    /// artifact bytes are served by the shim's own download route.
    pub fn direct(organisation: &str, module: &str, revision: &str, packaging: &str) -> Self {
        let mut module = Self::with_info(organisation, module, revision);
        module.publications.artifacts.push(Publication {
            name: None,
            kind: Some(packaging.to_string()),
            ext: Some(packaging.to_string()),
            conf: Some(DEFAULT_CONF.to_string()),
        });
        module
    }

    /// Descriptor that publishes nothing itself and declares one dependency on
    /// the real artifact coordinates.
    pub fn redirecting(
        organisation: &str,
        module: &str,
        revision: &str,
        dependency: Dependency,
    ) -> Self {
        let mut module = Self::with_info(organisation, module, revision);
        module.dependencies.entries.push(dependency);
        module
    }
}
