//! Closed table of platform products and their binary CDN coordinates.

use serde::{Deserialize, Serialize};

/// `(group, artifact)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub group: String,
    pub artifact: String,
}

impl Coordinates {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    fn matches(&self, group: &str, artifact: &str) -> bool {
        self.group == group && self.artifact == artifact
    }
}

/// One product type. Either coordinate set may be missing: some products are
/// only published as binaries, some never as binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    pub dependency: Option<Coordinates>,
    pub binary: Option<Coordinates>,
}

impl Product {
    pub fn new(code: &str, dependency: Option<(&str, &str)>, binary: Option<(&str, &str)>) -> Self {
        Self {
            code: code.to_string(),
            dependency: dependency.map(|(g, a)| Coordinates::new(g, a)),
            binary: binary.map(|(g, a)| Coordinates::new(g, a)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTable {
    products: Vec<Product>,
}

impl ProductTable {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Known IDE product types.
    pub fn builtin() -> Self {
        let p = Product::new;
        Self::new(vec![
            p("AI", Some(("com.google.android.studio", "android-studio")), Some(("com.google.android.studio", "android-studio"))),
            p("QA", None, Some(("aqua", "aqua"))),
            p("CL", Some(("com.jetbrains.intellij.clion", "clion")), Some(("cpp", "CLion"))),
            p("DB", None, Some(("datagrip", "datagrip"))),
            p("DS", None, Some(("python", "dataspell"))),
            p("FLIJ", Some(("com.jetbrains.intellij.fleetBackend", "fleetBackend")), None),
            p("GW", Some(("com.jetbrains.intellij.gateway", "gateway")), Some(("idea/gateway", "JetBrainsGateway"))),
            p("GO", Some(("com.jetbrains.intellij.goland", "goland")), Some(("go", "goland"))),
            p("IC", Some(("com.jetbrains.intellij.idea", "ideaIC")), Some(("idea", "ideaIC"))),
            p("IU", Some(("com.jetbrains.intellij.idea", "ideaIU")), Some(("idea", "ideaIU"))),
            p("PS", Some(("com.jetbrains.intellij.phpstorm", "phpstorm")), Some(("webide", "PhpStorm"))),
            p("PY", Some(("com.jetbrains.intellij.pycharm", "pycharmPY")), Some(("python", "pycharm-professional"))),
            p("PC", Some(("com.jetbrains.intellij.pycharm", "pycharmPC")), Some(("python", "pycharm-community"))),
            p("RD", Some(("com.jetbrains.intellij.rider", "riderRD")), Some(("rider", "JetBrains.Rider"))),
            p("RM", None, Some(("ruby", "RubyMine"))),
            p("RR", Some(("com.jetbrains.intellij.rustrover", "RustRover")), None),
            p("WS", Some(("com.jetbrains.intellij.webstorm", "webstorm")), Some(("webstorm", "WebStorm"))),
            p("WRS", Some(("com.jetbrains.intellij.idea", "writerside")), None),
        ])
    }

    /// Builtin table followed by `extra` rows.
    pub fn with_extra(extra: impl IntoIterator<Item = Product>) -> Self {
        let mut table = Self::builtin();
        table.products.extend(extra);
        table
    }

    /// Product whose dependency or binary coordinates equal `(group, artifact)`.
    pub fn find(&self, group: &str, artifact: &str) -> Option<&Product> {
        self.products.iter().find(|p| {
            p.dependency
                .as_ref()
                .is_some_and(|c| c.matches(group, artifact))
                || p.binary.as_ref().is_some_and(|c| c.matches(group, artifact))
        })
    }

    pub fn by_code(&self, code: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }
}

impl Default for ProductTable {
    fn default() -> Self {
        Self::builtin()
    }
}
