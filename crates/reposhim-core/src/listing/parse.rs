//! Catalog document shapes.
//!
//! Simple (`updatePlugins.xml`):
//! ```xml
//! <plugins>
//!   <plugin id="org.example.foo" url="foo-1.0.zip" version="1.0"/>
//! </plugins>
//! ```
//!
//! Plugin repository:
//! ```xml
//! <plugin-repository>
//!   <category name="Tools">
//!     <idea-plugin>
//!       <id>org.example.foo</id>
//!       <version>1.0</version>
//!       <download-url>foo-1.0.zip</download-url>
//!     </idea-plugin>
//!   </category>
//! </plugin-repository>
//! ```

use quick_xml::events::Event;
use serde::Deserialize;
use url::Url;

use super::ListingEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    Simple,
    PluginRepository,
}

impl ListingFormat {
    /// Pick the format from the document's root element.
    pub fn detect(xml: &str) -> Option<Self> {
        match root_element(xml)?.as_str() {
            "plugins" => Some(ListingFormat::Simple),
            "plugin-repository" => Some(ListingFormat::PluginRepository),
            _ => None,
        }
    }
}

fn root_element(xml: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimplePlugins {
    #[serde(rename = "plugin", default)]
    plugins: Vec<SimplePlugin>,
}

#[derive(Debug, Deserialize)]
struct SimplePlugin {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@url")]
    url: String,
    #[serde(rename = "@version")]
    version: String,
}

#[derive(Debug, Deserialize)]
struct PluginRepository {
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
    #[serde(rename = "idea-plugin", default)]
    plugins: Vec<IdeaPlugin>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "idea-plugin", default)]
    plugins: Vec<IdeaPlugin>,
}

#[derive(Debug, Deserialize)]
struct IdeaPlugin {
    id: String,
    version: String,
    #[serde(rename = "download-url")]
    download_url: String,
}

/// Parse `xml` in `format`, resolving relative download URLs against `base`.
pub(crate) fn parse_entries(
    xml: &str,
    format: ListingFormat,
    base: &Url,
) -> Result<Vec<ListingEntry>, String> {
    let raw: Vec<(String, String, String)> = match format {
        ListingFormat::Simple => {
            let doc: SimplePlugins = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
            doc.plugins
                .into_iter()
                .map(|p| (p.id, p.version, p.url))
                .collect()
        }
        ListingFormat::PluginRepository => {
            let doc: PluginRepository =
                quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
            doc.categories
                .into_iter()
                .flat_map(|c| c.plugins)
                .chain(doc.plugins)
                .map(|p| (p.id, p.version, p.download_url))
                .collect()
        }
    };

    raw.into_iter()
        .map(|(id, version, url)| {
            let download_url = base
                .join(url.trim())
                .map_err(|e| format!("bad download URL '{}' for {}: {}", url, id, e))?;
            Ok(ListingEntry {
                id: id.trim().to_string(),
                version: version.trim().to_string(),
                download_url,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://plugins.example.com/repo/updatePlugins.xml").unwrap()
    }

    #[test]
    fn detect_by_root_element() {
        assert_eq!(
            ListingFormat::detect("<?xml version=\"1.0\"?>\n<plugins/>"),
            Some(ListingFormat::Simple)
        );
        assert_eq!(
            ListingFormat::detect("<!-- c --><plugin-repository></plugin-repository>"),
            Some(ListingFormat::PluginRepository)
        );
        assert_eq!(ListingFormat::detect("<html></html>"), None);
        assert_eq!(ListingFormat::detect("not xml at all"), None);
    }

    #[test]
    fn simple_listing_resolves_relative_urls() {
        let xml = r#"
            <plugins>
              <plugin id="org.example.foo" url="foo-1.0.zip" version="1.0">
                <idea-version since-build="231"/>
                <name>Foo</name>
              </plugin>
              <plugin id="org.example.bar" url="https://cdn.example.com/bar.jar" version="2.1"/>
            </plugins>
        "#;
        let entries = parse_entries(xml, ListingFormat::Simple, &base()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "org.example.foo");
        assert_eq!(
            entries[0].download_url.as_str(),
            "https://plugins.example.com/repo/foo-1.0.zip"
        );
        assert_eq!(entries[1].download_url.as_str(), "https://cdn.example.com/bar.jar");
    }

    #[test]
    fn plugin_repository_listing_flattens_categories() {
        let xml = r#"
            <plugin-repository>
              <ff>"Tools"</ff>
              <category name="Tools">
                <idea-plugin downloads="1" size="10">
                  <name>Foo</name>
                  <id>org.example.foo</id>
                  <description><![CDATA[<p>Foo</p>]]></description>
                  <version>1.0</version>
                  <download-url>/files/foo-1.0.zip</download-url>
                </idea-plugin>
              </category>
              <category name="Misc">
                <idea-plugin>
                  <id>org.example.baz</id>
                  <version>3.0</version>
                  <download-url>baz.zip</download-url>
                </idea-plugin>
              </category>
            </plugin-repository>
        "#;
        let entries = parse_entries(xml, ListingFormat::PluginRepository, &base()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].version, "1.0");
        assert_eq!(
            entries[0].download_url.as_str(),
            "https://plugins.example.com/files/foo-1.0.zip"
        );
        assert_eq!(entries[1].id, "org.example.baz");
    }

    #[test]
    fn missing_required_attribute_is_an_error() {
        let xml = r#"<plugins><plugin id="x" version="1"/></plugins>"#;
        assert!(parse_entries(xml, ListingFormat::Simple, &base()).is_err());
    }
}
