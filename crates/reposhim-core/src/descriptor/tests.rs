use super::*;

fn binary_dependency(classifier: Option<&str>) -> Dependency {
    Dependency {
        organisation: "idea".to_string(),
        name: "ideaIC".to_string(),
        version: "2024.1".to_string(),
        artifacts: vec![DependencyArtifact {
            name: "ideaIC".to_string(),
            kind: "tar.gz".to_string(),
            classifier: classifier.map(str::to_string),
            extension: "tar.gz".to_string(),
        }],
    }
}

#[test]
fn direct_descriptor_wire_shape() {
    let module = IvyModule::direct("com.jetbrains.plugins", "org.example.foo", "1.0.0", "zip");
    let out = serialize(&module).unwrap();

    assert!(out.body.starts_with("<ivy-module version=\"2.0\">"));
    assert!(out.body.contains(
        "<info organisation=\"com.jetbrains.plugins\" module=\"org.example.foo\" revision=\"1.0.0\"/>"
    ));
    assert!(out.body.contains("<conf name=\"default\" visibility=\"public\"/>"));
    assert!(out.body.contains("<artifact type=\"zip\" ext=\"zip\" conf=\"default\"/>"));
    assert!(!out.body.contains("<dependencies"));
}

#[test]
fn redirecting_descriptor_wire_shape() {
    let module = IvyModule::redirecting(
        "com.jetbrains.intellij.idea",
        "ideaIC",
        "2024.1",
        binary_dependency(None),
    );
    let out = serialize(&module).unwrap();

    assert!(out.body.contains("<dependency org=\"idea\" name=\"ideaIC\" rev=\"2024.1\">"));
    assert!(out.body.contains("<artifact name=\"ideaIC\" type=\"tar.gz\" ext=\"tar.gz\"/>"));
    assert!(!out.body.contains("classifier"));
    assert!(!out.body.contains("<publications"));
}

#[test]
fn classifier_is_an_attribute_when_present() {
    let module = IvyModule::redirecting("g", "a", "1", binary_dependency(Some("aarch64")));
    let out = serialize(&module).unwrap();
    assert!(out.body.contains("classifier=\"aarch64\""));
}

#[test]
fn serialized_descriptor_parses_back() {
    let module = IvyModule::redirecting(
        "com.example.ide",
        "mytool",
        "2024.1",
        binary_dependency(Some("aarch64")),
    );
    let out = serialize(&module).unwrap();
    let parsed = parse(&out.body).unwrap();

    assert_eq!(parsed.info.organisation, "com.example.ide");
    assert_eq!(parsed.info.module, "mytool");
    assert_eq!(parsed.info.revision, "2024.1");
    assert_eq!(parsed.dependencies, module.dependencies);
    assert_eq!(parsed, module);
}

#[test]
fn digest_matches_body_and_is_stable() {
    let module = IvyModule::direct("g", "a", "1", "jar");
    let first = serialize(&module).unwrap();
    let second = serialize(&module).unwrap();
    assert_eq!(first.sha1, sha1_hex(first.body.as_bytes()));
    assert_eq!(first.sha1, second.sha1);
    assert_eq!(first.etag(), format!("{{SHA1{{{}}}}}", first.sha1));
}

#[test]
fn parse_foreign_descriptor_with_many_entries() {
    let xml = r#"
        <ivy-module version="2.0">
          <info organisation="bundledPlugin" module="org.jetbrains.kotlin" revision="IU-253.28294.334" />
          <configurations>
            <conf name="default" visibility="public" />
          </configurations>
          <publications>
            <artifact name="kotlin-base-jps" ext="jar" conf="default" />
            <artifact name="vavr" ext="jar" conf="default" />
          </publications>
          <dependencies>
            <dependency org="bundledModule" name="intellij.platform.ml.impl" rev="IU-253.28294.334" />
            <dependency org="bundledPlugin" name="com.intellij.java" rev="IU-253.28294.334" />
          </dependencies>
        </ivy-module>
    "#;
    let module = parse(xml).unwrap();
    assert_eq!(module.info.organisation, "bundledPlugin");
    assert_eq!(module.publications.artifacts.len(), 2);
    assert_eq!(module.dependencies.entries.len(), 2);
    assert!(module.dependencies.entries[0].artifacts.is_empty());
}
