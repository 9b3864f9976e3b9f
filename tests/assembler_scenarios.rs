//! End-to-end assembler scenarios driven through real catalog files on disk.
//!
//! Scenario 1 (duplicate namespace import) is already covered by a unit
//! test in `src/assembler/mod.rs`; these cover the other two warning
//! classes that only show up once a catalog is actually wired in.

use std::fs;
use std::path::{Path, PathBuf};

use niem_translate::assembler::Assembler;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// An `xs:include` into a namespace that also has its own catalog entry is
/// suspicious (includes are supposed to stay within one un-cataloged
/// namespace) and should be flagged, not silently accepted.
#[test]
fn test_include_in_cataloged_namespace_warns() {
    let dir = tempfile::TempDir::new().unwrap();

    write(
        dir.path(),
        "shared.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:ex" elementFormDefault="qualified">
  <xs:element name="Shared" type="xs:string"/>
</xs:schema>"#,
    );
    let main = write(
        dir.path(),
        "main.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:ex" elementFormDefault="qualified">
  <xs:include schemaLocation="shared.xsd"/>
  <xs:element name="Main" type="xs:string"/>
</xs:schema>"#,
    );
    let catalog = write(
        dir.path(),
        "catalog.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <uri name="urn:ex" uri="main.xsd"/>
</catalog>"#,
    );

    let mut assembler = Assembler::new();
    assembler
        .assemble(&[catalog], &[main.to_string_lossy().to_string()])
        .unwrap();

    assert!(assembler.has_warnings());
    assert!(assembler
        .assembly_warning_messages()
        .iter()
        .any(|m| m.contains("found in a namespace that has a catalog entry")));
}

/// When a catalog's namespace mapping and an `xs:import`'s `schemaLocation`
/// disagree on which file to load, both get loaded and the disagreement is
/// reported rather than picking one silently.
#[test]
fn test_namespace_and_schema_location_mismatch_warns() {
    let dir = tempfile::TempDir::new().unwrap();

    write(
        dir.path(),
        "cataloged.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:shared" elementFormDefault="qualified">
  <xs:element name="FromCatalog" type="xs:string"/>
</xs:schema>"#,
    );
    write(
        dir.path(),
        "declared.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:shared" elementFormDefault="qualified">
  <xs:element name="FromSchemaLocation" type="xs:string"/>
</xs:schema>"#,
    );
    let main = write(
        dir.path(),
        "main.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:ex" elementFormDefault="qualified">
  <xs:import namespace="urn:shared" schemaLocation="declared.xsd"/>
</xs:schema>"#,
    );
    let catalog = write(
        dir.path(),
        "catalog.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
    <uri name="urn:shared" uri="cataloged.xsd"/>
</catalog>"#,
    );

    let mut assembler = Assembler::new();
    let model = assembler
        .assemble(&[catalog], &[main.to_string_lossy().to_string()])
        .unwrap();

    assert!(assembler.has_warnings());
    assert!(assembler
        .assembly_warning_messages()
        .iter()
        .any(|m| m.contains("resolved namespace != resolved schemaLocation")));

    // Both candidate documents get loaded, so both declarations survive.
    assert!(model
        .elements
        .contains_key(&niem_translate::namespaces::QName::namespaced("urn:shared", "FromCatalog")));
    assert!(model
        .elements
        .contains_key(&niem_translate::namespaces::QName::namespaced("urn:shared", "FromSchemaLocation")));
}
