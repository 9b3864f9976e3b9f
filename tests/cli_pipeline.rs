//! Drives the `compile` and `translate` subcommands end to end through
//! their public `run_*` entry points, writing real files to a temp
//! directory the way the binary would.

use std::fs;
use std::path::PathBuf;

use niem_translate::cli::{run_compile, run_translate, CompileArgs, TranslateArgs};

const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:j="http://example.com/jxdm/1.0/"
           targetNamespace="http://example.com/jxdm/1.0/"
           elementFormDefault="qualified"
           xmlns:ct="http://release.niem.gov/niem/conformanceTargets/3.0/"
           ct:conformanceTargets="http://reference.niem.gov/niem/specification/naming-and-design-rules/4.0/#ReferenceSchema">
  <xs:element name="ChargeDescriptionText" type="xs:string"/>
</xs:schema>"#;

#[test]
fn test_compile_then_translate_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let schema_path = dir.path().join("main.xsd");
    fs::write(&schema_path, SCHEMA).unwrap();

    let model_path = dir.path().join("model.no");
    let compile_args = CompileArgs {
        separator: ',',
        outfile: Some(model_path.clone()),
        quiet: true,
        positionals: vec![schema_path.to_string_lossy().to_string()],
    };
    let exit = run_compile(&compile_args);
    assert_eq!(exit, 0);
    assert!(model_path.exists());

    let instance_path = dir.path().join("instance.xml");
    fs::write(
        &instance_path,
        r#"<j:ChargeDescriptionText xmlns:j="http://example.com/jxdm/1.0/">Theft</j:ChargeDescriptionText>"#,
    )
    .unwrap();

    let output_path = dir.path().join("out.json");
    let translate_args = TranslateArgs {
        outfile: Some(output_path.clone()),
        x2j: true,
        model_file: model_path,
        instance_file: instance_path,
    };
    let exit = run_translate(&translate_args);
    assert_eq!(exit, 0);

    let rendered = fs::read_to_string(&output_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["rdf:value"], "Theft");
    assert!(json["@context"]["j"].as_str().unwrap().starts_with("http://example.com/jxdm/1.0/"));
}

/// An instance document using a namespace the model never saw returns exit
/// code 1 (a non-fatal "extended" result) and the output still carries a
/// usable `@context` entry for it.
#[test]
fn test_translate_unmodeled_namespace_exits_nonzero() {
    let dir = tempfile::TempDir::new().unwrap();
    let schema_path = dir.path().join("main.xsd");
    fs::write(&schema_path, SCHEMA).unwrap();

    let model_path = dir.path().join("model.no");
    let compile_args = CompileArgs {
        separator: ',',
        outfile: Some(model_path.clone()),
        quiet: true,
        positionals: vec![schema_path.to_string_lossy().to_string()],
    };
    assert_eq!(run_compile(&compile_args), 0);

    let instance_path = dir.path().join("instance.xml");
    fs::write(
        &instance_path,
        r#"<ex:Thing xmlns:ex="urn:unmodeled">hello</ex:Thing>"#,
    )
    .unwrap();

    let output_path = dir.path().join("out.json");
    let translate_args = TranslateArgs {
        outfile: Some(output_path.clone()),
        x2j: true,
        model_file: model_path,
        instance_file: instance_path,
    };
    assert_eq!(run_translate(&translate_args), 1);

    let rendered = fs::read_to_string(&output_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["@context"]["ex"], "urn:unmodeled#");
}

#[test]
fn test_compile_with_no_schema_arguments_errors() {
    let compile_args = CompileArgs {
        separator: ',',
        outfile: None,
        quiet: true,
        positionals: vec![],
    };
    assert_eq!(run_compile(&compile_args), 2);
}

#[test]
fn test_translate_missing_model_file_errors() {
    let translate_args = TranslateArgs {
        outfile: None,
        x2j: true,
        model_file: PathBuf::from("/nonexistent/model.no"),
        instance_file: PathBuf::from("/nonexistent/instance.xml"),
    };
    assert_eq!(run_translate(&translate_args), 2);
}
