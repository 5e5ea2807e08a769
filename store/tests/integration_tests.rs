use std::path::Path;

use definition_compiler::{Compiler, DefaultCallback};
use definition_core::{Definition, DefinitionPackage, DisplayType, Field, Region};
use definition_store::{
    CompileConfig, DefinitionSet, DocumentFormat, compute_bundle_hash, save_package,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_definition(dir: &Path, definition: &Definition, format: DocumentFormat) {
    let ext = match format {
        DocumentFormat::Json => "json",
        DocumentFormat::Yaml => "yaml",
    };
    let path = dir.join(format!("{}.{ext}", definition.identifier));
    definition_store::write_document(definition, path, format).unwrap();
}

fn sample_definitions() -> Vec<Definition> {
    vec![
        Definition::new("base")
            .with_field(Field::new("title").with_type("an..180"))
            .with_region(Region::new("audit").with_display_type(DisplayType::System)),
        Definition::new("case")
            .with_parent("base")
            .with_field(Field::new("caseNumber").with_type("n..10")),
        Definition::new("draft").with_parent("case"),
    ]
}

// ---------------------------------------------------------------------------
// Load, compile, write
// ---------------------------------------------------------------------------

#[test]
fn test_directory_compile_and_bundle_roundtrip() {
    let dir = TempDir::new().unwrap();
    let defs_dir = dir.path().join("definitions");
    std::fs::create_dir_all(&defs_dir).unwrap();

    let mut defs = sample_definitions().into_iter();
    write_definition(&defs_dir, &defs.next().unwrap(), DocumentFormat::Yaml);
    for def in defs {
        write_definition(&defs_dir, &def, DocumentFormat::Json);
    }

    let config: CompileConfig =
        serde_yaml::from_str("version: \"1.0\"\nexclude: [draft]\n").unwrap();

    let mut set = DefinitionSet::from_dir(&defs_dir).unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(set.exclude(&config.exclude), 1);

    let compiled = Compiler::new(DefaultCallback)
        .with_options(config.compiler_options())
        .compile(set.into_definitions())
        .unwrap();

    let mut package = DefinitionPackage::new("1.0.0", "2026-01-01T00:00:00Z");
    package.definitions = compiled.definitions;
    package.bundle_hash = Some(compute_bundle_hash(&package).unwrap());

    let bundle = dir.path().join("compiled.json");
    save_package(&package, &bundle, DocumentFormat::Json).unwrap();

    let reloaded = DefinitionSet::from_bundle(&bundle).unwrap();
    assert_eq!(
        reloaded.identifiers().collect::<Vec<_>>(),
        vec!["base", "case"]
    );
    let case = reloaded.get("case").unwrap();
    assert!(case.find_field("title").is_some());
    assert!(case.find_region("audit").is_none());

    let mut check = DefinitionPackage::new("1.0.0", "2030-01-01T00:00:00Z");
    check.definitions = reloaded.into_definitions();
    assert_eq!(
        compute_bundle_hash(&check).unwrap(),
        package.bundle_hash.unwrap()
    );
}

#[test]
fn test_yaml_bundle_via_builder() {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("bundle.yml");

    let mut package = DefinitionPackage::new("1.0.0", "2026-01-01T00:00:00Z");
    package.definitions = sample_definitions();
    save_package(&package, &bundle, DocumentFormat::Yaml).unwrap();

    let set = DefinitionSet::builder()
        .from_dir(dir.path().join("does-not-exist"))
        .from_bundle(&bundle)
        .build()
        .unwrap();
    assert_eq!(set.definitions(), package.definitions.as_slice());
}
