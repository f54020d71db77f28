//! Tests for loading overlay catalogs from files and the environment.

use std::io::Write;

use overlay_common::catalog::CATALOG_ENV;
use overlay_common::{ColorScale, OverlayCatalog, OverlayError, Rgba};

const SMALL_CATALOG: &str = r##"
draw_order: [temperature]
overlays:
  - id: temperature
    title: Temperature
    units: C
    min_value: -40
    max_value: 40
    gradient:
      stops:
        - { value: -40, color: "#9013FE" }
        - { value: 0, color: [0, 255, 255] }
        - { value: 40, color: { r: 255, g: 0, b: 0, a: 255 } }
      out_of_range: transparent
"##;

fn write_catalog(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// File loading tests
// ============================================================================

#[test]
fn test_from_file_parses_all_color_forms() {
    let file = write_catalog(SMALL_CATALOG);
    let catalog = OverlayCatalog::from_file(file.path()).unwrap();

    let temperature = catalog.require("temperature").unwrap();
    assert_eq!(temperature.opacity, 1.0);
    assert_eq!(temperature.units.as_deref(), Some("C"));

    let scale = temperature.color_scale().unwrap();
    assert_eq!(scale.sample(-40.0), Rgba::opaque(0x90, 0x13, 0xFE));
    assert_eq!(scale.sample(0.0), Rgba::opaque(0, 255, 255));
    assert_eq!(scale.sample(40.0), Rgba::opaque(255, 0, 0));
    assert_eq!(scale.sample(41.0), Rgba::TRANSPARENT);
}

#[test]
fn test_from_file_missing_is_config_error() {
    let err = OverlayCatalog::from_file("/nonexistent/overlays.yaml").unwrap_err();
    assert!(matches!(err, OverlayError::ConfigError(_)));
}

#[test]
fn test_from_yaml_rejects_duplicates() {
    let yaml = r##"
overlays:
  - id: a
    title: A
    min_value: 0
    max_value: 1
    gradient: { stops: [{ value: 0, color: black }, { value: 1, color: white }] }
  - id: a
    title: A again
    min_value: 0
    max_value: 1
    gradient: { stops: [{ value: 0, color: black }, { value: 1, color: white }] }
"##;
    let err = OverlayCatalog::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_from_yaml_rejects_bad_opacity() {
    let yaml = r##"
overlays:
  - id: a
    title: A
    min_value: 0
    max_value: 1
    opacity: 1.5
    gradient: { stops: [{ value: 0, color: black }, { value: 1, color: white }] }
"##;
    assert!(OverlayCatalog::from_yaml(yaml).is_err());
}

// ============================================================================
// Environment selection tests
// ============================================================================

#[test]
fn test_from_env_prefers_named_file() {
    let file = write_catalog(SMALL_CATALOG);

    std::env::set_var(CATALOG_ENV, file.path());
    let from_file = OverlayCatalog::from_env();
    std::env::remove_var(CATALOG_ENV);
    let builtin = OverlayCatalog::from_env().unwrap();

    assert!(from_file.unwrap().get("temperature").is_some());
    assert!(builtin.get("temperature").is_none());
    assert!(builtin.get("radar").is_some());
}
