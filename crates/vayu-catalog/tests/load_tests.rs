//! Catalog file loading tests

use pretty_assertions::assert_eq;
use std::io::Write;
use vayu_catalog::{AdvisoryColor, Catalog, CatalogError, ZoneId};

const YAML: &str = r#"
cities:
  - name: Pune
    zones:
      - id: pn-01
        name: Kothrud
        city: Pune
        currentAqi: 156
        metrics: { pm25: 65, pm10: 140, no2: 45, o3: 30 }
        history:
          - { date: "2024-03-01T00:00:00Z", aqi: 140 }
          - { date: "2024-03-02T00:00:00Z", aqi: 156 }
        description: Residential and educational hub.
      - id: pn-02
        name: Baner
        city: Pune
        currentAqi: 210
        metrics: { pm25: 85, pm10: 190, no2: 55, o3: 35 }
  - name: Delhi
    zones:
      - id: dl-01
        name: Anand Vihar
        city: Delhi
        currentAqi: 380
        metrics: { pm25: 220, pm10: 410, no2: 90, o3: 40 }
"#;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_yaml_catalog() {
    let file = write_temp(".yaml", YAML);
    let catalog = Catalog::load(file.path()).unwrap();

    assert_eq!(catalog.cities().len(), 2);
    let baner = catalog.zone(&ZoneId::new("pn-02")).unwrap();
    assert_eq!(baner.name, "Baner");
    assert_eq!(baner.advisory().color, AdvisoryColor::Red);
    assert!(baner.history.is_empty());

    let kothrud = catalog.zone(&ZoneId::new("pn-01")).unwrap();
    assert_eq!(kothrud.aqi_trend(), Some(16));
}

#[test]
fn json_roundtrip_preserves_catalog() {
    let catalog = Catalog::from_yaml_str(YAML).unwrap();
    let json = serde_json::to_string(&catalog).unwrap();
    let file = write_temp(".json", &json);
    let reloaded = Catalog::load(file.path()).unwrap();
    assert_eq!(reloaded, catalog);
}

#[test]
fn rejects_unknown_extension() {
    let file = write_temp(".csv", YAML);
    let err = Catalog::load(file.path()).unwrap_err();
    assert!(matches!(err, CatalogError::UnsupportedFormat(ext) if ext == "csv"));
}

#[test]
fn rejects_unordered_history() {
    let yaml = YAML.replace("2024-03-01T00:00:00Z", "2024-03-05T00:00:00Z");
    let err = Catalog::from_yaml_str(&yaml).unwrap_err();
    assert!(matches!(err, CatalogError::UnorderedHistory(id) if id.as_str() == "pn-01"));
    assert!(Catalog::from_yaml_str("cities: [").is_err());
}
