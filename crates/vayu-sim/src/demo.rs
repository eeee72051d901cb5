//! Built-in demo catalog

use std::path::Path;
use vayu_catalog::{Catalog, CatalogError};

const DEMO_CATALOG: &str = include_str!("../assets/demo_catalog.yaml");

/// Two cities, five zones
///
/// # Errors
/// Only if the bundled YAML is broken
pub fn demo_catalog() -> Result<Catalog, CatalogError> {
    Catalog::from_yaml_str(DEMO_CATALOG)
}

/// Catalog from `path`, or the demo catalog
///
/// # Errors
/// Any [`CatalogError`] from loading
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match path {
        Some(path) => Catalog::load(path),
        None => demo_catalog(),
    }
}
