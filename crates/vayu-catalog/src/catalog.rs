//! City/zone catalog
//!
//! Loaded once and validated:
//! - at least one city, every city has zones
//! - city names and zone ids are unique
//! - each zone names the city it is listed under
//! - zone history is time-ordered

use crate::error::CatalogError;
use crate::zone::{Zone, ZoneId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A city and its zones (display order preserved)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// City name
    pub name: String,
    /// Monitored zones
    pub zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    cities: Vec<City>,
}

/// Validated, immutable reference catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    cities: Vec<City>,
    /// zone id -> (city index, zone index)
    index: IndexMap<ZoneId, (usize, usize)>,
}

impl Catalog {
    /// Build a catalog from cities
    ///
    /// # Errors
    /// Any [`CatalogError`] validation variant
    pub fn new(cities: Vec<City>) -> Result<Self, CatalogError> {
        if cities.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = IndexMap::new();
        let mut seen_cities = std::collections::HashSet::new();

        for (ci, city) in cities.iter().enumerate() {
            if !seen_cities.insert(city.name.as_str()) {
                return Err(CatalogError::DuplicateCity(city.name.clone()));
            }
            if city.zones.is_empty() {
                return Err(CatalogError::EmptyCity(city.name.clone()));
            }
            for (zi, zone) in city.zones.iter().enumerate() {
                if zone.city != city.name {
                    return Err(CatalogError::CityMismatch {
                        zone: zone.id.clone(),
                        declared: zone.city.clone(),
                        parent: city.name.clone(),
                    });
                }
                if !zone.history_is_ordered() {
                    return Err(CatalogError::UnorderedHistory(zone.id.clone()));
                }
                if index.insert(zone.id.clone(), (ci, zi)).is_some() {
                    return Err(CatalogError::DuplicateZone(zone.id.clone()));
                }
            }
        }

        tracing::debug!(
            cities = cities.len(),
            zones = index.len(),
            "catalog validated"
        );
        Ok(Self { cities, index })
    }

    /// Parse from JSON `{ "cities": [...] }`
    ///
    /// # Errors
    /// Syntax or validation errors
    pub fn from_json_str(input: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(input)?;
        Self::new(file.cities)
    }

    /// Parse from YAML with a top-level `cities` list
    ///
    /// # Errors
    /// Syntax or validation errors
    pub fn from_yaml_str(input: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(input)?;
        Self::new(file.cities)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// I/O, unsupported extension, syntax or validation errors
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;
        let catalog = match ext.as_str() {
            "json" => Self::from_json_str(&content)?,
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
        };
        tracing::info!(path = %path.display(), zones = catalog.zone_count(), "catalog loaded");
        Ok(catalog)
    }

    /// All cities in display order
    #[inline]
    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// City by name
    #[must_use]
    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name == name)
    }

    /// Zone by id
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.index
            .get(id)
            .map(|&(ci, zi)| &self.cities[ci].zones[zi])
    }

    /// City containing the zone
    #[must_use]
    pub fn city_of(&self, id: &ZoneId) -> Option<&City> {
        self.index.get(id).map(|&(ci, _)| &self.cities[ci])
    }

    /// Whether a zone belongs to the named city
    #[must_use]
    pub fn zone_in_city(&self, city: &str, id: &ZoneId) -> bool {
        self.city_of(id).is_some_and(|c| c.name == city)
    }

    /// First zone of the first city (the initial selection)
    #[must_use]
    pub fn default_zone(&self) -> &Zone {
        // Non-empty by construction
        &self.cities[0].zones[0]
    }

    /// Every zone in display order
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.index.values().map(|&(ci, zi)| &self.cities[ci].zones[zi])
    }

    /// Number of zones
    #[inline]
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.index.len()
    }
}

impl Serialize for Catalog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Catalog", 1)?;
        s.serialize_field("cities", &self.cities)?;
        s.end()
    }
}
