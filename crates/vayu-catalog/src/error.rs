//! Error types for catalog loading and validation

use crate::zone::ZoneId;

/// Catalog error type
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog contains no cities
    #[error("catalog has no cities")]
    Empty,

    /// A city without zones
    #[error("city {0} has no zones")]
    EmptyCity(String),

    /// Two cities share a name
    #[error("duplicate city: {0}")]
    DuplicateCity(String),

    /// Two zones share an id
    #[error("duplicate zone id: {0}")]
    DuplicateZone(ZoneId),

    /// Zone lists a different city than the one containing it
    #[error("zone {zone} declares city {declared} but is listed under {parent}")]
    CityMismatch {
        /// Offending zone
        zone: ZoneId,
        /// City named on the zone itself
        declared: String,
        /// City the zone is listed under
        parent: String,
    },

    /// History points are not in ascending date order
    #[error("zone {0} history is not time-ordered")]
    UnorderedHistory(ZoneId),

    /// File extension is not json/yaml/yml
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    /// Reading the catalog file failed
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CatalogError {
    /// Whether the error comes from the catalog content rather than I/O or syntax
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) | Self::UnsupportedFormat(_)
        )
    }
}
