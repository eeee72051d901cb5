//! Display helpers
//!
//! Lookups that miss render a placeholder instead of failing.

use crate::store::AnalysisStore;
use crate::types::{AnalysisId, AnalysisReport};
use chrono::{DateTime, Utc};
use vayu_catalog::{Catalog, ZoneId};

/// Label for an analysis reference that no longer resolves
pub const MISSING_ANALYSIS_LABEL: &str = "Analysis unavailable";

fn squash(name: &str) -> String {
    name.split_whitespace().collect()
}

/// City and zone names, `Unknown` when the zone is not in the catalog
#[must_use]
pub fn location_names(catalog: &Catalog, zone: &ZoneId) -> (String, String) {
    match catalog.zone(zone) {
        Some(z) => (z.city.clone(), z.name.clone()),
        None => ("Unknown".to_string(), "Unknown".to_string()),
    }
}

/// `City_Zone_YYYY_MonDD_hhmmam`, e.g. `Pune_Kothrud_2024_May01_0930am`
#[must_use]
pub fn analysis_title(catalog: &Catalog, report: &AnalysisReport) -> String {
    let (city, zone) = match catalog.zone(&report.zone_id) {
        Some(z) => (squash(&z.city), squash(&z.name)),
        None => ("UnknownCity".to_string(), "UnknownZone".to_string()),
    };
    format!(
        "{city}_{zone}_{}",
        report.timestamp.format("%Y_%b%d_%I%M%P")
    )
}

/// Title of the referenced analysis, or [`MISSING_ANALYSIS_LABEL`]
#[must_use]
pub fn analysis_label(catalog: &Catalog, analyses: &AnalysisStore, id: &AnalysisId) -> String {
    analyses.get(id).map_or_else(
        || MISSING_ANALYSIS_LABEL.to_string(),
        |report| analysis_title(catalog, report),
    )
}

/// Coarse age of `then` at `now`
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 2_592_000 => format!("{}d ago", s / 86_400),
        _ => then.format("%Y-%m-%d").to_string(),
    }
}
