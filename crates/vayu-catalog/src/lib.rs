//! Vayu Catalog - read-only reference data
//!
//! Cities, their monitored zones, the latest sensor readings of each zone and
//! the AQI health advisory bands shown alongside them.
//!
//! The catalog is loaded once (from JSON or YAML) and validated; it is never
//! mutated for the lifetime of a session.
//!
//! # Example
//!
//! ```rust,ignore
//! use vayu_catalog::{Catalog, ZoneId};
//!
//! let catalog = Catalog::load("catalog.yaml")?;
//! let zone = catalog.zone(&ZoneId::new("pn-02")).unwrap();
//! println!("{} / {}: {}", zone.city, zone.name, zone.advisory().title);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod advisory;
pub mod catalog;
pub mod error;
pub mod zone;

pub use advisory::{advisory_for, AdvisoryColor, HealthAdvisory, HEALTH_ADVISORIES};
pub use catalog::{Catalog, City};
pub use error::CatalogError;
pub use zone::{HistoricalPoint, PollutantMetrics, Zone, ZoneId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
