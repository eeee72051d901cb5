//! Zone reference data

use crate::advisory::{advisory_for, HealthAdvisory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Zone identifier as published in the catalog (e.g. `pn-02`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    /// Create zone id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Pollutant concentrations of the latest reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PollutantMetrics {
    /// Fine particulate matter (µg/m³)
    pub pm25: f64,
    /// Coarse particulate matter (µg/m³)
    pub pm10: f64,
    /// Nitrogen dioxide (ppb)
    pub no2: f64,
    /// Ozone (ppb)
    pub o3: f64,
}

impl PollutantMetrics {
    /// PM10 / PM2.5 ratio; high values point at coarse dust sources
    #[must_use]
    pub fn coarse_ratio(&self) -> Option<f64> {
        (self.pm25 > 0.0).then(|| self.pm10 / self.pm25)
    }
}

/// One (date, AQI) sample of a zone's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Sample time
    pub date: DateTime<Utc>,
    /// Air quality index at that time
    pub aqi: u32,
}

/// A monitored geographic unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Zone identifier
    pub id: ZoneId,
    /// Display name
    pub name: String,
    /// Parent city name
    pub city: String,
    /// Latest AQI
    pub current_aqi: u32,
    /// Latest pollutant readings
    pub metrics: PollutantMetrics,
    /// Time-ordered AQI history
    #[serde(default)]
    pub history: Vec<HistoricalPoint>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl Zone {
    /// Health advisory band for the current AQI
    #[inline]
    #[must_use]
    pub fn advisory(&self) -> &'static HealthAdvisory {
        advisory_for(self.current_aqi)
    }

    /// Change between the last two history points, if there are two
    #[must_use]
    pub fn aqi_trend(&self) -> Option<i64> {
        match self.history.as_slice() {
            [.., prev, last] => Some(i64::from(last.aqi) - i64::from(prev.aqi)),
            _ => None,
        }
    }

    /// Peak AQI over the recorded history
    #[must_use]
    pub fn peak_aqi(&self) -> Option<u32> {
        self.history.iter().map(|p| p.aqi).max()
    }

    pub(crate) fn history_is_ordered(&self) -> bool {
        self.history.windows(2).all(|w| w[0].date <= w[1].date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn zone_with_history(points: &[(u32, u32)]) -> Zone {
        Zone {
            id: ZoneId::new("pn-01"),
            name: "Kothrud".into(),
            city: "Pune".into(),
            current_aqi: 156,
            metrics: PollutantMetrics {
                pm25: 65.0,
                pm10: 140.0,
                no2: 45.0,
                o3: 30.0,
            },
            history: points
                .iter()
                .map(|&(day, aqi)| HistoricalPoint {
                    date: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
                    aqi,
                })
                .collect(),
            description: String::new(),
        }
    }

    #[test]
    fn trend_uses_last_two_points() {
        let zone = zone_with_history(&[(1, 140), (2, 160), (3, 155)]);
        assert_eq!(zone.aqi_trend(), Some(-5));
        assert_eq!(zone.peak_aqi(), Some(160));
    }

    #[test]
    fn trend_needs_two_points() {
        assert_eq!(zone_with_history(&[(1, 140)]).aqi_trend(), None);
    }

    #[test]
    fn history_order_detection() {
        assert!(zone_with_history(&[(1, 1), (2, 2)]).history_is_ordered());
        assert!(!zone_with_history(&[(2, 1), (1, 2)]).history_is_ordered());
    }

    #[test]
    fn coarse_ratio_guards_zero() {
        let mut metrics = PollutantMetrics::default();
        assert_eq!(metrics.coarse_ratio(), None);
        metrics.pm25 = 50.0;
        metrics.pm10 = 100.0;
        assert_eq!(metrics.coarse_ratio(), Some(2.0));
    }

    #[test]
    fn zone_serializes_camel_case() {
        let zone = zone_with_history(&[]);
        let json = serde_json::to_value(&zone).unwrap();
        assert_eq!(json["currentAqi"], 156);
        assert_eq!(json["id"], "pn-01");
    }
}
