//! AQI health advisory bands

use serde::Serialize;

/// Display colour of an advisory band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryColor {
    /// 0-50
    Green,
    /// 51-100
    Yellow,
    /// 101-200
    Orange,
    /// 201-300
    Red,
    /// 301+
    Purple,
}

/// Public health guidance for an AQI range (inclusive bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthAdvisory {
    /// Lowest AQI of the band
    pub min_aqi: u32,
    /// Highest AQI of the band
    pub max_aqi: u32,
    /// Headline
    pub title: &'static str,
    /// Who is affected and how
    pub advice: &'static str,
    /// What to do
    pub action: &'static str,
    /// Display colour
    pub color: AdvisoryColor,
}

impl HealthAdvisory {
    /// Whether the AQI falls in this band
    #[inline]
    #[must_use]
    pub fn contains(&self, aqi: u32) -> bool {
        (self.min_aqi..=self.max_aqi).contains(&aqi)
    }
}

/// Advisory bands in ascending AQI order
pub const HEALTH_ADVISORIES: [HealthAdvisory; 5] = [
    HealthAdvisory {
        min_aqi: 0,
        max_aqi: 50,
        title: "Air Quality is Good",
        advice: "Air quality is satisfactory, and air pollution poses little or no risk.",
        action: "Enjoy outdoor activities and ventilate your home.",
        color: AdvisoryColor::Green,
    },
    HealthAdvisory {
        min_aqi: 51,
        max_aqi: 100,
        title: "Moderate Air Quality",
        advice: "Air quality is acceptable. However, there may be a risk for some people.",
        action: "Sensitive individuals should limit prolonged outdoor exertion.",
        color: AdvisoryColor::Yellow,
    },
    HealthAdvisory {
        min_aqi: 101,
        max_aqi: 200,
        title: "Unhealthy for Sensitive Groups",
        advice: "Members of sensitive groups may experience health effects. The general public is less likely to be affected.",
        action: "Wear a mask if you have respiratory issues. Limit outdoor time.",
        color: AdvisoryColor::Orange,
    },
    HealthAdvisory {
        min_aqi: 201,
        max_aqi: 300,
        title: "Very Unhealthy",
        advice: "Health alert: The risk of health effects is increased for everyone.",
        action: "Wear an N95 mask if outside for more than an hour. Avoid outdoor exercise.",
        color: AdvisoryColor::Red,
    },
    HealthAdvisory {
        min_aqi: 301,
        max_aqi: 1000,
        title: "Hazardous",
        advice: "Health warning of emergency conditions. The entire population is more likely to be affected.",
        action: "Stay indoors. Run air purifiers on high. Seal windows and doors.",
        color: AdvisoryColor::Purple,
    },
];

/// Advisory band for an AQI value; readings beyond the scale are Hazardous
#[must_use]
pub fn advisory_for(aqi: u32) -> &'static HealthAdvisory {
    HEALTH_ADVISORIES
        .iter()
        .find(|band| band.contains(aqi))
        .unwrap_or(&HEALTH_ADVISORIES[HEALTH_ADVISORIES.len() - 1])
}
