//! Reports & Data listing
//!
//! Every analysis is listed as a causal analysis report and every completed
//! project as an intervention report. Items are labelled with catalog names
//! and sorted newest first.

use crate::format::location_names;
use crate::store::{AnalysisStore, ProjectCollection};
use crate::types::{AnalysisId, ProjectId, ProjectStatus};
use chrono::{DateTime, Datelike, Month, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use vayu_catalog::{Catalog, ZoneId};

const SUMMARY_PREVIEW_CHARS: usize = 40;

/// Report category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCategory {
    /// Derived from an analysis
    CausalAnalysis,
    /// Derived from a completed project
    InterventionReport,
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReportCategory::CausalAnalysis => "Causal Analysis",
            ReportCategory::InterventionReport => "Intervention Report",
        })
    }
}

/// What a report item was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSource {
    /// Analysis report
    Analysis(AnalysisId),
    /// Completed project
    Project(ProjectId),
}

/// One downloadable report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    /// Origin record
    pub source: ReportSource,
    /// Display title
    pub title: String,
    /// Category
    pub category: ReportCategory,
    /// Analysis time, or project start at midnight
    pub date: DateTime<Utc>,
    /// City name
    pub city: String,
    /// Zone id
    pub zone_id: ZoneId,
    /// Zone name
    pub zone_name: String,
}

/// Listing filter; `None` means "All"
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportFilter {
    /// City name
    pub city: Option<String>,
    /// Zone id
    pub zone: Option<ZoneId>,
    /// Calendar year
    pub year: Option<i32>,
    /// Calendar month
    pub month: Option<Month>,
    /// Category
    pub category: Option<ReportCategory>,
}

impl ReportFilter {
    /// Everything
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a city
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Restrict to a zone
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Restrict to a year
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Restrict to a month
    #[must_use]
    pub fn with_month(mut self, month: Month) -> Self {
        self.month = Some(month);
        self
    }

    /// Restrict to a category
    #[must_use]
    pub fn with_category(mut self, category: ReportCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether `item` passes every set criterion
    #[must_use]
    pub fn matches(&self, item: &ReportItem) -> bool {
        self.city.as_ref().map_or(true, |c| c == &item.city)
            && self.zone.as_ref().map_or(true, |z| z == &item.zone_id)
            && self.year.map_or(true, |y| y == item.date.year())
            && self
                .month
                .map_or(true, |m| m.number_from_month() == item.date.month())
            && self.category.map_or(true, |c| c == item.category)
    }
}

fn preview(summary: &str) -> String {
    let head: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    format!("AI Analysis: {head}...")
}

/// Every report item, newest first
#[must_use]
pub fn all_reports(
    catalog: &Catalog,
    analyses: &AnalysisStore,
    projects: &ProjectCollection,
) -> Vec<ReportItem> {
    let from_analyses = analyses.iter().map(|a| {
        let (city, zone_name) = location_names(catalog, &a.zone_id);
        ReportItem {
            source: ReportSource::Analysis(a.id.clone()),
            title: preview(&a.summary),
            category: ReportCategory::CausalAnalysis,
            date: a.timestamp,
            city,
            zone_id: a.zone_id.clone(),
            zone_name,
        }
    });
    let from_projects = projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Completed)
        .map(|p| {
            let (city, zone_name) = location_names(catalog, &p.zone_id);
            ReportItem {
                source: ReportSource::Project(p.id.clone()),
                title: format!("Completion Report: {}", p.title),
                category: ReportCategory::InterventionReport,
                date: p.start_date.and_time(NaiveTime::default()).and_utc(),
                city,
                zone_id: p.zone_id.clone(),
                zone_name,
            }
        });
    let mut items: Vec<ReportItem> = from_analyses.chain(from_projects).collect();
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items
}

/// Report items passing `filter`, newest first
#[must_use]
pub fn list_reports(
    catalog: &Catalog,
    analyses: &AnalysisStore,
    projects: &ProjectCollection,
    filter: &ReportFilter,
) -> Vec<ReportItem> {
    all_reports(catalog, analyses, projects)
        .into_iter()
        .filter(|item| filter.matches(item))
        .collect()
}

/// Distinct years among `items`, ascending
#[must_use]
pub fn available_years(items: &[ReportItem]) -> Vec<i32> {
    let years: BTreeSet<i32> = items.iter().map(|i| i.date.year()).collect();
    years.into_iter().collect()
}

/// Distinct months among `items`, in calendar order
#[must_use]
pub fn available_months(items: &[ReportItem]) -> Vec<Month> {
    let months: BTreeSet<Month> = items
        .iter()
        .filter_map(|i| u8::try_from(i.date.month()).ok())
        .filter_map(|m| Month::try_from(m).ok())
        .collect();
    months.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: ReportCategory, city: &str, y: i32, m: u32) -> ReportItem {
        ReportItem {
            source: ReportSource::Analysis(AnalysisId::new("an-1")),
            title: String::new(),
            category,
            date: chrono::NaiveDate::from_ymd_opt(y, m, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc(),
            city: city.into(),
            zone_id: ZoneId::new("pn-01"),
            zone_name: "Kothrud".into(),
        }
    }

    #[test]
    fn filter_criteria_combine() {
        let it = item(ReportCategory::CausalAnalysis, "Pune", 2024, 5);
        assert!(ReportFilter::all().matches(&it));
        assert!(ReportFilter::all().with_city("Pune").with_month(Month::May).matches(&it));
        assert!(!ReportFilter::all().with_year(2023).matches(&it));
        assert!(!ReportFilter::all()
            .with_category(ReportCategory::InterventionReport)
            .matches(&it));
        assert!(!ReportFilter::all().with_zone(ZoneId::new("dl-01")).matches(&it));
    }

    #[test]
    fn preview_truncates_on_chars() {
        let long = "é".repeat(50);
        let title = preview(&long);
        assert_eq!(title.chars().count(), "AI Analysis: ".len() + 40 + 3);
    }

    #[test]
    fn filter_options_are_distinct_and_ordered() {
        let items = vec![
            item(ReportCategory::CausalAnalysis, "Pune", 2024, 11),
            item(ReportCategory::InterventionReport, "Delhi", 2022, 3),
            item(ReportCategory::CausalAnalysis, "Pune", 2024, 3),
            item(ReportCategory::CausalAnalysis, "Delhi", 2023, 8),
        ];
        assert_eq!(available_years(&items), vec![2022, 2023, 2024]);
        assert_eq!(
            available_months(&items),
            vec![Month::March, Month::August, Month::November]
        );
        assert!(available_years(&[]).is_empty());
    }
}
