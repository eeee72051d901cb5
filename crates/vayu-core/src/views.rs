//! Derived, zone-scoped views over the project collection

use crate::store::ProjectCollection;
use crate::types::{InterventionProject, ProjectStatus};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use vayu_catalog::ZoneId;

/// Percentage of completed phases, rounded half up; 0 without phases
#[must_use]
pub fn progress(project: &InterventionProject) -> u8 {
    let total = project.phases.len();
    if total == 0 {
        return 0;
    }
    let done = project.completed_phase_count();
    let percent = (200 * done + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// Active project with its progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveProject<'a> {
    /// Project
    pub project: &'a InterventionProject,
    /// 0-100
    pub progress: u8,
}

/// Archive year filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArchiveFilter {
    /// Every completed project
    #[default]
    All,
    /// Projects started in the given calendar year
    Year(i32),
}

impl ArchiveFilter {
    /// Whether `project` passes the filter
    #[must_use]
    pub fn matches(self, project: &InterventionProject) -> bool {
        match self {
            ArchiveFilter::All => true,
            ArchiveFilter::Year(year) => project.start_date.year() == year,
        }
    }
}

impl FromStr for ArchiveFilter {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            Ok(ArchiveFilter::All)
        } else {
            s.parse().map(ArchiveFilter::Year)
        }
    }
}

impl std::fmt::Display for ArchiveFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveFilter::All => f.write_str("All"),
            ArchiveFilter::Year(year) => write!(f, "{year}"),
        }
    }
}

fn with_status<'a, 'z>(
    projects: &'a ProjectCollection,
    zone: &'z ZoneId,
    status: ProjectStatus,
) -> impl Iterator<Item = &'a InterventionProject> + 'z
where
    'a: 'z,
{
    projects.for_zone(zone).filter(move |p| p.status == status)
}

/// Projects awaiting approval
#[must_use]
pub fn pending<'a>(projects: &'a ProjectCollection, zone: &ZoneId) -> Vec<&'a InterventionProject> {
    with_status(projects, zone, ProjectStatus::PendingApproval).collect()
}

/// Projects in progress with their progress
#[must_use]
pub fn active<'a>(projects: &'a ProjectCollection, zone: &ZoneId) -> Vec<ActiveProject<'a>> {
    with_status(projects, zone, ProjectStatus::InProgress)
        .map(|project| ActiveProject {
            project,
            progress: progress(project),
        })
        .collect()
}

/// Completed projects passing `filter`
#[must_use]
pub fn archive<'a>(
    projects: &'a ProjectCollection,
    zone: &ZoneId,
    filter: ArchiveFilter,
) -> Vec<&'a InterventionProject> {
    with_status(projects, zone, ProjectStatus::Completed)
        .filter(|p| filter.matches(p))
        .collect()
}

/// Distinct start years of completed projects, ascending
#[must_use]
pub fn archive_years(projects: &ProjectCollection, zone: &ZoneId) -> Vec<i32> {
    let years: BTreeSet<i32> = with_status(projects, zone, ProjectStatus::Completed)
        .map(|p| p.start_date.year())
        .collect();
    years.into_iter().collect()
}
