//! Community feedback and IT incident records

use crate::error::SessionError;
use crate::types::FeedbackId;
use chrono::{DateTime, Datelike, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use vayu_catalog::ZoneId;

/// Feedback category offered to residents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeedbackKind {
    /// General remark
    #[default]
    General,
    /// Local pollution issue
    ReportIssue,
    /// Improvement idea
    Suggestion,
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FeedbackKind::General => "General",
            FeedbackKind::ReportIssue => "Report Issue",
            FeedbackKind::Suggestion => "Suggestion",
        })
    }
}

/// Resident feedback about a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Identifier
    pub id: FeedbackId,
    /// Zone the feedback is about
    pub zone_id: ZoneId,
    /// Category
    pub kind: FeedbackKind,
    /// Free text
    pub message: String,
    /// Submission time
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Build a feedback record
    ///
    /// # Errors
    /// `SessionError::InvalidInput` for a blank message
    pub fn submit(
        zone_id: ZoneId,
        kind: FeedbackKind,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::InvalidInput("feedback message is empty".into()));
        }
        Ok(Self {
            id: FeedbackId::generate(),
            zone_id,
            kind,
            message: message.to_string(),
            timestamp,
        })
    }
}

/// Incident urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum IncidentPriority {
    /// Cosmetic
    Low,
    /// Degraded feature
    #[default]
    Medium,
    /// Major feature down
    High,
    /// Platform down
    Critical,
}

impl std::fmt::Display for IncidentPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IncidentPriority::Low => "Low",
            IncidentPriority::Medium => "Medium",
            IncidentPriority::High => "High",
            IncidentPriority::Critical => "Critical",
        })
    }
}

/// Incident workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    /// Logged, nobody on it yet
    Open,
    /// Being worked on
    InProgress,
    /// Fixed (terminal)
    Resolved,
}

impl IncidentStatus {
    /// The only status this one may move to
    #[must_use]
    pub fn successor(self) -> Option<IncidentStatus> {
        match self {
            IncidentStatus::Open => Some(IncidentStatus::InProgress),
            IncidentStatus::InProgress => Some(IncidentStatus::Resolved),
            IncidentStatus::Resolved => None,
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IncidentStatus::Open => "Open",
            IncidentStatus::InProgress => "In Progress",
            IncidentStatus::Resolved => "Resolved",
        })
    }
}

/// IT incident logged by the scientific team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// `INC-<year>-NNN`
    pub id: String,
    /// Short title
    pub title: String,
    /// Details
    pub description: String,
    /// Urgency
    pub priority: IncidentPriority,
    /// Workflow status
    pub status: IncidentStatus,
    /// Reporter display name
    pub reported_by: String,
    /// Logging time
    pub timestamp: DateTime<Utc>,
}

impl Incident {
    /// Move to the next workflow status
    ///
    /// # Errors
    /// `SessionError::IllegalIncidentTransition` unless `to` is the direct successor
    pub fn advance(&self, to: IncidentStatus) -> Result<Self, SessionError> {
        if self.status.successor() != Some(to) {
            return Err(SessionError::IllegalIncidentTransition {
                from: self.status,
                to,
            });
        }
        Ok(Self {
            status: to,
            ..self.clone()
        })
    }
}

/// Next sequential incident id for the year of `now`
#[must_use]
pub fn next_incident_id(incidents: &Vector<Incident>, now: DateTime<Utc>) -> String {
    let prefix = format!("INC-{}-", now.year());
    let last = incidents
        .iter()
        .filter_map(|i| i.id.strip_prefix(&prefix))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:03}", last + 1)
}

/// Build a new OPEN incident
///
/// # Errors
/// `SessionError::InvalidInput` for a blank title
pub fn log_incident(
    incidents: &Vector<Incident>,
    title: &str,
    description: &str,
    priority: IncidentPriority,
    reported_by: &str,
    now: DateTime<Utc>,
) -> Result<Incident, SessionError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SessionError::InvalidInput("incident title is empty".into()));
    }
    Ok(Incident {
        id: next_incident_id(incidents, now),
        title: title.to_string(),
        description: description.trim().to_string(),
        priority,
        status: IncidentStatus::Open,
        reported_by: reported_by.to_string(),
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn incident_ids_are_sequential_per_year() {
        let mut log = Vector::new();
        let first = log_incident(&log, "Sensor offline", "", IncidentPriority::High, "Dr. Rao", at(2024)).unwrap();
        assert_eq!(first.id, "INC-2024-001");
        log.push_front(first);
        let second = log_incident(&log, "Map tiles", "", IncidentPriority::Low, "Dr. Rao", at(2024)).unwrap();
        assert_eq!(second.id, "INC-2024-002");
        log.push_front(second);
        let next_year = log_incident(&log, "Login", "", IncidentPriority::Critical, "Dr. Rao", at(2025)).unwrap();
        assert_eq!(next_year.id, "INC-2025-001");
    }

    #[test]
    fn incident_status_moves_forward_one_step() {
        let inc = log_incident(&Vector::new(), "Lag", "", IncidentPriority::Medium, "A", at(2024)).unwrap();
        assert_eq!(inc.status, IncidentStatus::Open);
        assert!(inc.advance(IncidentStatus::Resolved).is_err());
        let wip = inc.advance(IncidentStatus::InProgress).unwrap();
        let done = wip.advance(IncidentStatus::Resolved).unwrap();
        assert_eq!(
            done.advance(IncidentStatus::Open),
            Err(SessionError::IllegalIncidentTransition {
                from: IncidentStatus::Resolved,
                to: IncidentStatus::Open
            })
        );
    }

    #[test]
    fn blank_inputs_rejected() {
        assert!(Feedback::submit(ZoneId::new("z"), FeedbackKind::General, "   ", at(2024)).is_err());
        assert!(log_incident(&Vector::new(), " ", "", IncidentPriority::Low, "A", at(2024)).is_err());
        let fb = Feedback::submit(ZoneId::new("z"), FeedbackKind::Suggestion, " more trees ", at(2024)).unwrap();
        assert_eq!(fb.message, "more trees");
        assert_eq!(fb.kind.to_string(), "Suggestion");
    }
}
