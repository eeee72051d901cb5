//! Core types for Vayu
//!
//! Defines the session's domain values:
//! - identifiers for analyses, projects, phases and feedback
//! - users and roles
//! - analysis reports and their causes
//! - intervention projects and their phases
//! - drafts handed over by the AI boundary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use vayu_catalog::ZoneId;

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, never reused identifier
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), Ulid::new()))
            }

            /// Wrap an existing identifier
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

prefixed_id!(
    /// Analysis report identifier
    AnalysisId,
    "an"
);
prefixed_id!(
    /// Intervention project identifier
    ProjectId,
    "prj"
);
prefixed_id!(
    /// Project phase identifier
    PhaseId,
    "ph"
);
prefixed_id!(
    /// Community feedback identifier
    FeedbackId,
    "fb"
);

/// User role supplied by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Not signed in
    #[default]
    Guest,
    /// Resident: reads reports, gives feedback
    Citizen,
    /// Scientific team member: runs analyses, manages projects
    Scientist,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Guest => "GUEST",
            Role::Citizen => "CITIZEN",
            Role::Scientist => "SCIENTIST",
        })
    }
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub username: String,
    /// Display name (used as phase assignee and report author)
    pub name: String,
    /// Role
    pub role: Role,
    /// Job title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl User {
    /// Create user
    #[inline]
    #[must_use]
    pub fn new(username: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            role,
            title: None,
        }
    }

    /// With job title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One suspected pollution cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisCause {
    /// Source name
    pub factor: String,
    /// Confidence 0-100
    pub confidence: u8,
    /// Supporting evidence
    pub reasoning: String,
}

impl AnalysisCause {
    /// Create cause; confidence is clamped to 100
    #[inline]
    #[must_use]
    pub fn new(factor: impl Into<String>, confidence: u8, reasoning: impl Into<String>) -> Self {
        Self {
            factor: factor.into(),
            confidence: confidence.min(100),
            reasoning: reasoning.into(),
        }
    }
}

/// Evidence handles attached to an analysis request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evidence {
    /// Site image handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Ambient audio handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl Evidence {
    /// No evidence
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether nothing is attached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.audio.is_none()
    }
}

/// Validated content of an analysis, as produced by the AI boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDraft {
    /// Executive summary
    pub summary: String,
    /// Primary actionable advice
    pub recommendation: String,
    /// Ordered causes
    pub causes: Vec<AnalysisCause>,
}

/// AI-produced diagnosis of a zone at a point in time (immutable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Identifier
    pub id: AnalysisId,
    /// Zone analysed
    pub zone_id: ZoneId,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Executive summary
    pub summary: String,
    /// Primary actionable advice
    pub recommendation: String,
    /// Ordered causes, most relevant first
    pub causes: Vec<AnalysisCause>,
    /// Author name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    /// Attached evidence
    #[serde(default)]
    pub evidence: Evidence,
}

impl AnalysisReport {
    /// Wrap a draft with metadata
    #[must_use]
    pub fn from_draft(
        draft: AnalysisDraft,
        zone_id: ZoneId,
        timestamp: DateTime<Utc>,
        generated_by: Option<String>,
        evidence: Evidence,
    ) -> Self {
        Self {
            id: AnalysisId::generate(),
            zone_id,
            timestamp,
            summary: draft.summary,
            recommendation: draft.recommendation,
            causes: draft.causes,
            generated_by,
            evidence,
        }
    }

    /// First listed cause
    #[inline]
    #[must_use]
    pub fn primary_cause(&self) -> Option<&AnalysisCause> {
        self.causes.first()
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Proposed, awaiting approval (initial)
    PendingApproval,
    /// Approved and executing phases
    InProgress,
    /// Archived (terminal)
    Completed,
    /// Reserved; no operation enters or leaves it
    OnHold,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProjectStatus::PendingApproval => "Pending Approval",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::OnHold => "On Hold",
        })
    }
}

/// Phase status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    /// Not started (initial)
    Pending,
    /// Led by an assignee
    InProgress,
    /// Done (terminal)
    Completed,
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PhaseStatus::Pending => "PENDING",
            PhaseStatus::InProgress => "IN_PROGRESS",
            PhaseStatus::Completed => "COMPLETED",
        })
    }
}

/// Phase content before it is instantiated into a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTemplate {
    /// Phase name
    pub name: String,
    /// Phase description
    pub description: String,
    /// Action items
    #[serde(default)]
    pub actions: Vec<String>,
}

impl PhaseTemplate {
    /// Create template
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            actions: Vec::new(),
        }
    }

    /// With action item
    #[inline]
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }
}

/// Caller-supplied plan for a new project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    /// Project title
    pub title: String,
    /// Strategic notes
    #[serde(default)]
    pub notes: String,
    /// Ordered phase templates
    pub phases: Vec<PhaseTemplate>,
}

impl ProjectDraft {
    /// Create draft without phases
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            notes: notes.into(),
            phases: Vec::new(),
        }
    }

    /// With phase appended
    #[inline]
    #[must_use]
    pub fn with_phase(mut self, phase: PhaseTemplate) -> Self {
        self.phases.push(phase);
        self
    }
}

/// Sequential stage of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPhase {
    /// Identifier
    pub id: PhaseId,
    /// Phase name
    pub name: String,
    /// Phase description
    pub description: String,
    /// Action items (unordered)
    pub actions: Vec<String>,
    /// Status
    pub status: PhaseStatus,
    /// Lead name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl ProjectPhase {
    /// Instantiate a template as a fresh PENDING phase
    #[must_use]
    pub fn from_template(template: PhaseTemplate) -> Self {
        Self {
            id: PhaseId::generate(),
            name: template.name,
            description: template.description,
            actions: template.actions,
            status: PhaseStatus::Pending,
            assigned_to: None,
        }
    }
}

/// Multi-phase remediation plan derived from an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionProject {
    /// Identifier
    pub id: ProjectId,
    /// Zone the project targets
    pub zone_id: ZoneId,
    /// Title
    pub title: String,
    /// Lifecycle status
    pub status: ProjectStatus,
    /// Analysis the project was derived from (not revalidated)
    pub based_on_analysis_id: AnalysisId,
    /// Creation date
    pub start_date: NaiveDate,
    /// Notes
    pub notes: String,
    /// Ordered phases; the order is the execution sequence
    pub phases: Vec<ProjectPhase>,
}

impl InterventionProject {
    /// Phase and its index
    #[must_use]
    pub fn phase(&self, id: &PhaseId) -> Option<(usize, &ProjectPhase)> {
        self.phases.iter().enumerate().find(|(_, p)| &p.id == id)
    }

    /// Number of COMPLETED phases
    #[must_use]
    pub fn completed_phase_count(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| p.status == PhaseStatus::Completed)
            .count()
    }

    /// Whether every phase is COMPLETED
    #[inline]
    #[must_use]
    pub fn all_phases_completed(&self) -> bool {
        self.phases.iter().all(|p| p.status == PhaseStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let a = ProjectId::generate();
        let b = ProjectId::generate();
        assert!(a.as_str().starts_with("prj-"));
        assert!(PhaseId::generate().as_str().starts_with("ph-"));
        assert_ne!(a, b);
    }

    #[test]
    fn cause_confidence_clamped() {
        assert_eq!(AnalysisCause::new("Dust", 250, "").confidence, 100);
        assert_eq!(AnalysisCause::new("Dust", 85, "").confidence, 85);
    }

    #[test]
    fn status_labels() {
        assert_eq!(ProjectStatus::PendingApproval.to_string(), "Pending Approval");
        assert_eq!(PhaseStatus::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(
            serde_json::to_string(&ProjectStatus::OnHold).unwrap(),
            "\"ON_HOLD\""
        );
    }

    #[test]
    fn phase_from_template_is_pending_and_unassigned() {
        let phase = ProjectPhase::from_template(
            PhaseTemplate::new("Phase 1", "Contain").with_action("Deploy mist cannons"),
        );
        assert_eq!(phase.status, PhaseStatus::Pending);
        assert!(phase.assigned_to.is_none());
        assert_eq!(phase.actions, vec!["Deploy mist cannons".to_string()]);
    }

    #[test]
    fn role_default_is_guest() {
        assert_eq!(Role::default(), Role::Guest);
        assert_eq!(Role::Scientist.to_string(), "SCIENTIST");
    }
}
