//! Error types for Vayu Core
//!
//! Every failure of the engine is a rejection: the caller's state is left
//! untouched and the reason is returned as a value.
//! - Transition preconditions (locked phase, incomplete phases, ...)
//! - Capability checks (role may not perform an operation)
//! - Close-ticket verification
//! - Lookups of unknown ids

use crate::access::{AppView, Capability};
use crate::community::IncidentStatus;
use crate::types::{AnalysisId, PhaseId, PhaseStatus, ProjectId, ProjectStatus, Role};
use vayu_catalog::ZoneId;

/// Lifecycle precondition violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Project status change not in the transition table
    #[error("illegal project transition: {from} -> {to}")]
    IllegalProjectTransition {
        /// Current status
        from: ProjectStatus,
        /// Requested status
        to: ProjectStatus,
    },

    /// Phase status change not in the transition table
    #[error("illegal phase transition: {from} -> {to}")]
    IllegalPhaseTransition {
        /// Current status
        from: PhaseStatus,
        /// Requested status
        to: PhaseStatus,
    },

    /// Previous phase is not completed yet
    #[error("phase {phase} is locked until phase {blocking} is completed")]
    PhaseLocked {
        /// Phase the operation targeted
        phase: PhaseId,
        /// Predecessor that must complete first
        blocking: PhaseId,
    },

    /// Phase id not part of the project
    #[error("phase {phase} not found in project {project}")]
    PhaseNotFound {
        /// Project searched
        project: ProjectId,
        /// Missing phase
        phase: PhaseId,
    },

    /// Phase work on a project that is not in progress
    #[error("project is {status}; phase work requires an active project")]
    ProjectNotActive {
        /// Current project status
        status: ProjectStatus,
    },

    /// Close requested while phases remain open
    #[error("{remaining} phase(s) not completed")]
    IncompletePhases {
        /// Number of non-completed phases
        remaining: usize,
    },

    /// Start requested without anyone to lead the phase
    #[error("a phase cannot start without an assignee")]
    Unassigned,

    /// Draft without phases
    #[error("a project needs at least one phase")]
    EmptyPlan,
}

/// Capability gate rejections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Role lacks the capability
    #[error("{role} may not {capability}")]
    Denied {
        /// Acting role
        role: Role,
        /// Capability requested
        capability: Capability,
    },

    /// Guest must sign in first
    #[error("sign in required to {capability}")]
    SignInRequired {
        /// Capability requested
        capability: Capability,
    },

    /// View not offered to the role
    #[error("{view} is not available to {role}")]
    ViewHidden {
        /// Acting role
        role: Role,
        /// Requested view
        view: AppView,
    },
}

/// Two-step close rejections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloseError {
    /// Project changed since the ticket was issued
    #[error("close ticket for {0} no longer matches the project")]
    Stale(ProjectId),

    /// Ticket older than the configured time-to-live
    #[error("close ticket for {0} expired")]
    Expired(ProjectId),
}

/// Session operation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Capability gate rejected the actor
    #[error("access denied: {0}")]
    Access(#[from] AccessError),

    /// Lifecycle precondition failed
    #[error("transition rejected: {0}")]
    Transition(#[from] TransitionError),

    /// Close confirmation failed
    #[error("close rejected: {0}")]
    Close(#[from] CloseError),

    /// Unknown project
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Unknown analysis
    #[error("analysis not found: {0}")]
    AnalysisNotFound(AnalysisId),

    /// Unknown zone
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// Unknown city
    #[error("city not found: {0}")]
    CityNotFound(String),

    /// Unknown incident
    #[error("incident not found: {0}")]
    IncidentNotFound(String),

    /// Incident status change not allowed
    #[error("illegal incident transition: {from} -> {to}")]
    IllegalIncidentTransition {
        /// Current status
        from: IncidentStatus,
        /// Requested status
        to: IncidentStatus,
    },

    /// Blank or malformed operation input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SessionError {
    /// Check if the capability gate rejected the operation
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Access(_))
    }

    /// Check if a lifecycle or close precondition rejected the operation
    #[inline]
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::Transition(_) | Self::Close(_) | Self::IllegalIncidentTransition { .. }
        )
    }

    /// Check if the operation referenced something that does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound(_)
                | Self::AnalysisNotFound(_)
                | Self::ZoneNotFound(_)
                | Self::CityNotFound(_)
                | Self::IncidentNotFound(_)
                | Self::Transition(TransitionError::PhaseNotFound { .. })
        )
    }

    /// Short label for logs and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Access(_) => "access",
            Self::Transition(_) => "transition",
            Self::Close(_) => "close",
            Self::IllegalIncidentTransition { .. } => "incident",
            Self::InvalidInput(_) => "input",
            _ => "not_found",
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_display() {
        let err = SessionError::from(TransitionError::IncompletePhases { remaining: 2 });
        assert_eq!(err.to_string(), "transition rejected: 2 phase(s) not completed");
    }

    #[test]
    fn classification() {
        let denied = SessionError::from(AccessError::Denied {
            role: Role::Citizen,
            capability: Capability::ApproveProject,
        });
        assert!(denied.is_access_denied());
        assert!(!denied.is_precondition_violation());
        assert_eq!(denied.kind(), "access");

        let locked = SessionError::from(TransitionError::Unassigned);
        assert!(locked.is_precondition_violation());

        let missing = SessionError::ProjectNotFound(ProjectId::new("prj-x"));
        assert!(missing.is_not_found());
        assert_eq!(missing.kind(), "not_found");
    }

    #[test]
    fn access_error_display() {
        let err = AccessError::Denied {
            role: Role::Citizen,
            capability: Capability::CloseProject,
        };
        assert_eq!(err.to_string(), "CITIZEN may not close projects");
    }
}
