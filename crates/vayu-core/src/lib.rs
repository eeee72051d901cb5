//! Vayu Core - intervention project lifecycle
//!
//! Turns AI-produced air-quality analyses into phased intervention projects
//! and drives them through approval, sequential phase execution and
//! archival:
//! - `lifecycle`: project and phase state machines, pure transitions
//! - `views`: pending / active / archive projections
//! - `close`: two-step close with content-bound tickets
//! - `access`: role router and capability gate
//! - `session`: explicit session state and the operation engine
//!
//! # Example
//!
//! ```rust,ignore
//! use vayu_core::prelude::*;
//!
//! let engine = Engine::new(EngineConfig::default(), catalog);
//! let state = engine.initial_state();
//! let state = engine.apply(&state, Operation::Login(scientist), now)?.state;
//! ```

pub mod access;
pub mod close;
pub mod community;
pub mod config;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod reports;
pub mod session;
pub mod store;
pub mod types;
pub mod views;

pub use access::{authorize, authorize_view, visible_views, AppView, Capability};
pub use close::{confirm_close, request_close, CloseTicket};
pub use community::{Feedback, FeedbackKind, Incident, IncidentPriority, IncidentStatus};
pub use config::EngineConfig;
pub use error::{AccessError, CloseError, ConfigError, SessionError, TransitionError};
pub use reports::{
    available_months, available_years, ReportCategory, ReportFilter, ReportItem, ReportSource,
};
pub use session::{AppState, Engine, Operation, Outcome, Transition};
pub use store::{AnalysisStore, ProjectCollection, Record, RecordStore};
pub use types::{
    AnalysisCause, AnalysisDraft, AnalysisId, AnalysisReport, Evidence, FeedbackId,
    InterventionProject, PhaseId, PhaseStatus, PhaseTemplate, ProjectDraft, ProjectId,
    ProjectPhase, ProjectStatus, Role, User,
};
pub use views::{progress, ActiveProject, ArchiveFilter};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        AnalysisDraft, AnalysisId, AppState, AppView, ArchiveFilter, Engine, EngineConfig,
        Evidence, Operation, Outcome, PhaseTemplate, ProjectDraft, ProjectId, Role,
        SessionError, User,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
