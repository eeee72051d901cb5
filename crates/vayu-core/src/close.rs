//! Two-step project closure
//!
//! `request_close` checks the close precondition and hands out a ticket
//! bound to the project's current content. `confirm_close` commits only
//! while the ticket is fresh and the project has not changed since.

use crate::error::{CloseError, SessionError, TransitionError};
use crate::lifecycle;
use crate::types::{InterventionProject, ProjectId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Close preview plus confirmation token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseTicket {
    /// Project to close
    pub project_id: ProjectId,
    /// Title shown in the confirmation prompt
    pub title: String,
    /// Number of phases, all COMPLETED when issued
    pub phase_count: usize,
    /// Hex SHA-256 of the project content at issue time
    pub fingerprint: String,
    /// Issue time
    pub issued_at: DateTime<Utc>,
}

impl CloseTicket {
    /// Whether the ticket is older than `ttl_secs` at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        match i64::try_from(ttl_secs).ok().and_then(Duration::try_seconds) {
            Some(ttl) => now - self.issued_at > ttl,
            None => false,
        }
    }
}

/// Content hash over every field a close decision depends on
#[must_use]
pub fn fingerprint(project: &InterventionProject) -> String {
    let mut hasher = Sha256::new();
    let mut field = |bytes: &[u8]| {
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };
    field(project.id.as_str().as_bytes());
    field(project.zone_id.as_str().as_bytes());
    field(project.title.as_bytes());
    field(project.status.to_string().as_bytes());
    field(project.based_on_analysis_id.as_str().as_bytes());
    field(project.start_date.to_string().as_bytes());
    field(project.notes.as_bytes());
    for phase in &project.phases {
        field(phase.id.as_str().as_bytes());
        field(phase.status.to_string().as_bytes());
        field(phase.assigned_to.as_deref().unwrap_or_default().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Issue a close ticket
///
/// # Errors
/// See [`lifecycle::check_closable`]
pub fn request_close(
    project: &InterventionProject,
    now: DateTime<Utc>,
) -> Result<CloseTicket, TransitionError> {
    lifecycle::check_closable(project)?;
    Ok(CloseTicket {
        project_id: project.id.clone(),
        title: project.title.clone(),
        phase_count: project.phases.len(),
        fingerprint: fingerprint(project),
        issued_at: now,
    })
}

/// Commit a previously requested close
///
/// # Errors
/// - `CloseError::Stale` when the ticket is for another project or the
///   project changed since it was issued
/// - `CloseError::Expired` when the ticket outlived `ttl_secs`
/// - any rejection of [`lifecycle::close`]
pub fn confirm_close(
    project: &InterventionProject,
    ticket: &CloseTicket,
    now: DateTime<Utc>,
    ttl_secs: u64,
) -> Result<InterventionProject, SessionError> {
    if ticket.project_id != project.id || ticket.fingerprint != fingerprint(project) {
        return Err(CloseError::Stale(project.id.clone()).into());
    }
    if ticket.is_expired(now, ttl_secs) {
        return Err(CloseError::Expired(project.id.clone()).into());
    }
    Ok(lifecycle::close(project)?)
}
