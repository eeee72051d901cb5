//! Intervention project lifecycle
//!
//! Two state machines govern a project:
//!
//! ```text
//! project: PENDING_APPROVAL --approve--> IN_PROGRESS --close--> COMPLETED
//! phase:   PENDING --assign_and_start--> IN_PROGRESS --complete--> COMPLETED
//! ```
//!
//! Phase `i > 0` is locked until phase `i - 1` is COMPLETED. `ON_HOLD` exists
//! as a status but has no transitions in or out.
//!
//! Every operation takes a project by reference and returns a full
//! replacement; a rejected operation leaves the input untouched.

use crate::error::TransitionError;
use crate::types::{
    AnalysisReport, InterventionProject, PhaseId, PhaseStatus, ProjectDraft, ProjectId,
    ProjectPhase, ProjectStatus,
};
use chrono::NaiveDate;
use metrics::counter;
use tracing::{debug, info, warn};

/// Project statuses reachable from `from`
#[must_use]
pub fn allowed_project_transitions(from: ProjectStatus) -> &'static [ProjectStatus] {
    use ProjectStatus::*;
    match from {
        PendingApproval => &[InProgress],
        InProgress => &[Completed],
        Completed | OnHold => &[],
    }
}

/// Validates a project status change
///
/// # Errors
/// `TransitionError::IllegalProjectTransition` when `to` is not reachable
pub fn validate_project_transition(
    from: ProjectStatus,
    to: ProjectStatus,
) -> Result<(), TransitionError> {
    if allowed_project_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::IllegalProjectTransition { from, to })
    }
}

/// Phase statuses reachable from `from`
#[must_use]
pub fn allowed_phase_transitions(from: PhaseStatus) -> &'static [PhaseStatus] {
    use PhaseStatus::*;
    match from {
        Pending => &[InProgress],
        InProgress => &[Completed],
        Completed => &[],
    }
}

/// Validates a phase status change
///
/// # Errors
/// `TransitionError::IllegalPhaseTransition` when `to` is not reachable
pub fn validate_phase_transition(from: PhaseStatus, to: PhaseStatus) -> Result<(), TransitionError> {
    if allowed_phase_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::IllegalPhaseTransition { from, to })
    }
}

/// Predecessor that keeps phase `index` locked, if any
#[must_use]
pub fn blocking_phase(project: &InterventionProject, index: usize) -> Option<&ProjectPhase> {
    let prev = project.phases.get(index.checked_sub(1)?)?;
    (prev.status != PhaseStatus::Completed).then_some(prev)
}

/// Whether phase `index` may not transition yet
#[inline]
#[must_use]
pub fn is_phase_locked(project: &InterventionProject, index: usize) -> bool {
    blocking_phase(project, index).is_some()
}

/// Instantiate a draft as a PENDING_APPROVAL project on the analysis' zone
///
/// Every phase gets a fresh id and starts PENDING. A blank title is replaced
/// by `untitled`.
///
/// # Errors
/// `TransitionError::EmptyPlan` for a draft without phases
pub fn create_project(
    draft: ProjectDraft,
    analysis: &AnalysisReport,
    today: NaiveDate,
    untitled: &str,
) -> Result<InterventionProject, TransitionError> {
    if draft.phases.is_empty() {
        return observe("create", Err(TransitionError::EmptyPlan));
    }
    let title = match draft.title.trim() {
        "" => untitled.to_string(),
        t => t.to_string(),
    };
    let project = InterventionProject {
        id: ProjectId::generate(),
        zone_id: analysis.zone_id.clone(),
        title,
        status: ProjectStatus::PendingApproval,
        based_on_analysis_id: analysis.id.clone(),
        start_date: today,
        notes: draft.notes,
        phases: draft
            .phases
            .into_iter()
            .map(ProjectPhase::from_template)
            .collect(),
    };
    debug!(project = %project.id, phases = project.phases.len(), "project created");
    observe("create", Ok(project))
}

/// PENDING_APPROVAL -> IN_PROGRESS; no phase is started
///
/// # Errors
/// `TransitionError::IllegalProjectTransition` from any other status
pub fn approve(project: &InterventionProject) -> Result<InterventionProject, TransitionError> {
    let result = validate_project_transition(project.status, ProjectStatus::InProgress).map(|()| {
        InterventionProject {
            status: ProjectStatus::InProgress,
            ..project.clone()
        }
    });
    observe("approve", result)
}

/// PENDING -> IN_PROGRESS for an unlocked phase, led by `assignee`
///
/// # Errors
/// - `ProjectNotActive` unless the project is IN_PROGRESS
/// - `PhaseNotFound`, `PhaseLocked`
/// - `Unassigned` for a blank assignee
/// - `IllegalPhaseTransition` unless the phase is PENDING
pub fn assign_and_start(
    project: &InterventionProject,
    phase_id: &PhaseId,
    assignee: &str,
) -> Result<InterventionProject, TransitionError> {
    observe("start_phase", start(project, phase_id, assignee))
}

/// IN_PROGRESS -> COMPLETED for an unlocked phase
///
/// Completing an already COMPLETED phase returns an identical project.
///
/// # Errors
/// - `ProjectNotActive` unless the project is IN_PROGRESS
/// - `PhaseNotFound`, `PhaseLocked`
/// - `IllegalPhaseTransition` for a PENDING phase
pub fn complete_phase(
    project: &InterventionProject,
    phase_id: &PhaseId,
) -> Result<InterventionProject, TransitionError> {
    observe("complete_phase", complete(project, phase_id))
}

/// Checks that `close` would succeed
///
/// # Errors
/// - `IllegalProjectTransition` unless the project is IN_PROGRESS
/// - `IncompletePhases` while any phase is not COMPLETED
pub fn check_closable(project: &InterventionProject) -> Result<(), TransitionError> {
    validate_project_transition(project.status, ProjectStatus::Completed)?;
    let remaining = project.phases.len() - project.completed_phase_count();
    if remaining > 0 {
        return Err(TransitionError::IncompletePhases { remaining });
    }
    Ok(())
}

/// IN_PROGRESS -> COMPLETED once every phase is COMPLETED
///
/// # Errors
/// See [`check_closable`]
pub fn close(project: &InterventionProject) -> Result<InterventionProject, TransitionError> {
    let result = check_closable(project).map(|()| InterventionProject {
        status: ProjectStatus::Completed,
        ..project.clone()
    });
    observe("close", result)
}

fn start(
    project: &InterventionProject,
    phase_id: &PhaseId,
    assignee: &str,
) -> Result<InterventionProject, TransitionError> {
    let index = unlocked_phase(project, phase_id)?;
    let assignee = assignee.trim();
    if assignee.is_empty() {
        return Err(TransitionError::Unassigned);
    }
    validate_phase_transition(project.phases[index].status, PhaseStatus::InProgress)?;

    let mut next = project.clone();
    let phase = &mut next.phases[index];
    phase.status = PhaseStatus::InProgress;
    phase.assigned_to = Some(assignee.to_string());
    Ok(next)
}

fn complete(
    project: &InterventionProject,
    phase_id: &PhaseId,
) -> Result<InterventionProject, TransitionError> {
    let index = unlocked_phase(project, phase_id)?;
    let status = project.phases[index].status;
    if status == PhaseStatus::Completed {
        return Ok(project.clone());
    }
    validate_phase_transition(status, PhaseStatus::Completed)?;

    let mut next = project.clone();
    next.phases[index].status = PhaseStatus::Completed;
    Ok(next)
}

fn unlocked_phase(
    project: &InterventionProject,
    phase_id: &PhaseId,
) -> Result<usize, TransitionError> {
    if project.status != ProjectStatus::InProgress {
        return Err(TransitionError::ProjectNotActive {
            status: project.status,
        });
    }
    let (index, _) = project
        .phase(phase_id)
        .ok_or_else(|| TransitionError::PhaseNotFound {
            project: project.id.clone(),
            phase: phase_id.clone(),
        })?;
    if let Some(blocking) = blocking_phase(project, index) {
        return Err(TransitionError::PhaseLocked {
            phase: phase_id.clone(),
            blocking: blocking.id.clone(),
        });
    }
    Ok(index)
}

fn observe(
    op: &'static str,
    result: Result<InterventionProject, TransitionError>,
) -> Result<InterventionProject, TransitionError> {
    match &result {
        Ok(project) => {
            counter!("vayu_lifecycle_commits_total", "op" => op).increment(1);
            info!(op, project = %project.id, status = %project.status, "lifecycle commit");
        }
        Err(err) => {
            counter!("vayu_lifecycle_rejections_total", "op" => op).increment(1);
            warn!(op, error = %err, "lifecycle rejection");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisDraft, Evidence, PhaseTemplate};
    use chrono::{TimeZone, Utc};
    use vayu_catalog::ZoneId;

    fn analysis() -> AnalysisReport {
        AnalysisReport::from_draft(
            AnalysisDraft {
                summary: "Dust from construction".into(),
                recommendation: "Enforce covers".into(),
                causes: vec![],
            },
            ZoneId::new("pn-01"),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            None,
            Evidence::none(),
        )
    }

    fn draft(phases: usize) -> ProjectDraft {
        (0..phases).fold(ProjectDraft::new("Green Kothrud", "notes"), |d, i| {
            d.with_phase(PhaseTemplate::new(format!("Phase {}", i + 1), "work"))
        })
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn active(phases: usize) -> InterventionProject {
        let p = create_project(draft(phases), &analysis(), today(), "Untitled Project").unwrap();
        approve(&p).unwrap()
    }

    #[test]
    fn creation_instantiates_pending_phases() {
        let a = analysis();
        let p = create_project(draft(3), &a, today(), "Untitled Project").unwrap();
        assert_eq!(p.status, ProjectStatus::PendingApproval);
        assert_eq!(p.zone_id, a.zone_id);
        assert_eq!(p.based_on_analysis_id, a.id);
        assert!(p.phases.iter().all(|ph| ph.status == PhaseStatus::Pending));
        assert_ne!(p.phases[0].id, p.phases[1].id);
    }

    #[test]
    fn blank_title_and_empty_plan() {
        let p = create_project(
            ProjectDraft::new("  ", "").with_phase(PhaseTemplate::new("a", "b")),
            &analysis(),
            today(),
            "Untitled Project",
        )
        .unwrap();
        assert_eq!(p.title, "Untitled Project");
        assert_eq!(
            create_project(draft(0), &analysis(), today(), "x"),
            Err(TransitionError::EmptyPlan)
        );
    }

    #[test]
    fn approve_starts_no_phase() {
        let p = active(2);
        assert_eq!(p.status, ProjectStatus::InProgress);
        assert!(p.phases.iter().all(|ph| ph.status == PhaseStatus::Pending));
        assert!(approve(&p).is_err());
    }

    #[test]
    fn second_phase_locked_until_first_completes() {
        let p = active(3);
        let second = p.phases[1].id.clone();
        let err = assign_and_start(&p, &second, "Dr. Rao").unwrap_err();
        assert_eq!(
            err,
            TransitionError::PhaseLocked {
                phase: second.clone(),
                blocking: p.phases[0].id.clone()
            }
        );

        let first = p.phases[0].id.clone();
        let p = assign_and_start(&p, &first, "Dr. Rao").unwrap();
        assert!(is_phase_locked(&p, 1));
        let p = complete_phase(&p, &first).unwrap();
        assert!(!is_phase_locked(&p, 1));
        assert!(assign_and_start(&p, &second, "Dr. Rao").is_ok());
    }

    #[test]
    fn completing_pending_phase_is_illegal() {
        let p = active(1);
        let id = p.phases[0].id.clone();
        assert_eq!(
            complete_phase(&p, &id),
            Err(TransitionError::IllegalPhaseTransition {
                from: PhaseStatus::Pending,
                to: PhaseStatus::Completed
            })
        );
    }

    #[test]
    fn completing_completed_phase_changes_nothing() {
        let p = active(1);
        let id = p.phases[0].id.clone();
        let p = assign_and_start(&p, &id, "A").unwrap();
        let done = complete_phase(&p, &id).unwrap();
        assert_eq!(complete_phase(&done, &id).unwrap(), done);
    }

    #[test]
    fn blank_assignee_rejected() {
        let p = active(1);
        let id = p.phases[0].id.clone();
        assert_eq!(assign_and_start(&p, &id, " "), Err(TransitionError::Unassigned));
    }

    #[test]
    fn close_requires_all_phases() {
        let p = active(2);
        assert_eq!(close(&p), Err(TransitionError::IncompletePhases { remaining: 2 }));
        let p = p.phases.iter().fold(p.clone(), |acc, ph| {
            let started = assign_and_start(&acc, &ph.id, "A").unwrap();
            complete_phase(&started, &ph.id).unwrap()
        });
        let closed = close(&p).unwrap();
        assert_eq!(closed.status, ProjectStatus::Completed);
        assert!(close(&closed).is_err());
    }

    #[test]
    fn phase_work_needs_active_project() {
        let p = create_project(draft(1), &analysis(), today(), "x").unwrap();
        let id = p.phases[0].id.clone();
        assert_eq!(
            assign_and_start(&p, &id, "A"),
            Err(TransitionError::ProjectNotActive {
                status: ProjectStatus::PendingApproval
            })
        );
    }

    #[test]
    fn on_hold_is_inert() {
        let mut p = active(1);
        p.status = ProjectStatus::OnHold;
        let id = p.phases[0].id.clone();
        assert!(approve(&p).is_err());
        assert!(close(&p).is_err());
        assert!(assign_and_start(&p, &id, "A").is_err());
        assert!(allowed_project_transitions(ProjectStatus::OnHold).is_empty());
        for from in [
            ProjectStatus::PendingApproval,
            ProjectStatus::InProgress,
            ProjectStatus::Completed,
        ] {
            assert!(!allowed_project_transitions(from).contains(&ProjectStatus::OnHold));
        }
    }

    #[test]
    fn unknown_phase() {
        let p = active(1);
        let missing = PhaseId::new("ph-missing");
        assert!(matches!(
            complete_phase(&p, &missing),
            Err(TransitionError::PhaseNotFound { .. })
        ));
    }
}
