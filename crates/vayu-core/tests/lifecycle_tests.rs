use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use vayu_core::prelude::*;
use vayu_core::{
    AccessError, Capability, CloseError, PhaseStatus, ProjectStatus, TransitionError,
};
use vayu_test_utils::*;

fn phase_ids(state: &AppState, project: &ProjectId) -> Vec<vayu_core::PhaseId> {
    state
        .project(project)
        .unwrap()
        .phases
        .iter()
        .map(|p| p.id.clone())
        .collect()
}

#[test]
fn full_lifecycle_walkthrough() {
    let engine = sample_engine();
    let (state, analysis) = session_with_analysis(&engine);

    let (state, outcome) = step(
        &engine,
        &state,
        Operation::ProposeProject {
            analysis: analysis.clone(),
            draft: sample_project_draft(3),
        },
    );
    let Outcome::ProjectProposed(project) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(engine.pending(&state).len(), 1);
    assert_eq!(
        state.project(&project).unwrap().based_on_analysis_id,
        analysis
    );

    let (mut state, _) = step(&engine, &state, Operation::Approve { project: project.clone() });
    assert!(engine.pending(&state).is_empty());
    let phases = phase_ids(&state, &project);

    // phase 1 stays locked while phase 0 runs
    let (next, _) = step(
        &engine,
        &state,
        Operation::StartPhase {
            project: project.clone(),
            phase: phases[0].clone(),
            assignee: Some("Field Team A".into()),
        },
    );
    let locked = engine.apply(
        &next,
        Operation::StartPhase {
            project: project.clone(),
            phase: phases[1].clone(),
            assignee: None,
        },
        t0(),
    );
    assert_eq!(
        locked.unwrap_err(),
        SessionError::Transition(TransitionError::PhaseLocked {
            phase: phases[1].clone(),
            blocking: phases[0].clone(),
        })
    );
    state = next;

    for (i, phase) in phases.iter().enumerate() {
        if i > 0 {
            state = step(
                &engine,
                &state,
                Operation::StartPhase {
                    project: project.clone(),
                    phase: phase.clone(),
                    assignee: None,
                },
            )
            .0;
        }
        state = step(
            &engine,
            &state,
            Operation::CompletePhase {
                project: project.clone(),
                phase: phase.clone(),
            },
        )
        .0;
        let expected = [33, 67, 100][i];
        assert_eq!(engine.active(&state)[0].progress, expected);
    }

    let (state, outcome) = step(&engine, &state, Operation::RequestClose { project: project.clone() });
    let Outcome::CloseRequested(ticket) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(ticket.phase_count, 3);
    let (state, _) = step(&engine, &state, Operation::ConfirmClose { ticket });

    let closed = state.project(&project).unwrap();
    assert_eq!(closed.status, ProjectStatus::Completed);
    assert!(closed.phases.iter().all(|p| p.status == PhaseStatus::Completed));
    assert_eq!(closed.phases[1].assigned_to.as_deref(), Some("Dr. Meera Rao"));
    assert!(engine.active(&state).is_empty());
    assert_eq!(engine.archive(&state, ArchiveFilter::All).len(), 1);
}

#[test]
fn close_with_open_phase_keeps_status() {
    let engine = sample_engine();
    let (state, project) = session_with_active_project(&engine, 2);
    let err = engine
        .apply(&state, Operation::RequestClose { project: project.clone() }, t0())
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::Transition(TransitionError::IncompletePhases { remaining: 2 })
    );
    assert_eq!(
        state.project(&project).unwrap().status,
        ProjectStatus::InProgress
    );
}

#[test]
fn stale_ticket_rejected_after_change() {
    let engine = sample_engine();
    let (state, project) = session_with_active_project(&engine, 1);
    let phase = phase_ids(&state, &project)[0].clone();
    let (state, _) = step(
        &engine,
        &state,
        Operation::StartPhase {
            project: project.clone(),
            phase: phase.clone(),
            assignee: None,
        },
    );
    let (state, _) = step(
        &engine,
        &state,
        Operation::CompletePhase {
            project: project.clone(),
            phase,
        },
    );
    let (state, outcome) = step(&engine, &state, Operation::RequestClose { project: project.clone() });
    let Outcome::CloseRequested(mut ticket) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    ticket.fingerprint = "0".repeat(64);
    assert_eq!(
        engine
            .apply(&state, Operation::ConfirmClose { ticket: ticket.clone() }, t0())
            .unwrap_err(),
        SessionError::Close(CloseError::Stale(project.clone()))
    );

    let (_, outcome) = step(&engine, &state, Operation::RequestClose { project: project.clone() });
    let Outcome::CloseRequested(fresh) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    let late = t0() + chrono::Duration::seconds(301);
    assert_eq!(
        engine
            .apply(&state, Operation::ConfirmClose { ticket: fresh }, late)
            .unwrap_err(),
        SessionError::Close(CloseError::Expired(project))
    );
}

#[test]
fn archive_filtered_by_start_year() {
    let engine = sample_engine();
    let (mut state, analysis) = session_with_analysis(&engine);
    for year in [2022, 2023, 2023] {
        let now = Utc.with_ymd_and_hms(year, 3, 15, 12, 0, 0).unwrap();
        let apply = |s: &AppState, op| engine.apply(s, op, now).unwrap();
        let t = apply(
            &state,
            Operation::ProposeProject {
                analysis: analysis.clone(),
                draft: sample_project_draft(1),
            },
        );
        let Outcome::ProjectProposed(project) = t.outcome else {
            panic!("unexpected outcome");
        };
        let s = apply(&t.state, Operation::Approve { project: project.clone() }).state;
        let phase = s.project(&project).unwrap().phases[0].id.clone();
        let s = apply(
            &s,
            Operation::StartPhase {
                project: project.clone(),
                phase: phase.clone(),
                assignee: None,
            },
        )
        .state;
        let s = apply(
            &s,
            Operation::CompletePhase {
                project: project.clone(),
                phase,
            },
        )
        .state;
        let t = apply(&s, Operation::RequestClose { project });
        let Outcome::CloseRequested(ticket) = t.outcome else {
            panic!("unexpected outcome");
        };
        state = apply(&t.state, Operation::ConfirmClose { ticket }).state;
    }

    let hits = engine.archive(&state, "2023".parse().unwrap());
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|p| p.start_date.format("%Y").to_string() == "2023"));
    assert_eq!(engine.archive(&state, ArchiveFilter::All).len(), 3);
}

#[test]
fn only_scientists_mutate() {
    let engine = sample_engine();
    let (state, project) = session_with_active_project(&engine, 1);
    let (citizen_state, _) = step(&engine, &state, Operation::Login(citizen()));
    let err = engine
        .apply(&citizen_state, Operation::RequestClose { project: project.clone() }, t0())
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::Access(AccessError::Denied {
            role: Role::Citizen,
            capability: Capability::CloseProject,
        })
    );

    let (guest_state, _) = step(&engine, &state, Operation::Logout);
    let err = engine
        .apply(&guest_state, Operation::Approve { project }, t0())
        .unwrap_err();
    assert!(err.is_access_denied());
}

#[test]
fn recent_analyses_include_pinned_one() {
    let engine = sample_engine();
    let (state, analysis) = session_with_analysis(&engine);
    let later = t0() + chrono::Duration::days(45);
    assert!(engine.recent_analyses(&state, later).is_empty());
    let (state, _) = step(
        &engine,
        &state,
        Operation::OpenInterventions {
            analysis: analysis.clone(),
        },
    );
    assert_eq!(state.view, AppView::Solutions);
    let recent = engine.recent_analyses(&state, later);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, analysis);
}
