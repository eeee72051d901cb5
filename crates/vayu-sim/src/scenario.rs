//! End-to-end walkthrough
//!
//! Signs in a scientist, generates an analysis and a plan through the AI
//! client, then approves the project, runs every phase in order and closes
//! it. Each step is checked and recorded.

use anyhow::{bail, ensure, Context};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;
use vayu_ai::AiClient;
use vayu_core::{
    progress, AppState, ArchiveFilter, Engine, Evidence, InterventionProject, Operation, Outcome,
    ProjectStatus, ReportSource, Role, SessionError, TransitionError, User,
};

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioStep {
    /// Step name
    pub name: String,
    /// What happened
    pub detail: String,
}

/// Walkthrough result
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Zone the walkthrough ran in
    pub zone: String,
    /// Fallback diagnostics, analysis first
    pub diagnostics: Vec<String>,
    /// Steps in order
    pub steps: Vec<ScenarioStep>,
    /// Progress after each phase completion
    pub progress: Vec<u8>,
    /// The closed project
    pub project: InterventionProject,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Vayu Scenario: {} ===", self.zone)?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {:<16} {}", i + 1, step.name, step.detail)?;
        }
        for diagnostic in &self.diagnostics {
            writeln!(f, "fallback: {diagnostic}")?;
        }
        let trace: Vec<String> = self.progress.iter().map(|p| format!("{p}%")).collect();
        writeln!(f, "progress: {}", trace.join(" -> "))?;
        writeln!(f, "project: {} [{}]", self.project.title, self.project.status)?;
        for phase in &self.project.phases {
            writeln!(
                f,
                "  - {} [{}] lead: {}",
                phase.name,
                phase.status,
                phase.assigned_to.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

struct Walk<'e> {
    engine: &'e Engine,
    state: AppState,
    now: DateTime<Utc>,
    steps: Vec<ScenarioStep>,
}

impl Walk<'_> {
    fn apply(&mut self, operation: Operation) -> Result<Outcome, SessionError> {
        let transition = self.engine.apply(&self.state, operation, self.now)?;
        self.state = transition.state;
        Ok(transition.outcome)
    }

    fn record(&mut self, name: &str, detail: impl Into<String>) {
        let detail = detail.into();
        info!(step = name, %detail, "scenario step");
        self.steps.push(ScenarioStep {
            name: name.to_string(),
            detail,
        });
    }
}

/// Run the walkthrough on the engine's default zone
///
/// # Errors
/// Any step that does not behave as the lifecycle requires
pub async fn run_scenario(
    engine: &Engine,
    client: &AiClient,
    now: DateTime<Utc>,
) -> anyhow::Result<ScenarioReport> {
    let mut walk = Walk {
        engine,
        state: engine.initial_state(),
        now,
        steps: Vec::new(),
    };
    let mut diagnostics = Vec::new();

    walk.apply(Operation::Login(
        User::new("scientist", "Dr. Meera Rao", Role::Scientist)
            .with_title("Lead Atmospheric Scientist"),
    ))?;
    walk.record("login", "Dr. Meera Rao (SCIENTIST)");

    let zone = engine
        .catalog()
        .zone(&walk.state.selected_zone)
        .context("selected zone missing from catalog")?
        .clone();

    let analysis = client.analyze(&zone, &Evidence::none()).await;
    diagnostics.extend(analysis.diagnostic().map(str::to_string));
    let Outcome::AnalysisRecorded(analysis_id) = walk.apply(Operation::RecordAnalysis {
        zone: zone.id.clone(),
        draft: analysis.value,
        evidence: Evidence::none(),
    })?
    else {
        bail!("analysis was not recorded");
    };
    walk.record("analyze", format!("{} ({})", zone.name, analysis_id));

    walk.apply(Operation::OpenInterventions {
        analysis: analysis_id.clone(),
    })?;
    let basis = walk.state.analysis(&analysis_id)?.clone();
    let plan = client.plan(&zone, &basis).await;
    diagnostics.extend(plan.diagnostic().map(str::to_string));
    let Outcome::ProjectProposed(project_id) = walk.apply(Operation::ProposeProject {
        analysis: analysis_id,
        draft: plan.value,
    })?
    else {
        bail!("project was not proposed");
    };
    ensure!(
        engine.pending(&walk.state).iter().any(|p| p.id == project_id),
        "proposed project missing from the pending list"
    );
    walk.record("propose", project_id.to_string());

    walk.apply(Operation::Approve {
        project: project_id.clone(),
    })?;
    walk.record("approve", "IN_PROGRESS");

    let phases: Vec<_> = walk
        .state
        .project(&project_id)?
        .phases
        .iter()
        .map(|p| p.id.clone())
        .collect();
    let mut trace = Vec::with_capacity(phases.len());

    for (i, phase) in phases.iter().enumerate() {
        walk.apply(Operation::StartPhase {
            project: project_id.clone(),
            phase: phase.clone(),
            assignee: None,
        })?;
        walk.record("start_phase", format!("phase {}", i + 1));

        if let Some(next) = phases.get(i + 1) {
            let early = walk.apply(Operation::StartPhase {
                project: project_id.clone(),
                phase: next.clone(),
                assignee: None,
            });
            ensure!(
                matches!(
                    early,
                    Err(SessionError::Transition(TransitionError::PhaseLocked { .. }))
                ),
                "phase {} started before phase {} finished",
                i + 2,
                i + 1
            );
            walk.record("locked", format!("phase {} waits", i + 2));
        }

        walk.apply(Operation::CompletePhase {
            project: project_id.clone(),
            phase: phase.clone(),
        })?;
        let pct = progress(walk.state.project(&project_id)?);
        trace.push(pct);
        walk.record("complete_phase", format!("phase {} ({pct}%)", i + 1));
    }

    let Outcome::CloseRequested(ticket) = walk.apply(Operation::RequestClose {
        project: project_id.clone(),
    })?
    else {
        bail!("close was not requested");
    };
    walk.record(
        "request_close",
        format!("{} ({} phases)", ticket.title, ticket.phase_count),
    );
    walk.apply(Operation::ConfirmClose { ticket })?;

    let project = walk.state.project(&project_id)?.clone();
    ensure!(
        project.status == ProjectStatus::Completed,
        "project ended as {}",
        project.status
    );
    ensure!(
        engine
            .archive(&walk.state, ArchiveFilter::Year(project.start_date.year()))
            .iter()
            .any(|p| p.id == project_id),
        "closed project missing from the archive"
    );
    walk.record("close", "COMPLETED");

    let report = engine.download_report(&walk.state, &ReportSource::Project(project_id))?;
    walk.record("download", report.title);

    Ok(ScenarioReport {
        zone: format!("{}, {}", zone.name, zone.city),
        diagnostics,
        steps: walk.steps,
        progress: trace,
        project,
    })
}
