//! Randomized lifecycle simulator
//!
//! Every generated operation is classified against the state it will be
//! applied to, executed through [`Engine::apply`], and followed by a full
//! invariant sweep over all projects.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use vayu_catalog::Catalog;
use vayu_core::lifecycle::is_phase_locked;
use vayu_core::{
    progress, AnalysisCause, AnalysisDraft, AnalysisId, AppState, AppView, CloseTicket, Engine,
    EngineConfig, Evidence, FeedbackKind, IncidentPriority, InterventionProject, Operation,
    Outcome, PhaseId, PhaseStatus, PhaseTemplate, ProjectDraft, ProjectId, ProjectStatus, Role,
    SessionError, User,
};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: u64,
    /// Distribution of operation kinds
    pub operation_distribution: OperationDistribution,
    /// Stop at the first violation
    pub stop_on_first_violation: bool,
    /// Stop once this many violations are recorded
    pub stop_on_error_count: Option<usize>,
    /// Engine under test
    pub engine: EngineConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            operation_distribution: OperationDistribution::default(),
            stop_on_first_violation: true,
            stop_on_error_count: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Probability distribution for operation generation
#[derive(Debug, Clone)]
pub struct OperationDistribution {
    /// Operations whose preconditions hold
    pub valid_ops: f64,
    /// Boundary behavior (repeat completion, blank titles, expired tickets)
    pub edge_cases: f64,
    /// Operations that must be rejected
    pub invalid_ops: f64,
}

impl Default for OperationDistribution {
    fn default() -> Self {
        Self {
            valid_ops: 0.70,
            edge_cases: 0.20,
            invalid_ops: 0.10,
        }
    }
}

/// Operations the simulator can generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedOperation {
    /// Log in with a role
    SignIn(Role),
    /// Log out
    SignOut,
    /// Open a view
    Navigate(AppView),
    /// Propose a plan on the seeded analysis
    Propose {
        /// Phase count of the plan
        phases: usize,
        /// Plan title, possibly blank
        title: String,
    },
    /// Approve a project
    Approve(ProjectId),
    /// Start a phase
    StartPhase(ProjectId, PhaseId),
    /// Complete a phase
    CompletePhase(ProjectId, PhaseId),
    /// Request and immediately confirm
    Close(ProjectId),
    /// Request, then confirm after the ticket lifetime
    CloseAfterExpiry(ProjectId),
    /// Send community feedback
    SubmitFeedback(String),
    /// Raise an IT incident with this title
    LogIncident(String),
}

impl SimulatedOperation {
    /// Short name for statistics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignIn(_) => "sign_in",
            Self::SignOut => "sign_out",
            Self::Navigate(_) => "navigate",
            Self::Propose { .. } => "propose",
            Self::Approve(_) => "approve",
            Self::StartPhase(..) => "start_phase",
            Self::CompletePhase(..) => "complete_phase",
            Self::Close(_) => "close",
            Self::CloseAfterExpiry(_) => "close_after_expiry",
            Self::SubmitFeedback(_) => "submit_feedback",
            Self::LogIncident(_) => "log_incident",
        }
    }

    fn to_operation(&self, analysis: &AnalysisId) -> Operation {
        match self {
            Self::SignIn(role) => Operation::Login(sim_user(*role)),
            Self::SignOut => Operation::Logout,
            Self::Navigate(view) => Operation::Navigate(*view),
            Self::Propose { phases, title } => Operation::ProposeProject {
                analysis: analysis.clone(),
                draft: plan(*phases, title),
            },
            Self::Approve(project) => Operation::Approve {
                project: project.clone(),
            },
            Self::StartPhase(project, phase) => Operation::StartPhase {
                project: project.clone(),
                phase: phase.clone(),
                assignee: None,
            },
            Self::CompletePhase(project, phase) => Operation::CompletePhase {
                project: project.clone(),
                phase: phase.clone(),
            },
            Self::Close(project) | Self::CloseAfterExpiry(project) => Operation::RequestClose {
                project: project.clone(),
            },
            Self::SubmitFeedback(message) => Operation::SubmitFeedback {
                kind: FeedbackKind::General,
                message: message.clone(),
            },
            Self::LogIncident(title) => Operation::LogIncident {
                title: title.clone(),
                description: "Raised by the simulator".into(),
                priority: IncidentPriority::Medium,
            },
        }
    }
}

/// Expected result classification for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedResult {
    /// Engine must accept
    ShouldSucceed,
    /// Engine must reject
    ShouldFail,
}

impl From<bool> for ExpectedResult {
    fn from(ok: bool) -> Self {
        if ok {
            Self::ShouldSucceed
        } else {
            Self::ShouldFail
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// Engine verdict differs from the expected one
    UnexpectedOutcome {
        /// Position in the run
        operation_index: u64,
        /// Offending operation
        operation: SimulatedOperation,
        /// Predicted verdict
        expected: ExpectedResult,
        /// Outcome or error as reported
        actual: Result<String, String>,
    },
    /// Invariant broken after an operation
    Invariant {
        /// Position in the run
        operation_index: u64,
        /// What broke
        violation: InvariantViolation,
    },
}

/// A specific invariant violation
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Failed check
    pub check: InvariantCheck,
    /// Offending record
    pub details: String,
}

/// Invariants checked after every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantCheck {
    // Projects
    /// A completed project has every phase completed
    CompletedProjectsHaveNoOpenPhases,
    /// No project is ever on hold
    OnHoldIsUnreachable,
    /// Progress stays in 0..=100
    ProgressWithinBounds,

    // Phases
    /// No phase runs ahead of an unfinished predecessor
    PhasesUnlockInOrder,
    /// Started phases name a lead
    StartedPhasesHaveLead,

    // Operations
    /// Rejected operations leave the session untouched
    RejectionLeavesStateUnchanged,
    /// Completing a completed phase changes nothing
    RepeatCompletionIsNoOp,
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default)]
pub struct OperationStats {
    /// Operations executed
    pub total_operations: u64,
    /// Accepted by the engine
    pub accepted_operations: u64,
    /// Rejected by the engine
    pub rejected_operations: u64,
    /// Invariant checks that failed
    pub invariant_violations: u64,
    /// Count per operation name
    pub operations_by_type: BTreeMap<&'static str, u64>,
}

impl OperationStats {
    /// Count one executed operation
    pub fn record(&mut self, operation: &SimulatedOperation, accepted: bool) {
        self.total_operations += 1;
        *self.operations_by_type.entry(operation.name()).or_insert(0) += 1;
        if accepted {
            self.accepted_operations += 1;
        } else {
            self.rejected_operations += 1;
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration the run used
    pub config: SimulatorConfig,
    /// Operation counters
    pub stats: OperationStats,
    /// Everything that went wrong, in order
    pub violations: Vec<Violation>,
    /// Projects in the final state
    pub final_project_count: usize,
    /// Of which completed
    pub completed_project_count: usize,
}

impl SimulatorReport {
    /// Whether the run found no violations
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Plain-text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        let _ = writeln!(report, "=== Vayu Simulator Report ===\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Total Operations: {}", self.stats.total_operations);
        let _ = writeln!(report, "Accepted: {}", self.stats.accepted_operations);
        let _ = writeln!(report, "Rejected: {}", self.stats.rejected_operations);
        let _ = writeln!(report, "Violations: {}", self.violations.len());
        let _ = writeln!(report, "Final Projects: {}", self.final_project_count);
        let _ = writeln!(report, "Completed Projects: {}", self.completed_project_count);

        let _ = writeln!(report, "\n=== Operations ===");
        for (name, count) in &self.stats.operations_by_type {
            let _ = writeln!(report, "  {name}: {count}");
        }

        if !self.violations.is_empty() {
            let _ = writeln!(report, "\n=== Violations ===");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// Run the simulator against a fresh engine over `catalog`
///
/// # Errors
/// Only if the initial scientist session cannot be set up
pub fn run_simulator(
    config: SimulatorConfig,
    catalog: Arc<Catalog>,
) -> Result<SimulatorReport, SessionError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut sim = Simulation::new(Engine::new(config.engine.clone(), catalog))?;
    let ttl_secs = config.engine.close_ticket_ttl_secs;
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();

    info!(seed = config.seed, operations = config.total_operations, "simulation started");

    for i in 0..config.total_operations {
        sim.tick(&mut rng);

        let operation = generate_operation(&mut rng, &config.operation_distribution, &sim.state);
        let expected = classify_expected_result(&sim.state, &operation, sim.now, ttl_secs);
        let repeat_completion = is_repeat_completion(&sim.state, &operation);
        let before = sim.state.clone();

        let actual: Result<String, String> = sim
            .execute(&operation, ttl_secs)
            .map_err(|e| format!("{}: {e}", e.kind()));
        debug!(index = i, op = operation.name(), ok = actual.is_ok(), "simulated");

        let outcome_matches = matches!(
            (expected, &actual),
            (ExpectedResult::ShouldSucceed, Ok(_)) | (ExpectedResult::ShouldFail, Err(_))
        );
        let mut found = check_invariants(&sim.state);
        if actual.is_err() && sim.state != before {
            found.push(InvariantViolation {
                check: InvariantCheck::RejectionLeavesStateUnchanged,
                details: format!("{} changed state after rejection", operation.name()),
            });
        }
        if repeat_completion && sim.state != before {
            found.push(InvariantViolation {
                check: InvariantCheck::RepeatCompletionIsNoOp,
                details: format!("{operation:?}"),
            });
        }

        stats.record(&operation, actual.is_ok());
        stats.invariant_violations += found.len() as u64;

        let failed = !outcome_matches || !found.is_empty();
        if !outcome_matches {
            violations.push(Violation::UnexpectedOutcome {
                operation_index: i,
                operation,
                expected,
                actual,
            });
        }
        violations.extend(found.into_iter().map(|violation| Violation::Invariant {
            operation_index: i,
            violation,
        }));

        if failed && config.stop_on_first_violation {
            break;
        }
        if let Some(max_errors) = config.stop_on_error_count {
            if violations.len() >= max_errors {
                break;
            }
        }
    }

    let final_project_count = sim.state.projects.len();
    let completed_project_count = sim
        .state
        .projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Completed)
        .count();
    info!(
        operations = stats.total_operations,
        violations = violations.len(),
        projects = final_project_count,
        "simulation finished"
    );

    Ok(SimulatorReport {
        config,
        stats,
        violations,
        final_project_count,
        completed_project_count,
    })
}

/// Engine, state and simulated clock
struct Simulation {
    engine: Engine,
    state: AppState,
    analysis: AnalysisId,
    now: DateTime<Utc>,
}

impl Simulation {
    fn new(engine: Engine) -> Result<Self, SessionError> {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 1, 8, 0, 0)
            .single()
            .unwrap_or_default();
        let state = engine.initial_state();
        let mut sim = Self {
            engine,
            state,
            analysis: AnalysisId::new(""),
            now,
        };
        sim.apply(Operation::Login(sim_user(Role::Scientist)), now)?;
        let zone = sim.state.selected_zone.clone();
        if let Outcome::AnalysisRecorded(id) = sim.apply(
            Operation::RecordAnalysis {
                zone,
                draft: baseline_analysis(),
                evidence: Evidence::none(),
            },
            now,
        )? {
            sim.analysis = id;
        }
        Ok(sim)
    }

    fn tick(&mut self, rng: &mut StdRng) {
        self.now += Duration::minutes(rng.gen_range(1..=90));
    }

    fn apply(&mut self, operation: Operation, at: DateTime<Utc>) -> Result<Outcome, SessionError> {
        let transition = self.engine.apply(&self.state, operation, at)?;
        self.state = transition.state;
        Ok(transition.outcome)
    }

    fn request_close(&mut self, operation: Operation) -> Result<CloseTicket, SessionError> {
        match self.apply(operation, self.now)? {
            Outcome::CloseRequested(ticket) => Ok(ticket),
            other => Err(SessionError::InvalidInput(format!(
                "expected a close ticket, got {other:?}"
            ))),
        }
    }

    fn execute(
        &mut self,
        operation: &SimulatedOperation,
        ttl_secs: u64,
    ) -> Result<String, SessionError> {
        let op = operation.to_operation(&self.analysis);
        let outcome = match operation {
            SimulatedOperation::Close(_) => {
                let ticket = self.request_close(op)?;
                self.apply(Operation::ConfirmClose { ticket }, self.now)?
            }
            SimulatedOperation::CloseAfterExpiry(_) => {
                let ticket = self.request_close(op)?;
                let late = expiry_instant(self.now, ttl_secs).unwrap_or(self.now);
                self.apply(Operation::ConfirmClose { ticket }, late)?
            }
            _ => self.apply(op, self.now)?,
        };
        Ok(format!("{outcome:?}"))
    }
}

/// First instant at which a ticket issued at `issued` is expired
fn expiry_instant(issued: DateTime<Utc>, ttl_secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(ttl_secs).ok()?.checked_add(1)?;
    issued.checked_add_signed(Duration::try_seconds(secs)?)
}

fn sim_user(role: Role) -> User {
    match role {
        Role::Scientist => User::new("sim-scientist", "Simulated Scientist", role),
        _ => User::new("sim-resident", "Simulated Resident", role),
    }
}

fn baseline_analysis() -> AnalysisDraft {
    AnalysisDraft {
        summary: "Mixed urban sources with a construction dust signature".into(),
        recommendation: "Phase in dust controls and traffic diversion".into(),
        causes: vec![
            AnalysisCause::new("Construction Dust", 70, "Elevated coarse fraction"),
            AnalysisCause::new("Vehicular Emissions", 45, "NO2 tracks commute hours"),
        ],
    }
}

fn plan(phases: usize, title: &str) -> ProjectDraft {
    (1..=phases).fold(
        ProjectDraft::new(title, "Generated by the simulator"),
        |draft, i| {
            draft.with_phase(
                PhaseTemplate::new(format!("Phase {i}"), format!("Stage {i} of {phases}"))
                    .with_action(format!("Deliver stage {i}")),
            )
        },
    )
}

/// Generate a random operation based on the distribution
fn generate_operation(
    rng: &mut StdRng,
    distribution: &OperationDistribution,
    state: &AppState,
) -> SimulatedOperation {
    let r: f64 = rng.gen();

    if r < distribution.valid_ops {
        generate_valid_operation(rng, state)
    } else if r < distribution.valid_ops + distribution.edge_cases {
        generate_edge_case_operation(rng, state)
    } else {
        generate_invalid_operation(rng, state)
    }
}

fn projects_with<'s>(
    state: &'s AppState,
    status: ProjectStatus,
) -> impl Iterator<Item = &'s InterventionProject> {
    state.projects.iter().filter(move |p| p.status == status)
}

/// Phases of active projects matching `pred(project, index)`
fn phases_where(
    state: &AppState,
    pred: impl Fn(&InterventionProject, usize) -> bool,
) -> Vec<(ProjectId, PhaseId)> {
    projects_with(state, ProjectStatus::InProgress)
        .flat_map(|p| {
            (0..p.phases.len())
                .filter(|&i| pred(p, i))
                .map(|i| (p.id.clone(), p.phases[i].id.clone()))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn closable(state: &AppState) -> Vec<ProjectId> {
    projects_with(state, ProjectStatus::InProgress)
        .filter(|p| p.all_phases_completed())
        .map(|p| p.id.clone())
        .collect()
}

/// Generate an operation whose preconditions hold
fn generate_valid_operation(rng: &mut StdRng, state: &AppState) -> SimulatedOperation {
    if state.role() != Role::Scientist {
        return SimulatedOperation::SignIn(Role::Scientist);
    }

    let pending: Vec<ProjectId> = projects_with(state, ProjectStatus::PendingApproval)
        .map(|p| p.id.clone())
        .collect();
    let startable = phases_where(state, |p, i| {
        p.phases[i].status == PhaseStatus::Pending && !is_phase_locked(p, i)
    });
    let running = phases_where(state, |p, i| p.phases[i].status == PhaseStatus::InProgress);
    let closable = closable(state);

    let mut choices = vec![SimulatedOperation::Propose {
        phases: rng.gen_range(1..=4),
        title: format!("Intervention {}", state.projects.len() + 1),
    }];
    if let Some(id) = pending.choose(rng) {
        choices.push(SimulatedOperation::Approve(id.clone()));
    }
    if let Some((p, ph)) = startable.choose(rng) {
        choices.push(SimulatedOperation::StartPhase(p.clone(), ph.clone()));
    }
    if let Some((p, ph)) = running.choose(rng) {
        choices.push(SimulatedOperation::CompletePhase(p.clone(), ph.clone()));
    }
    if let Some(id) = closable.choose(rng) {
        choices.push(SimulatedOperation::Close(id.clone()));
    }
    if rng.gen_bool(0.1) {
        choices.push(SimulatedOperation::LogIncident("Sensor feed stalled".into()));
    }

    let index = rng.gen_range(0..choices.len());
    choices.swap_remove(index)
}

/// Generate a boundary operation
fn generate_edge_case_operation(rng: &mut StdRng, state: &AppState) -> SimulatedOperation {
    let navigate = |rng: &mut StdRng| {
        SimulatedOperation::Navigate(AppView::MENU[rng.gen_range(0..AppView::MENU.len())])
    };
    match rng.gen_range(0..6) {
        0 => {
            let done = phases_where(state, |p, i| p.phases[i].status == PhaseStatus::Completed);
            match done.choose(rng) {
                Some((p, ph)) => SimulatedOperation::CompletePhase(p.clone(), ph.clone()),
                None => navigate(rng),
            }
        }
        1 => SimulatedOperation::Propose {
            phases: rng.gen_range(1..=3),
            title: "   ".into(),
        },
        2 => {
            let active: Vec<ProjectId> = projects_with(state, ProjectStatus::InProgress)
                .map(|p| p.id.clone())
                .collect();
            match active.choose(rng) {
                Some(id) => SimulatedOperation::CloseAfterExpiry(id.clone()),
                None => navigate(rng),
            }
        }
        3 => match rng.gen_range(0..3) {
            0 => SimulatedOperation::SignIn(Role::Citizen),
            1 => SimulatedOperation::SignIn(Role::Scientist),
            _ => SimulatedOperation::SignOut,
        },
        4 => navigate(rng),
        _ => SimulatedOperation::SubmitFeedback("Dust clouds near the school gate".into()),
    }
}

/// Generate an operation that should be rejected
fn generate_invalid_operation(rng: &mut StdRng, state: &AppState) -> SimulatedOperation {
    match rng.gen_range(0..5) {
        0 => SimulatedOperation::Approve(ProjectId::generate()),
        1 => {
            let locked = phases_where(state, is_phase_locked);
            match locked.choose(rng) {
                Some((p, ph)) => SimulatedOperation::StartPhase(p.clone(), ph.clone()),
                None => SimulatedOperation::StartPhase(ProjectId::generate(), PhaseId::generate()),
            }
        }
        2 => SimulatedOperation::Propose {
            phases: 0,
            title: "Empty plan".into(),
        },
        3 => {
            let open: Vec<ProjectId> = projects_with(state, ProjectStatus::InProgress)
                .filter(|p| !p.all_phases_completed())
                .map(|p| p.id.clone())
                .collect();
            match open.choose(rng) {
                Some(id) => SimulatedOperation::Close(id.clone()),
                None => SimulatedOperation::Close(ProjectId::generate()),
            }
        }
        _ => SimulatedOperation::SubmitFeedback("  ".into()),
    }
}

/// Phase of an active project that is unlocked and satisfies `status_ok`
fn phase_ready(
    state: &AppState,
    project: &ProjectId,
    phase: &PhaseId,
    status_ok: impl Fn(PhaseStatus) -> bool,
) -> bool {
    state.project(project).is_ok_and(|p| {
        p.status == ProjectStatus::InProgress
            && p.phase(phase)
                .is_some_and(|(i, ph)| !is_phase_locked(p, i) && status_ok(ph.status))
    })
}

fn is_closable(state: &AppState, project: &ProjectId) -> bool {
    state
        .project(project)
        .is_ok_and(|p| p.status == ProjectStatus::InProgress && p.all_phases_completed())
}

/// Predict the engine's verdict from the state the operation is applied to
fn classify_expected_result(
    state: &AppState,
    operation: &SimulatedOperation,
    now: DateTime<Utc>,
    ttl_secs: u64,
) -> ExpectedResult {
    let role = state.role();
    let scientist = role == Role::Scientist;
    let ok = match operation {
        SimulatedOperation::SignIn(_) | SimulatedOperation::SignOut => true,
        SimulatedOperation::Navigate(view) => view.is_visible_to(role),
        SimulatedOperation::Propose { phases, .. } => scientist && *phases > 0,
        SimulatedOperation::Approve(id) => {
            scientist
                && state
                    .project(id)
                    .is_ok_and(|p| p.status == ProjectStatus::PendingApproval)
        }
        SimulatedOperation::StartPhase(p, ph) => {
            scientist && phase_ready(state, p, ph, |s| s == PhaseStatus::Pending)
        }
        SimulatedOperation::CompletePhase(p, ph) => {
            scientist && phase_ready(state, p, ph, |s| s != PhaseStatus::Pending)
        }
        SimulatedOperation::Close(id) => scientist && is_closable(state, id),
        SimulatedOperation::CloseAfterExpiry(id) => {
            scientist && is_closable(state, id) && expiry_instant(now, ttl_secs).is_none()
        }
        SimulatedOperation::SubmitFeedback(message) => {
            role == Role::Citizen && !message.trim().is_empty()
        }
        SimulatedOperation::LogIncident(title) => scientist && !title.trim().is_empty(),
    };
    ExpectedResult::from(ok)
}

fn is_repeat_completion(state: &AppState, operation: &SimulatedOperation) -> bool {
    let SimulatedOperation::CompletePhase(project, phase) = operation else {
        return false;
    };
    state
        .project(project)
        .ok()
        .and_then(|p| p.phase(phase))
        .is_some_and(|(_, ph)| ph.status == PhaseStatus::Completed)
}

/// Sweep every project for lifecycle invariant breaches
#[must_use]
pub fn check_invariants(state: &AppState) -> Vec<InvariantViolation> {
    let mut found = Vec::new();
    let mut report = |check, details: String| found.push(InvariantViolation { check, details });

    for project in state.projects.iter() {
        if project.status == ProjectStatus::Completed && !project.all_phases_completed() {
            report(
                InvariantCheck::CompletedProjectsHaveNoOpenPhases,
                format!("{} completed with open phases", project.id),
            );
        }
        if project.status == ProjectStatus::OnHold {
            report(
                InvariantCheck::OnHoldIsUnreachable,
                format!("{} is on hold", project.id),
            );
        }
        let pct = progress(project);
        if pct > 100 || (project.status == ProjectStatus::Completed && pct != 100) {
            report(
                InvariantCheck::ProgressWithinBounds,
                format!("{} at {pct}% while {}", project.id, project.status),
            );
        }
        for (i, pair) in project.phases.windows(2).enumerate() {
            if pair[1].status != PhaseStatus::Pending && pair[0].status != PhaseStatus::Completed {
                report(
                    InvariantCheck::PhasesUnlockInOrder,
                    format!("{} phase {} ran before phase {i} finished", project.id, i + 1),
                );
            }
        }
        for phase in &project.phases {
            if phase.status != PhaseStatus::Pending && phase.assigned_to.is_none() {
                report(
                    InvariantCheck::StartedPhasesHaveLead,
                    format!("{} phase {} has no lead", project.id, phase.id),
                );
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_catalog;

    fn run(seed: u64, total_operations: u64) -> SimulatorReport {
        let config = SimulatorConfig {
            seed,
            total_operations,
            ..SimulatorConfig::default()
        };
        run_simulator(config, Arc::new(demo_catalog().unwrap())).unwrap()
    }

    #[test]
    fn short_run_passes() {
        let report = run(42, 500);
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.total_operations, 500);
        assert!(report.final_project_count > 0);
    }

    #[test]
    fn same_seed_same_statistics() {
        let a = run(7, 300);
        let b = run(7, 300);
        assert_eq!(a.stats.operations_by_type, b.stats.operations_by_type);
        assert_eq!(a.stats.accepted_operations, b.stats.accepted_operations);
    }

    #[test]
    fn expiry_instant_is_past_the_ttl() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(expiry_instant(t, 300), Some(t + Duration::seconds(301)));
        assert_eq!(expiry_instant(t, u64::MAX), None);
    }

    #[test]
    fn sweep_flags_out_of_order_phases() {
        let engine = Engine::new(EngineConfig::default(), Arc::new(demo_catalog().unwrap()));
        let mut sim = Simulation::new(engine).unwrap();
        let op = SimulatedOperation::Propose {
            phases: 2,
            title: "Broken".into(),
        };
        sim.execute(&op, 300).unwrap();
        let mut project = sim.state.projects.iter().next().unwrap().clone();
        project.status = ProjectStatus::InProgress;
        project.phases[1].status = PhaseStatus::InProgress;
        project.phases[1].assigned_to = Some("x".into());
        sim.state.projects = sim.state.projects.upsert(project);

        let checks: Vec<_> = check_invariants(&sim.state).into_iter().map(|v| v.check).collect();
        assert_eq!(checks, vec![InvariantCheck::PhasesUnlockInOrder]);
    }

    #[test]
    fn report_text_lists_result() {
        let report = run(1, 50);
        let text = report.generate_text();
        assert!(text.contains("Seed: 1"));
        assert!(text.ends_with("=== Result: PASS ===\n"));
    }
}
