//! Application session
//!
//! The whole session is one [`AppState`] value. [`Engine::apply`] takes a
//! state and an [`Operation`], runs the capability gate, and returns either
//! a [`Transition`] holding the successor state or a rejection. The input
//! state is never modified, so a rejected operation leaves nothing behind.

use crate::access::{self, AppView, Capability};
use crate::close::{self, CloseTicket};
use crate::community::{self, Feedback, FeedbackKind, Incident, IncidentPriority, IncidentStatus};
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::lifecycle;
use crate::reports::{self, ReportFilter, ReportItem, ReportSource};
use crate::store::{AnalysisStore, ProjectCollection};
use crate::types::{
    AnalysisDraft, AnalysisId, AnalysisReport, Evidence, FeedbackId, InterventionProject,
    PhaseId, ProjectDraft, ProjectId, Role, User,
};
use crate::views::{self, ActiveProject, ArchiveFilter};
use chrono::{DateTime, Utc};
use im::Vector;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use vayu_catalog::{Catalog, Zone, ZoneId};

/// Complete session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Signed-in user; `None` is a guest
    pub user: Option<User>,
    /// Selected city name
    pub selected_city: String,
    /// Selected zone, always inside the selected city
    pub selected_zone: ZoneId,
    /// Current view
    pub view: AppView,
    /// Analysis handed over from the analysis view to the intervention board
    pub pending_analysis: Option<AnalysisId>,
    /// Analysis reports, newest first
    pub analyses: AnalysisStore,
    /// Intervention projects, newest first
    pub projects: ProjectCollection,
    /// Community feedback, newest first
    pub feedback: Vector<Feedback>,
    /// IT incidents, newest first
    pub incidents: Vector<Incident>,
}

impl AppState {
    /// Guest session on the catalog's first zone
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let zone = catalog.default_zone();
        Self {
            user: None,
            selected_city: zone.city.clone(),
            selected_zone: zone.id.clone(),
            view: AppView::Home,
            pending_analysis: None,
            analyses: AnalysisStore::new(),
            projects: ProjectCollection::new(),
            feedback: Vector::new(),
            incidents: Vector::new(),
        }
    }

    /// With pre-existing analyses and projects
    #[must_use]
    pub fn with_records(
        mut self,
        analyses: impl IntoIterator<Item = AnalysisReport>,
        projects: impl IntoIterator<Item = InterventionProject>,
    ) -> Self {
        self.analyses = analyses.into_iter().collect();
        self.projects = projects.into_iter().collect();
        self
    }

    /// Role of the acting user
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.user.as_ref().map_or(Role::Guest, |u| u.role)
    }

    /// Display name of the acting user
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }

    /// Look up a project
    ///
    /// # Errors
    /// `SessionError::ProjectNotFound`
    pub fn project(&self, id: &ProjectId) -> Result<&InterventionProject, SessionError> {
        self.projects
            .get(id)
            .ok_or_else(|| SessionError::ProjectNotFound(id.clone()))
    }

    /// Look up an analysis
    ///
    /// # Errors
    /// `SessionError::AnalysisNotFound`
    pub fn analysis(&self, id: &AnalysisId) -> Result<&AnalysisReport, SessionError> {
        self.analyses
            .get(id)
            .ok_or_else(|| SessionError::AnalysisNotFound(id.clone()))
    }
}

/// Session operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Sign in
    Login(User),
    /// Sign out and return home
    Logout,
    /// Select a city and its first zone
    SelectCity(String),
    /// Select a zone of the current city
    SelectZone(ZoneId),
    /// Open a view
    Navigate(AppView),
    /// Jump to the intervention board with an analysis preselected
    OpenInterventions {
        /// Analysis to plan from
        analysis: AnalysisId,
    },
    /// Store a validated analysis for a zone
    RecordAnalysis {
        /// Zone analysed
        zone: ZoneId,
        /// Validated content
        draft: AnalysisDraft,
        /// Evidence handles
        evidence: Evidence,
    },
    /// Create a PENDING_APPROVAL project
    ProposeProject {
        /// Basis analysis
        analysis: AnalysisId,
        /// Plan
        draft: ProjectDraft,
    },
    /// Approve a pending project
    Approve {
        /// Project
        project: ProjectId,
    },
    /// Assign a lead and start a phase
    StartPhase {
        /// Project
        project: ProjectId,
        /// Phase
        phase: PhaseId,
        /// Lead; the acting user when absent or blank
        assignee: Option<String>,
    },
    /// Mark a phase complete
    CompletePhase {
        /// Project
        project: ProjectId,
        /// Phase
        phase: PhaseId,
    },
    /// First close step
    RequestClose {
        /// Project
        project: ProjectId,
    },
    /// Second close step
    ConfirmClose {
        /// Ticket from `RequestClose`
        ticket: CloseTicket,
    },
    /// Send feedback about the selected zone
    SubmitFeedback {
        /// Category
        kind: FeedbackKind,
        /// Text
        message: String,
    },
    /// Log an IT incident
    LogIncident {
        /// Title
        title: String,
        /// Details
        description: String,
        /// Urgency
        priority: IncidentPriority,
    },
    /// Move an incident along its workflow
    AdvanceIncident {
        /// Incident id
        id: String,
        /// Next status
        to: IncidentStatus,
    },
}

impl Operation {
    /// Capability the actor must hold
    #[must_use]
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Operation::Login(_)
            | Operation::Logout
            | Operation::SelectCity(_)
            | Operation::SelectZone(_)
            | Operation::Navigate(_) => None,
            Operation::OpenInterventions { .. } => Some(Capability::ViewInterventions),
            Operation::RecordAnalysis { .. } => Some(Capability::RunAnalysis),
            Operation::ProposeProject { .. } => Some(Capability::ProposeProject),
            Operation::Approve { .. } => Some(Capability::ApproveProject),
            Operation::StartPhase { .. } => Some(Capability::StartPhase),
            Operation::CompletePhase { .. } => Some(Capability::CompletePhase),
            Operation::RequestClose { .. } | Operation::ConfirmClose { .. } => {
                Some(Capability::CloseProject)
            }
            Operation::SubmitFeedback { .. } => Some(Capability::SubmitFeedback),
            Operation::LogIncident { .. } => Some(Capability::ReportIncident),
            Operation::AdvanceIncident { .. } => Some(Capability::ManageIncidents),
        }
    }

    /// Short name for logs and metrics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Login(_) => "login",
            Operation::Logout => "logout",
            Operation::SelectCity(_) => "select_city",
            Operation::SelectZone(_) => "select_zone",
            Operation::Navigate(_) => "navigate",
            Operation::OpenInterventions { .. } => "open_interventions",
            Operation::RecordAnalysis { .. } => "record_analysis",
            Operation::ProposeProject { .. } => "propose_project",
            Operation::Approve { .. } => "approve",
            Operation::StartPhase { .. } => "start_phase",
            Operation::CompletePhase { .. } => "complete_phase",
            Operation::RequestClose { .. } => "request_close",
            Operation::ConfirmClose { .. } => "confirm_close",
            Operation::SubmitFeedback { .. } => "submit_feedback",
            Operation::LogIncident { .. } => "log_incident",
            Operation::AdvanceIncident { .. } => "advance_incident",
        }
    }
}

/// What a committed operation produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Navigation or selection changed
    SessionChanged,
    /// New analysis stored
    AnalysisRecorded(AnalysisId),
    /// New project created
    ProjectProposed(ProjectId),
    /// Project replaced by id
    ProjectUpdated(ProjectId),
    /// Close ticket issued; state unchanged
    CloseRequested(CloseTicket),
    /// Project archived
    ProjectClosed(ProjectId),
    /// Feedback stored
    FeedbackSubmitted(FeedbackId),
    /// Incident stored
    IncidentLogged(String),
    /// Incident status changed
    IncidentUpdated(String),
}

/// Successor state plus outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// New state
    pub state: AppState,
    /// Outcome
    pub outcome: Outcome,
}

impl Transition {
    fn new(state: AppState, outcome: Outcome) -> Self {
        Self { state, outcome }
    }
}

/// Pure session engine
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    catalog: Arc<Catalog>,
}

impl Engine {
    /// Create engine
    #[must_use]
    pub fn new(config: EngineConfig, catalog: Arc<Catalog>) -> Self {
        Self { config, catalog }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reference catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fresh guest session
    #[must_use]
    pub fn initial_state(&self) -> AppState {
        AppState::new(&self.catalog)
    }

    /// Apply one operation at `now`
    ///
    /// # Errors
    /// Any `SessionError`; `state` is unchanged in every case
    pub fn apply(
        &self,
        state: &AppState,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> Result<Transition, SessionError> {
        let name = operation.name();
        let role = state.role();
        let result = match operation.capability() {
            Some(capability) => access::authorize(role, capability)
                .map_err(SessionError::from)
                .and_then(|()| self.dispatch(state, operation, now)),
            None => self.dispatch(state, operation, now),
        };
        match &result {
            Ok(transition) => {
                counter!("vayu_session_operations_total", "op" => name, "result" => "ok")
                    .increment(1);
                info!(op = name, %role, outcome = ?transition.outcome, "operation committed");
            }
            Err(err) => {
                counter!("vayu_session_operations_total", "op" => name, "result" => err.kind())
                    .increment(1);
                warn!(op = name, %role, error = %err, "operation rejected");
            }
        }
        result
    }

    fn dispatch(
        &self,
        state: &AppState,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> Result<Transition, SessionError> {
        match operation {
            Operation::Login(user) => {
                let view = access::view_after_login(user.role, state.view);
                Ok(Transition::new(
                    AppState {
                        user: Some(user),
                        view,
                        ..state.clone()
                    },
                    Outcome::SessionChanged,
                ))
            }
            Operation::Logout => Ok(Transition::new(
                AppState {
                    user: None,
                    view: AppView::Home,
                    ..state.clone()
                },
                Outcome::SessionChanged,
            )),
            Operation::SelectCity(name) => self.select_city(state, &name),
            Operation::SelectZone(zone) => {
                if !self.catalog.zone_in_city(&state.selected_city, &zone) {
                    return Err(SessionError::ZoneNotFound(zone));
                }
                Ok(Transition::new(
                    AppState {
                        selected_zone: zone,
                        ..state.clone()
                    },
                    Outcome::SessionChanged,
                ))
            }
            Operation::Navigate(view) => {
                access::authorize_view(state.role(), view)?;
                Ok(Transition::new(
                    AppState {
                        view,
                        ..state.clone()
                    },
                    Outcome::SessionChanged,
                ))
            }
            Operation::OpenInterventions { analysis } => {
                state.analysis(&analysis)?;
                Ok(Transition::new(
                    AppState {
                        view: AppView::Solutions,
                        pending_analysis: Some(analysis),
                        ..state.clone()
                    },
                    Outcome::SessionChanged,
                ))
            }
            Operation::RecordAnalysis {
                zone,
                draft,
                evidence,
            } => self.record_analysis(state, zone, draft, evidence, now),
            Operation::ProposeProject { analysis, draft } => {
                let basis = state.analysis(&analysis)?;
                let project = lifecycle::create_project(
                    draft,
                    basis,
                    now.date_naive(),
                    &self.config.untitled_project_title,
                )?;
                let id = project.id.clone();
                Ok(Transition::new(
                    AppState {
                        projects: state.projects.insert_front(project),
                        ..state.clone()
                    },
                    Outcome::ProjectProposed(id),
                ))
            }
            Operation::Approve { project } => {
                let next = lifecycle::approve(state.project(&project)?)?;
                Ok(Self::replace_project(state, next))
            }
            Operation::StartPhase {
                project,
                phase,
                assignee,
            } => {
                let current = state.project(&project)?;
                let lead = assignee
                    .filter(|a| !a.trim().is_empty())
                    .or_else(|| state.user_name().map(str::to_string))
                    .unwrap_or_default();
                let next = lifecycle::assign_and_start(current, &phase, &lead)?;
                Ok(Self::replace_project(state, next))
            }
            Operation::CompletePhase { project, phase } => {
                let next = lifecycle::complete_phase(state.project(&project)?, &phase)?;
                Ok(Self::replace_project(state, next))
            }
            Operation::RequestClose { project } => {
                let ticket = close::request_close(state.project(&project)?, now)?;
                Ok(Transition::new(
                    state.clone(),
                    Outcome::CloseRequested(ticket),
                ))
            }
            Operation::ConfirmClose { ticket } => {
                let current = state.project(&ticket.project_id)?;
                let next = close::confirm_close(
                    current,
                    &ticket,
                    now,
                    self.config.close_ticket_ttl_secs,
                )?;
                let id = next.id.clone();
                Ok(Transition::new(
                    AppState {
                        projects: state.projects.upsert(next),
                        ..state.clone()
                    },
                    Outcome::ProjectClosed(id),
                ))
            }
            Operation::SubmitFeedback { kind, message } => {
                let feedback =
                    Feedback::submit(state.selected_zone.clone(), kind, &message, now)?;
                let id = feedback.id.clone();
                let mut feed = state.feedback.clone();
                feed.push_front(feedback);
                Ok(Transition::new(
                    AppState {
                        feedback: feed,
                        ..state.clone()
                    },
                    Outcome::FeedbackSubmitted(id),
                ))
            }
            Operation::LogIncident {
                title,
                description,
                priority,
            } => {
                let incident = community::log_incident(
                    &state.incidents,
                    &title,
                    &description,
                    priority,
                    state.user_name().unwrap_or("Unknown"),
                    now,
                )?;
                let id = incident.id.clone();
                let mut incidents = state.incidents.clone();
                incidents.push_front(incident);
                Ok(Transition::new(
                    AppState {
                        incidents,
                        ..state.clone()
                    },
                    Outcome::IncidentLogged(id),
                ))
            }
            Operation::AdvanceIncident { id, to } => {
                let index = state
                    .incidents
                    .iter()
                    .position(|i| i.id == id)
                    .ok_or_else(|| SessionError::IncidentNotFound(id.clone()))?;
                let next = state.incidents[index].advance(to)?;
                Ok(Transition::new(
                    AppState {
                        incidents: state.incidents.update(index, next),
                        ..state.clone()
                    },
                    Outcome::IncidentUpdated(id),
                ))
            }
        }
    }

    fn select_city(&self, state: &AppState, name: &str) -> Result<Transition, SessionError> {
        let zone = self
            .catalog
            .city(name)
            .and_then(|c| c.zones.first())
            .ok_or_else(|| SessionError::CityNotFound(name.to_string()))?;
        Ok(Transition::new(
            AppState {
                selected_city: zone.city.clone(),
                selected_zone: zone.id.clone(),
                ..state.clone()
            },
            Outcome::SessionChanged,
        ))
    }

    fn record_analysis(
        &self,
        state: &AppState,
        zone: ZoneId,
        draft: AnalysisDraft,
        evidence: Evidence,
        now: DateTime<Utc>,
    ) -> Result<Transition, SessionError> {
        if self.catalog.zone(&zone).is_none() {
            return Err(SessionError::ZoneNotFound(zone));
        }
        if draft.summary.trim().is_empty() {
            return Err(SessionError::InvalidInput("analysis summary is empty".into()));
        }
        let report = AnalysisReport::from_draft(
            draft,
            zone,
            now,
            state.user_name().map(str::to_string),
            evidence,
        );
        let id = report.id.clone();
        Ok(Transition::new(
            AppState {
                analyses: state.analyses.insert_front(report),
                ..state.clone()
            },
            Outcome::AnalysisRecorded(id),
        ))
    }

    fn replace_project(state: &AppState, project: InterventionProject) -> Transition {
        let id = project.id.clone();
        Transition::new(
            AppState {
                projects: state.projects.upsert(project),
                ..state.clone()
            },
            Outcome::ProjectUpdated(id),
        )
    }

    /// Pending projects of the selected zone
    #[must_use]
    pub fn pending<'s>(&self, state: &'s AppState) -> Vec<&'s InterventionProject> {
        views::pending(&state.projects, &state.selected_zone)
    }

    /// Active projects of the selected zone with progress
    #[must_use]
    pub fn active<'s>(&self, state: &'s AppState) -> Vec<ActiveProject<'s>> {
        views::active(&state.projects, &state.selected_zone)
    }

    /// Archived projects of the selected zone
    #[must_use]
    pub fn archive<'s>(
        &self,
        state: &'s AppState,
        filter: ArchiveFilter,
    ) -> Vec<&'s InterventionProject> {
        views::archive(&state.projects, &state.selected_zone, filter)
    }

    /// Analyses of the selected zone a new project may be based on
    #[must_use]
    pub fn recent_analyses<'s>(
        &self,
        state: &'s AppState,
        now: DateTime<Utc>,
    ) -> Vec<&'s AnalysisReport> {
        state.analyses.recent_for_zone(
            &state.selected_zone,
            now,
            self.config.recent_analysis_window_days,
            state.pending_analysis.as_ref(),
        )
    }

    /// Report listing
    #[must_use]
    pub fn reports(&self, state: &AppState, filter: &ReportFilter) -> Vec<ReportItem> {
        reports::list_reports(&self.catalog, &state.analyses, &state.projects, filter)
    }

    /// Cause breakdown of an analysis
    ///
    /// # Errors
    /// - `SessionError::Access` for guests
    /// - `SessionError::AnalysisNotFound`
    pub fn analysis_details<'s>(
        &self,
        state: &'s AppState,
        id: &AnalysisId,
    ) -> Result<&'s AnalysisReport, SessionError> {
        access::authorize(state.role(), Capability::ViewAnalysisDetails)?;
        state.analysis(id)
    }

    /// Report built from `source`, for download
    ///
    /// # Errors
    /// - `SessionError::Access` for guests
    /// - `SessionError::AnalysisNotFound` or `SessionError::ProjectNotFound`
    ///   when no listed report comes from `source`
    pub fn download_report(
        &self,
        state: &AppState,
        source: &ReportSource,
    ) -> Result<ReportItem, SessionError> {
        access::authorize(state.role(), Capability::DownloadReports)?;
        let item = reports::all_reports(&self.catalog, &state.analyses, &state.projects)
            .into_iter()
            .find(|item| &item.source == source)
            .ok_or_else(|| match source {
                ReportSource::Analysis(id) => SessionError::AnalysisNotFound(id.clone()),
                ReportSource::Project(id) => SessionError::ProjectNotFound(id.clone()),
            })?;
        info!(role = %state.role(), title = %item.title, "report downloaded");
        Ok(item)
    }

    /// Zone shown in the location bar; `None` on views that hide it
    #[must_use]
    pub fn location_context(&self, state: &AppState) -> Option<&Zone> {
        if state.view.hides_location_context() {
            return None;
        }
        self.catalog.zone(&state.selected_zone)
    }
}
