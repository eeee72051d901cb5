//! Testing utilities for the Vayu workspace
//!
//! Shared fixtures, a scripted model, and session helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use vayu_ai::{GenerationError, GenerationRequest, GenerativeModel};
use vayu_catalog::{Catalog, City, HistoricalPoint, PollutantMetrics, Zone, ZoneId};
use vayu_core::{
    AnalysisCause, AnalysisDraft, AnalysisId, AppState, Engine, EngineConfig, Evidence,
    Operation, Outcome, PhaseTemplate, ProjectDraft, ProjectId, Role, User,
};

pub const KOTHRUD: &str = "pn-01";
pub const BANER: &str = "pn-02";
pub const ANAND_VIHAR: &str = "dl-01";

fn zone(id: &str, name: &str, city: &str, aqi: u32, metrics: PollutantMetrics) -> Zone {
    Zone {
        id: ZoneId::new(id),
        name: name.to_string(),
        city: city.to_string(),
        current_aqi: aqi,
        metrics,
        history: (0..3)
            .map(|i| HistoricalPoint {
                date: Utc.with_ymd_and_hms(2024, 4, 28 + i, 0, 0, 0).unwrap(),
                aqi: aqi - 10 + 5 * i,
            })
            .collect(),
        description: format!("{name} monitoring station"),
    }
}

/// Two cities, three zones
pub fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        City {
            name: "Pune".into(),
            zones: vec![
                zone(
                    KOTHRUD,
                    "Kothrud",
                    "Pune",
                    156,
                    PollutantMetrics { pm25: 65.0, pm10: 140.0, no2: 35.0, o3: 22.0 },
                ),
                zone(
                    BANER,
                    "Baner",
                    "Pune",
                    210,
                    PollutantMetrics { pm25: 95.0, pm10: 180.0, no2: 48.0, o3: 18.0 },
                ),
            ],
        },
        City {
            name: "Delhi".into(),
            zones: vec![zone(
                ANAND_VIHAR,
                "Anand Vihar",
                "Delhi",
                380,
                PollutantMetrics { pm25: 210.0, pm10: 420.0, no2: 80.0, o3: 20.0 },
            )],
        },
    ])
    .unwrap()
}

pub fn sample_engine() -> Engine {
    Engine::new(EngineConfig::default(), Arc::new(sample_catalog()))
}

pub fn scientist() -> User {
    User::new("scientist", "Dr. Meera Rao", Role::Scientist).with_title("Lead Atmospheric Scientist")
}

pub fn citizen() -> User {
    User::new("resident", "Arjun Patil", Role::Citizen)
}

/// Fixed reference instant
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
}

pub fn sample_analysis_draft() -> AnalysisDraft {
    AnalysisDraft {
        summary: "Construction dust from the metro site dominates PM10".into(),
        recommendation: "Enforce dust screens and water sprinkling".into(),
        causes: vec![
            AnalysisCause::new("Construction Dust", 85, "PM10/PM2.5 ratio above 2"),
            AnalysisCause::new("Vehicular Emissions", 40, "Evening NO2 peak"),
        ],
    }
}

/// Draft with `phases` numbered phases
pub fn sample_project_draft(phases: usize) -> ProjectDraft {
    (1..=phases).fold(
        ProjectDraft::new("Kothrud Dust Control", "Align with municipal dust rules"),
        |draft, i| {
            draft.with_phase(
                PhaseTemplate::new(format!("Phase {i}"), format!("Step {i}"))
                    .with_action(format!("Action {i}")),
            )
        },
    )
}

/// Apply and unwrap, for test scripts
pub fn step(engine: &Engine, state: &AppState, op: Operation) -> (AppState, Outcome) {
    let t = engine
        .apply(state, op, t0())
        .unwrap_or_else(|e| panic!("operation rejected: {e}"));
    (t.state, t.outcome)
}

/// Scientist session with one recorded analysis of Kothrud
pub fn session_with_analysis(engine: &Engine) -> (AppState, AnalysisId) {
    let (state, _) = step(engine, &engine.initial_state(), Operation::Login(scientist()));
    let (state, outcome) = step(
        engine,
        &state,
        Operation::RecordAnalysis {
            zone: ZoneId::new(KOTHRUD),
            draft: sample_analysis_draft(),
            evidence: Evidence::none(),
        },
    );
    match outcome {
        Outcome::AnalysisRecorded(id) => (state, id),
        other => panic!("unexpected outcome {other:?}"),
    }
}

/// Scientist session with one approved project of `phases` phases
pub fn session_with_active_project(engine: &Engine, phases: usize) -> (AppState, ProjectId) {
    let (state, analysis) = session_with_analysis(engine);
    let (state, outcome) = step(
        engine,
        &state,
        Operation::ProposeProject {
            analysis,
            draft: sample_project_draft(phases),
        },
    );
    let Outcome::ProjectProposed(project) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    let (state, _) = step(engine, &state, Operation::Approve { project: project.clone() });
    (state, project)
}

/// Model answering from a script, one entry per call
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    pub fn fail(self, err: GenerationError) -> Self {
        self.push(Err(err))
    }

    fn push(mut self, reply: Result<String, GenerationError>) -> Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    /// Sleep before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
    }
}
