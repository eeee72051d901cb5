//! Analysis and plan generation with fallbacks

use crate::cancel::{CancelHandle, Cancellable};
use crate::config::AiConfig;
use crate::error::GenerationError;
use crate::fallback::{fallback_analysis, fallback_plan};
use crate::model::{GenerationRequest, GenerativeModel};
use crate::parse::{parse_analysis, parse_plan};
use crate::prompts::{analysis_request, plan_request};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};
use vayu_catalog::Zone;
use vayu_core::{AnalysisDraft, AnalysisReport, Evidence, ProjectDraft};

/// Where a draft came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Validated model output
    Model,
    /// Local substitute after a failure
    Fallback {
        /// One-line reason shown to the user
        diagnostic: String,
    },
}

/// Draft plus provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<T> {
    /// Draft
    pub value: T,
    /// Provenance
    pub source: Source,
}

impl<T> Generated<T> {
    /// Whether the draft is a fallback
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, Source::Fallback { .. })
    }

    /// Diagnostic of a fallback
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match &self.source {
            Source::Model => None,
            Source::Fallback { diagnostic } => Some(diagnostic),
        }
    }
}

/// Client over a [`GenerativeModel`]
#[derive(Clone)]
pub struct AiClient {
    model: Arc<dyn GenerativeModel>,
    config: AiConfig,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// Create client
    #[must_use]
    pub fn new(model: Arc<dyn GenerativeModel>, config: AiConfig) -> Self {
        Self { model, config }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    async fn call(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let timeout = self.config.timeout();
        debug!(model = %request.model, attachments = request.attachments.len(), "generation request");
        tokio::time::timeout(timeout, self.model.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout(timeout))?
    }

    /// Analysis without fallback
    ///
    /// # Errors
    /// Transport, policy, timeout or validation failure
    pub async fn try_analyze(
        &self,
        zone: &Zone,
        evidence: &Evidence,
    ) -> Result<AnalysisDraft, GenerationError> {
        let text = self.call(&analysis_request(&self.config, zone, evidence)).await?;
        Ok(parse_analysis(&text)?)
    }

    /// Plan without fallback
    ///
    /// # Errors
    /// Transport, policy, timeout or validation failure
    pub async fn try_plan(
        &self,
        zone: &Zone,
        analysis: &AnalysisReport,
    ) -> Result<ProjectDraft, GenerationError> {
        let text = self.call(&plan_request(&self.config, zone, analysis)).await?;
        Ok(parse_plan(&text)?)
    }

    /// Analysis, or the placeholder analysis on failure
    pub async fn analyze(&self, zone: &Zone, evidence: &Evidence) -> Generated<AnalysisDraft> {
        with_fallback("analysis", self.try_analyze(zone, evidence).await, fallback_analysis)
    }

    /// Plan, or the three-phase placeholder plan on failure
    pub async fn plan(&self, zone: &Zone, analysis: &AnalysisReport) -> Generated<ProjectDraft> {
        with_fallback("plan", self.try_plan(zone, analysis).await, fallback_plan)
    }

    /// Analysis that can be abandoned before it finishes
    #[must_use]
    pub fn spawn_analysis(
        &self,
        zone: Zone,
        evidence: Evidence,
    ) -> (CancelHandle, Cancellable<Generated<AnalysisDraft>>) {
        let client = self.clone();
        Cancellable::new(async move { client.analyze(&zone, &evidence).await })
    }

    /// Plan that can be abandoned before it finishes
    #[must_use]
    pub fn spawn_plan(
        &self,
        zone: Zone,
        analysis: AnalysisReport,
    ) -> (CancelHandle, Cancellable<Generated<ProjectDraft>>) {
        let client = self.clone();
        Cancellable::new(async move { client.plan(&zone, &analysis).await })
    }
}

fn with_fallback<T>(
    kind: &'static str,
    result: Result<T, GenerationError>,
    fallback: fn() -> T,
) -> Generated<T> {
    match result {
        Ok(value) => Generated {
            value,
            source: Source::Model,
        },
        Err(err) => {
            counter!("vayu_ai_fallbacks_total", "kind" => kind).increment(1);
            warn!(kind, error = %err, retryable = err.is_retryable(), "generation failed, using fallback");
            Generated {
                value: fallback(),
                source: Source::Fallback {
                    diagnostic: err.diagnostic(),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockGenerativeModel;
    use chrono::{TimeZone, Utc};
    use vayu_catalog::{PollutantMetrics, ZoneId};

    fn zone() -> Zone {
        Zone {
            id: ZoneId::new("pn-02"),
            name: "Baner".into(),
            city: "Pune".into(),
            current_aqi: 210,
            metrics: PollutantMetrics::default(),
            history: vec![],
            description: String::new(),
        }
    }

    fn client(mock: MockGenerativeModel) -> AiClient {
        AiClient::new(Arc::new(mock), AiConfig::default())
    }

    #[tokio::test]
    async fn valid_output_is_used() {
        let mut mock = MockGenerativeModel::new();
        mock.expect_generate()
            .withf(|req| req.grounding && req.prompt.contains("Baner"))
            .times(1)
            .returning(|_| {
                Ok(r#"{"summary":"Traffic","recommendation":"Divert","causes":[{"factor":"Vehicles","confidence":70,"reasoning":"NO2"}]}"#.to_string())
            });
        let out = client(mock).analyze(&zone(), &Evidence::none()).await;
        assert_eq!(out.source, Source::Model);
        assert_eq!(out.value.causes[0].factor, "Vehicles");
    }

    #[tokio::test]
    async fn transport_failure_falls_back() {
        let mut mock = MockGenerativeModel::new();
        mock.expect_generate()
            .returning(|_| Err(GenerationError::Transport("connection refused".into())));
        let out = client(mock).analyze(&zone(), &Evidence::none()).await;
        assert!(out.is_fallback());
        assert_eq!(out.value, fallback_analysis());
        assert_eq!(out.diagnostic(), Some("AI service unavailable: connection refused"));
    }

    #[tokio::test]
    async fn invalid_plan_falls_back() {
        let mut mock = MockGenerativeModel::new();
        mock.expect_generate()
            .returning(|_| Ok("```json\n{\"title\":\"x\",\"phases\":[]}\n```".to_string()));
        let analysis = AnalysisReport::from_draft(
            fallback_analysis(),
            ZoneId::new("pn-02"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            None,
            Evidence::none(),
        );
        let out = client(mock).plan(&zone(), &analysis).await;
        assert!(out.is_fallback());
        assert_eq!(out.value.phases.len(), 3);
    }
}
