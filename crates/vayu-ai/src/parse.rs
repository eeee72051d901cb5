//! Model output validation
//!
//! Raw text goes through four gates before it may reach the engine:
//! fence stripping, JSON parsing, schema validation against the wire types
//! below, and semantic checks the schema cannot express.

use crate::error::ParseError;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vayu_core::{AnalysisCause, AnalysisDraft, PhaseTemplate, ProjectDraft};

static FENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").ok());

/// One suspected cause as the model reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CauseResponse {
    /// Source name
    pub factor: String,
    /// Confidence 0-100
    #[schemars(range(min = 0, max = 100))]
    pub confidence: f64,
    /// Explanation citing sensor, audio, visual or web evidence
    pub reasoning: String,
}

/// Analysis output contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResponse {
    /// Executive summary citing specific evidence
    pub summary: String,
    /// Primary actionable advice
    pub recommendation: String,
    /// Causes, most relevant first
    pub causes: Vec<CauseResponse>,
}

/// One phase as the model reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhaseResponse {
    /// Phase name
    pub name: String,
    /// Phase description
    pub description: String,
    /// Action items
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Plan output contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanResponse {
    /// Project title
    pub title: String,
    /// Strategic notes citing local regulations
    #[serde(default)]
    pub notes: String,
    /// Ordered phases
    #[schemars(length(min = 1))]
    pub phases: Vec<PhaseResponse>,
}

/// JSON schema of a wire type
#[must_use]
pub fn output_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_default()
}

/// Text inside the first Markdown code fence, or the whole text
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    FENCE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
        .trim()
}

fn validate_against<T: JsonSchema + DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let body = strip_fences(text);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    let value: Value = serde_json::from_str(body)?;
    let schema = output_schema::<T>();
    let compiled =
        JSONSchema::compile(&schema).map_err(|e| ParseError::Schema(vec![e.to_string()]))?;
    if let Err(errors) = compiled.validate(&value) {
        return Err(ParseError::Schema(errors.map(|e| e.to_string()).collect()));
    }
    Ok(serde_json::from_value(value)?)
}

fn require(condition: bool, message: impl Into<String>) -> Result<(), ParseError> {
    if condition {
        Ok(())
    } else {
        Err(ParseError::Semantic(message.into()))
    }
}

/// Validate analysis output
///
/// # Errors
/// Any `ParseError` gate
pub fn parse_analysis(text: &str) -> Result<AnalysisDraft, ParseError> {
    let response: AnalysisResponse = validate_against(text)?;
    require(!response.summary.trim().is_empty(), "summary is blank")?;
    let causes = response
        .causes
        .into_iter()
        .map(|c| {
            require(!c.factor.trim().is_empty(), "cause factor is blank")?;
            require(
                c.confidence.is_finite() && (0.0..=100.0).contains(&c.confidence),
                format!("confidence {} out of range", c.confidence),
            )?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let confidence = c.confidence.round() as u8;
            Ok(AnalysisCause::new(c.factor.trim(), confidence, c.reasoning))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(AnalysisDraft {
        summary: response.summary,
        recommendation: response.recommendation,
        causes,
    })
}

/// Validate plan output
///
/// # Errors
/// Any `ParseError` gate
pub fn parse_plan(text: &str) -> Result<ProjectDraft, ParseError> {
    let response: PlanResponse = validate_against(text)?;
    require(!response.phases.is_empty(), "plan has no phases")?;
    let phases = response
        .phases
        .into_iter()
        .map(|p| {
            require(!p.name.trim().is_empty(), "phase name is blank")?;
            Ok(PhaseTemplate {
                name: p.name.trim().to_string(),
                description: p.description,
                actions: p
                    .actions
                    .into_iter()
                    .filter(|a| !a.trim().is_empty())
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(ProjectDraft {
        title: response.title,
        notes: response.notes,
        phases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ANALYSIS: &str = r#"{
        "summary": "Construction dust near the metro site",
        "recommendation": "Enforce dust screens",
        "causes": [
            {"factor": "Construction", "confidence": 85, "reasoning": "PM10/PM2.5 ratio 2.1"},
            {"factor": "Traffic", "confidence": 40.4, "reasoning": "Horns in audio"}
        ]
    }"#;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {}  "), "{}");
        assert_eq!(strip_fences("Here you go:\n```json\n[]\n```\nThanks"), "[]");
    }

    #[test]
    fn parses_fenced_analysis() {
        let draft = parse_analysis(&format!("```json\n{ANALYSIS}\n```")).unwrap();
        assert_eq!(draft.causes.len(), 2);
        assert_eq!(draft.causes[0].confidence, 85);
        assert_eq!(draft.causes[1].confidence, 40);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let text = ANALYSIS.replace("85", "185");
        assert!(matches!(parse_analysis(&text), Err(ParseError::Schema(_))));
    }

    #[test]
    fn rejects_missing_fields_and_garbage() {
        assert!(matches!(
            parse_analysis(r#"{"summary": "x"}"#),
            Err(ParseError::Schema(_))
        ));
        assert!(matches!(parse_analysis("not json"), Err(ParseError::Json(_))));
        assert!(matches!(parse_analysis("```json\n```"), Err(ParseError::Empty)));
    }

    #[test]
    fn plan_needs_named_phases() {
        let ok = r#"{"title": "Dust Control", "phases": [
            {"name": "Phase 1: Immediate", "description": "Contain", "actions": ["Water sprinkling", " "]}
        ]}"#;
        let draft = parse_plan(ok).unwrap();
        assert_eq!(draft.notes, "");
        assert_eq!(draft.phases[0].actions, vec!["Water sprinkling".to_string()]);

        let empty = r#"{"title": "t", "notes": "", "phases": []}"#;
        assert!(matches!(parse_plan(empty), Err(ParseError::Schema(_))));

        let blank = r#"{"title": "t", "phases": [{"name": " ", "description": "d"}]}"#;
        assert!(matches!(parse_plan(blank), Err(ParseError::Semantic(_))));
    }
}
