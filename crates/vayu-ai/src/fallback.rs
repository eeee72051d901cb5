//! Deterministic substitutes used when generation fails

use vayu_core::{AnalysisCause, AnalysisDraft, PhaseTemplate, ProjectDraft};

/// Placeholder analysis with a zero-confidence system error cause
#[must_use]
pub fn fallback_analysis() -> AnalysisDraft {
    AnalysisDraft {
        summary: "AI service unavailable or content policy block. Falling back to sensor-only mode."
            .to_string(),
        recommendation: "Manual audit required.".to_string(),
        causes: vec![
            AnalysisCause::new(
                "System Error",
                0,
                "Could not reach the generative AI service.",
            ),
            AnalysisCause::new("Unknown", 50, "Analysis failed."),
        ],
    }
}

/// Three-phase placeholder plan to be filled in manually
#[must_use]
pub fn fallback_plan() -> ProjectDraft {
    ProjectDraft::new(
        "Manual Intervention Project (Offline)",
        "AI generation failed. Fill in the details manually and check local regulations.",
    )
    .with_phase(
        PhaseTemplate::new("Phase 1: Immediate", "Immediate actions (fallback)")
            .with_action("Assess site")
            .with_action("Check sensors"),
    )
    .with_phase(
        PhaseTemplate::new("Phase 2: Scaling", "Scaling operations (fallback)")
            .with_action("Deploy resources"),
    )
    .with_phase(
        PhaseTemplate::new("Phase 3: Long-term", "Long-term monitoring (fallback)")
            .with_action("Monitor"),
    )
}
