//! Prompt construction
//!
//! System instructions stay static; everything zone-specific goes into the
//! task prompt. Each system instruction ends with the JSON schema of the
//! expected output.

use crate::config::AiConfig;
use crate::model::{Attachment, AttachmentKind, GenerationRequest};
use crate::parse::{output_schema, AnalysisResponse, PlanResponse};
use schemars::JsonSchema;
use std::fmt::Write;
use vayu_catalog::Zone;
use vayu_core::{AnalysisReport, Evidence};

const FORENSIC_ROLE: &str = "\
You are an environmental forensic scientist with live web access.
You receive up to three evidence streams for one monitoring zone:
sensor chemistry, a site image and an ambient audio recording.
Triangulate them to name the concrete pollution sources.

- Audio: machinery (construction), horns and idling engines (traffic), silence.
- Image: smoke colour (black for diesel, white for biomass), dust plumes, traffic density.
- Sensors: use PM10/PM2.5 ratios and gas levels to confirm the physical evidence.
- Web search: check local news and weather that corroborate the readings.

When streams disagree, let audio and search findings decide.";

const PLANNER_ROLE: &str = "\
You are a senior project manager for urban infrastructure.
Turn an air-quality diagnosis into an executable intervention project.

- Phase 1, Immediate: containment and mitigation within 48 hours.
- Phase 2, Scaling: process improvement and enforcement over 1-2 weeks.
- Phase 3, Long-term: structural and policy change over 1-3 months.

Keep the tone directive and operational.";

const GENERAL_POLLUTION: &str = "General Pollution";

fn with_contract<T: JsonSchema>(role: &str) -> String {
    let schema = serde_json::to_string_pretty(&output_schema::<T>()).unwrap_or_default();
    format!(
        "{role}\n\nReturn only a raw JSON object, without Markdown, that validates against this schema:\n{schema}\n"
    )
}

/// System instruction for analyses
#[must_use]
pub fn forensic_instruction() -> String {
    with_contract::<AnalysisResponse>(FORENSIC_ROLE)
}

/// System instruction for plans
#[must_use]
pub fn planner_instruction() -> String {
    with_contract::<PlanResponse>(PLANNER_ROLE)
}

/// Task prompt for an analysis of `zone`
#[must_use]
pub fn analysis_prompt(zone: &Zone, evidence: &Evidence) -> String {
    let m = &zone.metrics;
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Analyse the evidence for zone {}, {}.", zone.name, zone.city);
    let _ = writeln!(prompt, "\n[Sensors]");
    let _ = writeln!(prompt, "- AQI: {}", zone.current_aqi);
    let _ = writeln!(prompt, "- PM2.5: {} | PM10: {}", m.pm25, m.pm10);
    let _ = writeln!(prompt, "- NO2: {} | O3: {}", m.no2, m.o3);
    if !zone.description.is_empty() {
        let _ = writeln!(prompt, "- Context: {}", zone.description);
    }
    let _ = writeln!(prompt, "\n[Evidence]");
    let _ = writeln!(
        prompt,
        "{}",
        if evidence.image.is_some() {
            "- Site image attached; correlate it with the sensor values."
        } else {
            "- No visual feed."
        }
    );
    let _ = writeln!(
        prompt,
        "{}",
        if evidence.audio.is_some() {
            "- Audio attached; name the sound signatures you detect."
        } else {
            "- No audio feed."
        }
    );
    let _ = writeln!(
        prompt,
        "\nIdentify the root cause and search for recent incidents in {} that explain these readings.",
        zone.city
    );
    prompt
}

/// Task prompt for a plan derived from `analysis`
#[must_use]
pub fn plan_prompt(zone: &Zone, analysis: &AnalysisReport) -> String {
    let primary = analysis
        .primary_cause()
        .map_or(GENERAL_POLLUTION, |c| c.factor.as_str());
    format!(
        "Create an intervention project from this analysis.\n\n\
         - Zone: {zone} ({city})\n\
         - Diagnosis: {summary}\n\
         - Primary cause: {primary}\n\n\
         Search for air-quality rules currently in force in {city}, align the immediate \
         phase with them, then define the immediate, scaling and long-term phases.\n",
        zone = zone.name,
        city = zone.city,
        summary = analysis.summary,
    )
}

fn attachments(evidence: &Evidence) -> Vec<Attachment> {
    let image = evidence.image.iter().map(|h| Attachment {
        kind: AttachmentKind::Image,
        handle: h.clone(),
    });
    let audio = evidence.audio.iter().map(|h| Attachment {
        kind: AttachmentKind::Audio,
        handle: h.clone(),
    });
    image.chain(audio).collect()
}

/// Full analysis request
#[must_use]
pub fn analysis_request(config: &AiConfig, zone: &Zone, evidence: &Evidence) -> GenerationRequest {
    GenerationRequest {
        model: config.model.clone(),
        system_instruction: forensic_instruction(),
        prompt: analysis_prompt(zone, evidence),
        attachments: attachments(evidence),
        grounding: config.grounding,
    }
}

/// Full plan request
#[must_use]
pub fn plan_request(config: &AiConfig, zone: &Zone, analysis: &AnalysisReport) -> GenerationRequest {
    GenerationRequest {
        model: config.model.clone(),
        system_instruction: planner_instruction(),
        prompt: plan_prompt(zone, analysis),
        attachments: Vec::new(),
        grounding: config.grounding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vayu_catalog::{PollutantMetrics, ZoneId};

    fn zone() -> Zone {
        Zone {
            id: ZoneId::new("dl-01"),
            name: "Anand Vihar".into(),
            city: "Delhi".into(),
            current_aqi: 380,
            metrics: PollutantMetrics {
                pm25: 210.0,
                pm10: 420.0,
                no2: 80.0,
                o3: 20.0,
            },
            history: vec![],
            description: "Bus terminal and rail yard".into(),
        }
    }

    #[test]
    fn instruction_embeds_schema() {
        let text = forensic_instruction();
        assert!(text.contains("\"causes\""));
        assert!(planner_instruction().contains("\"phases\""));
    }

    #[test]
    fn analysis_prompt_mentions_evidence() {
        let with_audio = Evidence {
            image: None,
            audio: Some("rec-1".into()),
        };
        let prompt = analysis_prompt(&zone(), &with_audio);
        assert!(prompt.contains("AQI: 380"));
        assert!(prompt.contains("No visual feed"));
        assert!(prompt.contains("Audio attached"));

        let request = analysis_request(&AiConfig::default(), &zone(), &with_audio);
        assert_eq!(
            request.attachments,
            vec![Attachment {
                kind: AttachmentKind::Audio,
                handle: "rec-1".into()
            }]
        );
        assert!(request.grounding);
    }
}
