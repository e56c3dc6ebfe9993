use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How the raw provider payload was interpreted.
///
/// `Fallback` means no known response shape matched. The result is still
/// well-formed (empty predictions, captured payload); only its summary text
/// degrades to a diagnostic excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParseOutcome {
    Recognized,
    Fallback,
}

/// A single species prediction from the identification provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpeciesPrediction {
    pub common_name: String,
    pub scientific_name: String,
    /// Provider-reported probability in [0,1]
    pub confidence: f64,
}

/// A single disease prediction, with optional treatment guidance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiseasePrediction {
    pub name: String,
    /// Provider-reported probability in [0,1]
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub treatments: Vec<String>,
}

/// Canonical, shape-independent identification result. Immutable once
/// produced: every provider response normalizes into this structure, and
/// everything downstream (gate, context builder, summaries) reads only this.
///
/// Confidence values stay as [0,1] floats here; percentage formatting is
/// presentation-only (see [`format_percent`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentificationResult {
    pub species: Vec<SpeciesPrediction>,
    pub diseases: Vec<DiseasePrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub recommendations: Vec<String>,
    /// Opaque captured provider response, kept for audit and debugging.
    /// Never parsed downstream.
    pub raw_payload: serde_json::Value,
    pub parse_outcome: ParseOutcome,
}

/// Longest raw-payload excerpt embedded in a fallback summary.
const RAW_EXCERPT_CHARS: usize = 200;

impl IdentificationResult {
    /// Result for a payload no adapter recognized, or for a failed provider
    /// call. Empty predictions gate to symptom elicitation downstream, so a
    /// provider outage degrades into the same conversational path as a
    /// low-confidence identification.
    pub fn fallback(raw_payload: serde_json::Value) -> Self {
        Self {
            species: Vec::new(),
            diseases: Vec::new(),
            health_status: None,
            recommendations: Vec::new(),
            raw_payload,
            parse_outcome: ParseOutcome::Fallback,
        }
    }

    /// Render the human-readable analysis summary shown to the user and
    /// embedded in injected model context.
    pub fn summary(&self) -> String {
        let mut out = String::from("Crop Analysis Results:\n");

        if self.parse_outcome == ParseOutcome::Fallback {
            out.push_str("\nUnable to parse crop identification results.\n");
            out.push_str(&format!(
                "Raw response available for debugging: {}...\n",
                excerpt(&self.raw_payload, RAW_EXCERPT_CHARS)
            ));
            return out.trim_end().to_string();
        }

        if !self.species.is_empty() {
            out.push_str("\nIdentified Crops:\n");
            for species in &self.species {
                out.push_str(&format!(
                    "- {} ({}): {} confidence\n",
                    species.common_name,
                    species.scientific_name,
                    format_percent(species.confidence)
                ));
            }
        }

        if !self.diseases.is_empty() {
            out.push_str("\nPlant Health Conditions:\n");
            for disease in &self.diseases {
                out.push_str(&format!(
                    "- {}: {} confidence\n",
                    disease.name,
                    format_percent(disease.confidence)
                ));
                if let Some(description) = &disease.description {
                    out.push_str(&format!("  Description: {description}\n"));
                }
                if !disease.treatments.is_empty() {
                    out.push_str("  Recommended treatments:\n");
                    for treatment in &disease.treatments {
                        out.push_str(&format!("  • {treatment}\n"));
                    }
                }
            }
        } else if !self.species.is_empty() {
            out.push_str("\nNo diseases detected. The plant appears healthy.\n");
        }

        if let Some(status) = &self.health_status {
            out.push_str(&format!("\nOverall Plant Health: {status}\n"));
        }
        if !self.recommendations.is_empty() {
            out.push_str("General Recommendations:\n");
            for recommendation in &self.recommendations {
                out.push_str(&format!("- {recommendation}\n"));
            }
        }

        out.trim_end().to_string()
    }
}

/// Format a [0,1] confidence as a two-decimal percentage, e.g. `91.00%`.
/// Presentation-time only; the canonical structure never stores percentages.
pub fn format_percent(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

fn excerpt(value: &serde_json::Value, limit: usize) -> String {
    value.to_string().chars().take(limit).collect()
}
