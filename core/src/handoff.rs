use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identification::{
    DiseasePrediction, IdentificationResult, ParseOutcome, SpeciesPrediction,
};

/// Interchange file written by the out-of-band capture step and read when a
/// new chat session is seeded from it.
///
/// Two forms exist in the wild: the full form with structured `crops` /
/// `diseases` lists, and a simplified form carrying only a pre-rendered
/// `crop_summary`. Confidences in this file are 0-100 percentages (the
/// capture step writes them that way); they are converted back to [0,1] when
/// the handoff becomes a canonical identification. Unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisHandoff {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub crops: Vec<HandoffCrop>,
    #[serde(default)]
    pub diseases: Vec<HandoffDisease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_summary: Option<String>,
    #[serde(default)]
    pub raw_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffCrop {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scientific_name: String,
    /// Percentage in [0,100]
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffDisease {
    #[serde(default)]
    pub name: String,
    /// Percentage in [0,100]
    #[serde(default)]
    pub confidence: f64,
}

impl AnalysisHandoff {
    /// Summary text for seeding a session. The simplified form's
    /// pre-rendered summary wins; otherwise one is rendered from the
    /// structured lists in the capture step's format.
    pub fn summary(&self) -> String {
        if let Some(summary) = &self.crop_summary {
            return summary.trim_end().to_string();
        }

        let mut out = String::from("Crop Analysis Results:\n");
        if !self.crops.is_empty() {
            out.push_str("\nIdentified Crops:\n");
            for crop in &self.crops {
                out.push_str(&format!(
                    "- {} ({}): {:.2}% confidence\n",
                    crop.name, crop.scientific_name, crop.confidence
                ));
            }
        }
        if !self.diseases.is_empty() {
            out.push_str("\nPlant Health Conditions:\n");
            for disease in &self.diseases {
                out.push_str(&format!(
                    "- {}: {:.2}% confidence\n",
                    disease.name, disease.confidence
                ));
            }
        } else if !self.crops.is_empty() {
            out.push_str("\nNo diseases detected. The plant appears healthy.\n");
        }
        out.trim_end().to_string()
    }

    /// Convert into the canonical structure so a seeded session carries a
    /// pending identification like any other. A simplified-form handoff has
    /// no structured predictions and maps to a fallback result.
    pub fn to_identification(&self) -> IdentificationResult {
        if self.crops.is_empty() && self.diseases.is_empty() {
            return IdentificationResult::fallback(self.raw_data.clone());
        }

        IdentificationResult {
            species: self
                .crops
                .iter()
                .map(|crop| SpeciesPrediction {
                    common_name: crop.name.clone(),
                    scientific_name: crop.scientific_name.clone(),
                    confidence: (crop.confidence / 100.0).clamp(0.0, 1.0),
                })
                .collect(),
            diseases: self
                .diseases
                .iter()
                .map(|disease| DiseasePrediction {
                    name: disease.name.clone(),
                    confidence: (disease.confidence / 100.0).clamp(0.0, 1.0),
                    description: None,
                    treatments: Vec::new(),
                })
                .collect(),
            health_status: None,
            recommendations: Vec::new(),
            raw_payload: self.raw_data.clone(),
            parse_outcome: ParseOutcome::Recognized,
        }
    }
}
