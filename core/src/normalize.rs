use serde_json::Value;

use crate::identification::{
    DiseasePrediction, IdentificationResult, ParseOutcome, SpeciesPrediction,
};

/// Normalize a raw identification payload into the canonical result.
///
/// Provider responses vary across API versions: some nest predictions under
/// `analysis`, some under `results` (as a list or a single object). Each
/// known shape has its own adapter; adapters are tried in priority order and
/// the first match wins. Nothing here fails: an unrecognized payload yields a
/// `Fallback` result that still carries the captured response.
pub fn normalize(raw: &Value) -> IdentificationResult {
    for adapter in ADAPTERS {
        if let Some(extracted) = adapter(raw) {
            return extracted.into_result(raw.clone());
        }
    }
    IdentificationResult::fallback(raw.clone())
}

type Adapter = fn(&Value) -> Option<Extracted>;

/// Priority order matters: `analysis` payloads also carry other top-level
/// keys, so the most specific shape is probed first.
const ADAPTERS: &[Adapter] = &[from_analysis, from_results];

/// Predictions pulled out of one recognized shape, before the raw payload is
/// attached.
struct Extracted {
    species: Vec<SpeciesPrediction>,
    diseases: Vec<DiseasePrediction>,
    health_status: Option<String>,
    recommendations: Vec<String>,
}

impl Extracted {
    fn into_result(self, raw_payload: Value) -> IdentificationResult {
        IdentificationResult {
            species: self.species,
            diseases: self.diseases,
            health_status: self.health_status,
            recommendations: self.recommendations,
            raw_payload,
            parse_outcome: ParseOutcome::Recognized,
        }
    }
}

/// Shape: `{"analysis": {"plant_species": [..], "diseases": [..],
/// "health_assessment": {..}}}`.
fn from_analysis(raw: &Value) -> Option<Extracted> {
    let analysis = raw
        .get("analysis")?
        .as_object()
        .filter(|fields| !fields.is_empty())?;

    let species = analysis
        .get("plant_species")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(species_entry).collect())
        .unwrap_or_default();

    let diseases = analysis
        .get("diseases")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(disease_entry).collect())
        .unwrap_or_default();

    let (health_status, recommendations) = match analysis
        .get("health_assessment")
        .and_then(Value::as_object)
    {
        Some(health) => (
            health
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string),
            string_list(health.get("recommendations")),
        ),
        None => (None, Vec::new()),
    };

    Some(Extracted {
        species,
        diseases,
        health_status,
        recommendations,
    })
}

/// Shape: `{"results": [{"species": {..}, "diseases": [..]}, ..]}` (only the
/// first element is used) or `{"results": {"species": {..}, ..}}`.
fn from_results(raw: &Value) -> Option<Extracted> {
    let results = raw.get("results")?;
    let entry = match results {
        Value::Array(items) => items.first()?,
        Value::Object(_) => results,
        _ => return None,
    };

    let species = entry
        .get("species")
        .map(|value| vec![species_entry(value)])
        .unwrap_or_default();

    let diseases = entry
        .get("diseases")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(disease_entry).collect())
        .unwrap_or_default();

    Some(Extracted {
        species,
        diseases,
        health_status: None,
        recommendations: Vec::new(),
    })
}

fn species_entry(value: &Value) -> SpeciesPrediction {
    SpeciesPrediction {
        common_name: string_or(value.get("common_name"), "Unknown"),
        scientific_name: string_or(value.get("scientific_name"), ""),
        confidence: confidence_of(value),
    }
}

fn disease_entry(value: &Value) -> DiseasePrediction {
    DiseasePrediction {
        name: string_or(value.get("name"), "Unknown"),
        confidence: confidence_of(value),
        description: value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        treatments: treatments_of(value),
    }
}

/// Providers disagree on the probability key; both spellings are accepted.
/// Out-of-range values are clamped into [0,1].
fn confidence_of(value: &Value) -> f64 {
    value
        .get("confidence")
        .or_else(|| value.get("probability"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

/// `treatments` as an array, or the singular `treatment` string some
/// responses carry instead.
fn treatments_of(value: &Value) -> Vec<String> {
    if let Some(list) = value.get("treatments").and_then(Value::as_array) {
        return list
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    if let Some(single) = value.get("treatment").and_then(Value::as_str) {
        return vec![single.to_string()];
    }
    Vec::new()
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analysis_shape_extracts_species_diseases_and_health() {
        let raw = json!({
            "analysis": {
                "plant_species": [
                    {"common_name": "Tomato", "scientific_name": "Solanum lycopersicum", "confidence": 0.91}
                ],
                "diseases": [
                    {"name": "Leaf Rust", "confidence": 0.77, "treatments": ["Apply fungicide", "Remove affected leaves"]}
                ],
                "health_assessment": {
                    "status": "Fair",
                    "recommendations": ["Improve airflow"]
                }
            }
        });

        let result = normalize(&raw);
        assert_eq!(result.parse_outcome, ParseOutcome::Recognized);
        assert_eq!(result.species.len(), 1);
        assert_eq!(result.species[0].common_name, "Tomato");
        assert_eq!(result.species[0].confidence, 0.91);
        assert_eq!(result.diseases.len(), 1);
        assert_eq!(result.diseases[0].treatments.len(), 2);
        assert_eq!(result.health_status.as_deref(), Some("Fair"));
        assert_eq!(result.recommendations, vec!["Improve airflow"]);
    }

    #[test]
    fn results_list_shape_uses_first_element_only() {
        let raw = json!({
            "results": [
                {
                    "species": {"common_name": "Maize", "scientific_name": "Zea mays", "probability": 0.84},
                    "diseases": [
                        {"name": "Common Rust", "probability": 0.62, "treatment": "Apply fungicide"}
                    ]
                },
                {
                    "species": {"common_name": "Wheat", "probability": 0.12}
                }
            ]
        });

        let result = normalize(&raw);
        assert_eq!(result.parse_outcome, ParseOutcome::Recognized);
        assert_eq!(result.species.len(), 1);
        assert_eq!(result.species[0].common_name, "Maize");
        assert_eq!(result.species[0].confidence, 0.84);
        assert_eq!(result.diseases[0].treatments, vec!["Apply fungicide"]);
    }

    #[test]
    fn results_object_shape_is_used_directly() {
        let raw = json!({
            "results": {
                "species": {"common_name": "Potato", "scientific_name": "Solanum tuberosum", "probability": 0.71},
                "diseases": [{"name": "Late Blight", "probability": 0.55}]
            }
        });

        let result = normalize(&raw);
        assert_eq!(result.parse_outcome, ParseOutcome::Recognized);
        assert_eq!(result.species[0].common_name, "Potato");
        assert_eq!(result.diseases[0].name, "Late Blight");
        assert!(result.diseases[0].treatments.is_empty());
    }

    #[test]
    fn unrecognized_shape_falls_back_without_error() {
        let raw = json!({"status": "ok", "detections": []});
        let result = normalize(&raw);
        assert_eq!(result.parse_outcome, ParseOutcome::Fallback);
        assert!(result.species.is_empty());
        assert!(result.diseases.is_empty());
        assert_eq!(result.raw_payload, raw);
    }

    #[test]
    fn empty_analysis_object_is_not_a_match() {
        let result = normalize(&json!({"analysis": {}}));
        assert_eq!(result.parse_outcome, ParseOutcome::Fallback);
    }

    #[test]
    fn empty_results_list_falls_back() {
        let result = normalize(&json!({"results": []}));
        assert_eq!(result.parse_outcome, ParseOutcome::Fallback);
    }

    #[test]
    fn missing_fields_default_rather_than_fail() {
        let raw = json!({
            "analysis": {
                "plant_species": [{}],
                "diseases": [{"confidence": 1.7}]
            }
        });

        let result = normalize(&raw);
        assert_eq!(result.species[0].common_name, "Unknown");
        assert_eq!(result.species[0].scientific_name, "");
        assert_eq!(result.species[0].confidence, 0.0);
        assert_eq!(result.diseases[0].name, "Unknown");
        // clamped into [0,1]
        assert_eq!(result.diseases[0].confidence, 1.0);
    }

    #[test]
    fn confidence_key_is_tolerated_alongside_probability() {
        let raw = json!({
            "results": {"species": {"common_name": "Rice", "confidence": 0.66}}
        });
        let result = normalize(&raw);
        assert_eq!(result.species[0].confidence, 0.66);
    }
}
