use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use cropchat_core::handoff::{AnalysisHandoff, HandoffCrop, HandoffDisease};
use cropchat_core::identification::IdentificationResult;
use cropchat_core::normalize::normalize;

use crate::util::{client, exit_error};

/// Run the out-of-band capture step: post an image file to the
/// identification provider, print the rendered summary, and write the
/// full-form handoff file the chat server can seed new sessions from
/// (`CROPCHAT_HANDOFF_FILE`).
pub async fn run(provider_url: &str, api_key: &str, image: &Path, output: &Path) -> i32 {
    let image_bytes = match std::fs::read(image) {
        Ok(bytes) => bytes,
        Err(err) => exit_error(
            &format!("Failed to read image '{}': {err}", image.display()),
            None,
        ),
    };
    let encoded = BASE64.encode(&image_bytes);

    let response = match client()
        .post(provider_url)
        .bearer_auth(api_key)
        .json(&json!({ "image": encoded }))
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            let body = json!({
                "error": "connection_error",
                "message": format!("{err}"),
                "docs_hint": "Check CROPCHAT_IDENTIFICATION_URL and your network connection."
            });
            eprintln!("{}", serde_json::to_string_pretty(&body).unwrap());
            return 3;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let body = json!({
            "error": "provider_error",
            "message": format!("Identification provider returned status {status}"),
            "detail": detail,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap());
        return if status.is_client_error() { 1 } else { 2 };
    }

    let raw: serde_json::Value = match response.json().await {
        Ok(value) => value,
        Err(err) => exit_error(&format!("Provider response was not JSON: {err}"), None),
    };

    let result = normalize(&raw);
    println!("{}", result.summary());

    let handoff = build_handoff(&result, raw, image);
    let rendered = serde_json::to_string_pretty(&handoff).unwrap();
    if let Err(err) = std::fs::write(output, rendered) {
        exit_error(
            &format!("Failed to write handoff '{}': {err}", output.display()),
            None,
        );
    }
    println!("\nHandoff written to {}", output.display());

    0
}

/// Full-form interchange payload. Confidences are written as two-decimal
/// percentages, the format the chat server's seeding path expects.
fn build_handoff(
    result: &IdentificationResult,
    raw: serde_json::Value,
    image: &Path,
) -> AnalysisHandoff {
    AnalysisHandoff {
        success: true,
        crops: result
            .species
            .iter()
            .map(|species| HandoffCrop {
                name: species.common_name.clone(),
                scientific_name: species.scientific_name.clone(),
                confidence: round2(species.confidence * 100.0),
            })
            .collect(),
        diseases: result
            .diseases
            .iter()
            .map(|disease| HandoffDisease {
                name: disease.name.clone(),
                confidence: round2(disease.confidence * 100.0),
            })
            .collect(),
        crop_summary: None,
        raw_data: raw,
        image_filename: image
            .file_name()
            .map(|name| name.to_string_lossy().to_string()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn handoff_carries_percent_confidences_and_filename() {
        let raw = json!({
            "analysis": {
                "plant_species": [
                    {"common_name": "Tomato", "scientific_name": "Solanum lycopersicum", "confidence": 0.915}
                ],
                "diseases": [
                    {"name": "Leaf Rust", "confidence": 0.77}
                ]
            }
        });
        let result = normalize(&raw);
        let handoff = build_handoff(&result, raw, &PathBuf::from("/tmp/upload.jpg"));

        assert!(handoff.success);
        assert_eq!(handoff.crops[0].confidence, 91.5);
        assert_eq!(handoff.diseases[0].confidence, 77.0);
        assert_eq!(handoff.image_filename.as_deref(), Some("upload.jpg"));
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(91.4567), 91.46);
        assert_eq!(round2(77.0), 77.0);
    }
}
