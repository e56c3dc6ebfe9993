use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::util::{api_request, exit_error};

pub async fn run(
    api_url: &str,
    message: Option<&str>,
    image: Option<&Path>,
    session_id: Option<&str>,
) -> i32 {
    if message.is_none() && image.is_none() {
        exit_error(
            "Provide --message, --image, or both",
            Some("A chat turn needs text or an image to react to."),
        );
    }

    let image_base64 = image.map(|path| match std::fs::read(path) {
        Ok(bytes) => BASE64.encode(bytes),
        Err(err) => exit_error(
            &format!("Failed to read image '{}': {err}", path.display()),
            None,
        ),
    });

    let body = json!({
        "content": message,
        "image_base64": image_base64,
        "session_id": session_id,
    });

    api_request(api_url, reqwest::Method::POST, "/chat", Some(body)).await
}
