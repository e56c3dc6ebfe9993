use serde::Deserialize;

use cropchat_core::error::ProviderError;
use cropchat_core::message::ChatMessage;

use crate::config::ProviderConfig;
use crate::providers::error_detail;

/// Client for the chat-completion provider (OpenAI-compatible wire format).
/// Sends the exact message list the context builder produced; one blocking
/// round trip per turn, no timeout, no retry.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    referer: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.completion_url.clone(),
            api_key: config.completion_api_key.clone(),
            model: config.completion_model.clone(),
            referer: config.completion_referer.clone(),
            title: config.completion_title.clone(),
        }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
            }))
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Http {
                status: status.as_u16(),
                detail: error_detail(detail),
            });
        }

        let parsed = response
            .json::<CompletionResponse>()
            .await
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))?;

        reply_text(parsed)
    }
}

/// Extract the generated text from a parsed completion response.
fn reply_text(response: CompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            ProviderError::MalformedResponse("completion contained no message content".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_text_takes_the_first_choice() {
        let parsed: CompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "gen-1",
            "choices": [
                {"message": {"role": "assistant", "content": "Try a copper-based fungicide."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }))
        .expect("completion response parses");

        assert_eq!(
            reply_text(parsed).unwrap(),
            "Try a copper-based fungicide."
        );
    }

    #[test]
    fn reply_text_rejects_empty_choices() {
        let parsed: CompletionResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(
            reply_text(parsed),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn reply_text_rejects_missing_content() {
        let parsed: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant"}}]
        }))
        .unwrap();
        assert!(matches!(
            reply_text(parsed),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
