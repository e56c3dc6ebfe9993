/// Provider endpoints and credentials, resolved once at startup from the
/// environment. API keys are required; everything else has a default
/// matching the public providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub identification_url: String,
    pub identification_api_key: String,
    pub completion_url: String,
    pub completion_api_key: String,
    pub completion_model: String,
    pub completion_referer: String,
    pub completion_title: String,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            identification_url: env_or(
                "CROPCHAT_IDENTIFICATION_URL",
                "https://api.deepleaf.io/analyze",
            ),
            identification_api_key: std::env::var("CROPCHAT_IDENTIFICATION_API_KEY")
                .expect("CROPCHAT_IDENTIFICATION_API_KEY must be set"),
            completion_url: env_or(
                "CROPCHAT_COMPLETION_URL",
                "https://openrouter.ai/api/v1/chat/completions",
            ),
            completion_api_key: std::env::var("CROPCHAT_COMPLETION_API_KEY")
                .expect("CROPCHAT_COMPLETION_API_KEY must be set"),
            completion_model: env_or("CROPCHAT_COMPLETION_MODEL", "deepseek/deepseek-chat:free"),
            completion_referer: env_or("CROPCHAT_COMPLETION_REFERER", "http://localhost:8000"),
            completion_title: env_or("CROPCHAT_COMPLETION_TITLE", "Crop Disease ChatBot"),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
