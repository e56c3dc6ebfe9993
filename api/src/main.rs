use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cropchat_core::handoff::AnalysisHandoff;

mod config;
mod error;
mod middleware;
mod providers;
mod routes;
mod sessions;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CropChat API",
        version = "0.1.0",
        description = "Crop disease identification chatbot: submit a crop photo, get a classifier-backed identification, and converse with an assistant primed with it."
    ),
    paths(
        routes::health::health_check,
        routes::chat::chat,
        routes::sessions::get_session,
    ),
    components(schemas(
        HealthResponse,
        routes::chat::ChatRequest,
        routes::chat::ChatResponse,
        routes::sessions::SessionResponse,
        cropchat_core::error::ApiError,
        cropchat_core::message::Message,
        cropchat_core::message::Role,
        cropchat_core::session::ConversationState,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Optional analysis handoff from the out-of-band capture step. Missing or
/// unreadable files are logged and ignored; a broken handoff must not keep
/// the server from starting.
fn load_handoff() -> Option<AnalysisHandoff> {
    let path = std::env::var("CROPCHAT_HANDOFF_FILE").ok()?;
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<AnalysisHandoff>(&contents) {
            Ok(handoff) => {
                tracing::info!(path = %path, "loaded analysis handoff");
                Some(handoff)
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "ignoring corrupt analysis handoff");
                None
            }
        },
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "ignoring unreadable analysis handoff");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cropchat_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let provider_config = config::ProviderConfig::from_env();
    let app_state = state::AppState {
        sessions: Arc::new(sessions::SessionStore::new(load_handoff())),
        identification: providers::identification::IdentificationClient::new(&provider_config),
        completion: providers::completion::ChatCompletionClient::new(&provider_config),
    };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Router with per-endpoint rate limiting
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::chat::router().layer(middleware::rate_limit::chat_layer()))
        .merge(routes::sessions::router().layer(middleware::rate_limit::sessions_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("CropChat API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
