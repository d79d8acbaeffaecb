use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::logging::SharedLogger;
use crate::providers::PROVIDERS;
use crate::proxy::{self, HttpSender};
use crate::translate::types::ChatRequest;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const CHAT_PATH: &str = "/api/chat";
pub const PROVIDERS_PATH: &str = "/api/providers";
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub sender: Arc<dyn HttpSender>,
    pub logger: SharedLogger,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_descriptor))
        .route(CHAT_PATH, post(handle_chat))
        .route(PROVIDERS_PATH, get(handle_providers))
        .route(HEALTH_PATH, get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            state
                .logger
                .warn("server", format!("Failed to parse request: {}", e));
            return RelayError::validation(format!("Invalid request body: {}", e)).into_response();
        }
    };

    let outcome = proxy::dispatch(
        &req,
        &state.config.endpoints,
        state.sender.as_ref(),
        &state.logger,
    )
    .await;

    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(outcome.result)).into_response()
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Chat relay is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn handle_descriptor() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            format!("POST {}", CHAT_PATH),
            format!("GET {}", PROVIDERS_PATH),
            format!("GET {}", HEALTH_PATH),
        ],
    }))
}

async fn handle_providers() -> Json<serde_json::Value> {
    let providers: Vec<serde_json::Value> = PROVIDERS
        .iter()
        .map(|spec| {
            serde_json::json!({
                "id": spec.provider,
                "defaultModel": spec.default_model,
                "auth": spec.auth,
            })
        })
        .collect();

    Json(serde_json::json!({ "providers": providers }))
}
