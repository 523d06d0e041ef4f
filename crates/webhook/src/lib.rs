//! HTTP surface (§4.15–§4.16, §6.2): webhook intake, inline PR analysis,
//! and the SSE healing gateway, assembled behind one `axum::Router`.

pub mod error;
pub mod heal_gateway;
pub mod intake;
pub mod rate_limit;
pub mod results;
pub mod signature;
pub mod state;

use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::IntakeError;
pub use state::{AppConfig, AppState};

/// Builds the full HTTP surface (§6.2): `/webhook`, `/heal`, `/heal/results`.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(intake::webhook_handler))
        .route(
            "/heal",
            get(heal_gateway::heal_readiness_handler).post(heal_gateway::heal_handler),
        )
        .route(
            "/heal/results",
            get(heal_gateway::get_results_handler).post(heal_gateway::post_results_handler),
        )
        .layer(middleware::from_fn_with_state(Arc::clone(&state), rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Sliding-window rate limiting keyed on client IP (§5), applied ahead of
/// every route. A 429 carries `Retry-After`.
async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();
    match state.rate_limiter.check(&key).await {
        Ok(()) => next.run(request).await,
        Err(status) => (
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", status.retry_after_secs.to_string())],
            Json(json!({ "error": "rate limit exceeded" })),
        )
            .into_response(),
    }
}
