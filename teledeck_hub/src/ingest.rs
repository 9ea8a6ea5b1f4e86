//! HTTP ingestion bridge: a single route accepting agent status pushes and
//! forwarding them into the broadcast stream. Stateless between requests.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use tracing::{info, warn};

use crate::hub::Hub;
use crate::snapshot::Frame;

/// `POST /agent-update` only; anything else on this listener is 404,
/// including other methods on the route itself.
pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/agent-update", post(agent_update).fallback(not_found))
        .fallback(not_found)
        .with_state(hub)
}

pub async fn agent_update(State(hub): State<Arc<Hub>>, body: String) -> impl IntoResponse {
    match serde_json::from_str::<Value>(&body) {
        Ok(payload) => {
            hub.broadcast(&Frame::agent_update(payload)).await;
            info!(event = "agent_update_forwarded", bytes = body.len());
            (StatusCode::OK, "Update broadcasted")
        }
        Err(err) => {
            warn!(event = "agent_update_rejected", error = %err);
            (StatusCode::BAD_REQUEST, "Invalid JSON")
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
