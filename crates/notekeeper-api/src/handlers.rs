//! Routes: post-commit event ingestion, retrieval, health.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use notekeeper_core::{InferenceBackend, NoteEvent, RetrieveRequest};
use notekeeper_jobs::EventPublisher;
use notekeeper_search::Retriever;

use crate::error::ApiError;

/// Header the auth gateway sets to the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub publisher: EventPublisher,
    pub retriever: Arc<Retriever>,
    pub inference: Arc<dyn InferenceBackend>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/notes/:id/events/created", post(note_created))
        .route(
            "/api/v1/notes/:id/events/content-updated",
            post(note_content_updated),
        )
        .route("/api/v1/retrieve", post(retrieve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// HEALTH
// =============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let inference = match state.inference.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(subsystem = "api", component = "health", error = %e, "Inference health check failed");
            false
        }
    };

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "inference": inference,
    }))
}

// =============================================================================
// EVENT INGESTION
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentUpdatedBody {
    new_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventAccepted {
    note_id: Uuid,
    event: &'static str,
}

/// Called by the upload path after the note insert has committed.
async fn note_created(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    enqueue(&state, NoteEvent::created(id)).await
}

/// Called by the edit path after the content update has committed.
async fn note_content_updated(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ContentUpdatedBody>,
) -> Result<impl IntoResponse, ApiError> {
    enqueue(&state, NoteEvent::content_updated(id, body.new_content)).await
}

async fn enqueue(
    state: &AppState,
    event: NoteEvent,
) -> Result<(StatusCode, Json<EventAccepted>), ApiError> {
    let accepted = EventAccepted {
        note_id: event.note_id(),
        event: event.kind(),
    };
    state.publisher.publish(event).await?;
    debug!(
        subsystem = "api",
        component = "events",
        note_id = %accepted.note_id,
        event_kind = accepted.event,
        "Event enqueued"
    );
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

// =============================================================================
// RETRIEVAL
// =============================================================================

fn user_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".into()))?;
    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| ApiError::Unauthorized("Invalid X-User-Id header".into()))
}

async fn retrieve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RetrieveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let response = state
        .retriever
        .retrieve(&body.query, body.topic_id, user_id)
        .await?;
    Ok(Json(response))
}
