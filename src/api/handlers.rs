use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{OwnedGame, Recommendation},
    services::presentation::{render_view, ProfileView, SortMode},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamProxyRequest {
    pub steam_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub games: Vec<OwnedGame>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub profile: String,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub sort: SortMode,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub view: ProfileView,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Proxy the owned-games lookup, returning Steam's JSON verbatim
pub async fn steam_owned_games(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SteamProxyRequest>,
) -> AppResult<Json<Value>> {
    let steam_id = request.steam_id.trim();
    if steam_id.is_empty() {
        return Err(AppError::InvalidInput("steamId is required".to_string()));
    }

    tracing::info!(request_id = %request_id, steam_id = %steam_id, "Proxying owned-games request");

    let body = state.pipeline.library().fetch_raw(steam_id).await?;
    Ok(Json(body))
}

/// Run the configured recommendation policy over a supplied library
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    let recommendations = state.pipeline.recommender().recommend(&request.games).await?;
    Ok(Json(RecommendResponse { recommendations }))
}

/// Start a new submission cycle for a session and return its view
///
/// Session ids are issued by the server. A request naming a `session_id` the
/// server does not hold (never issued, or evicted after idling) is rejected
/// rather than creating a session under a client-chosen id.
pub async fn submit_profile(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ViewQuery>,
    Json(request): Json<SubmissionRequest>,
) -> AppResult<Json<SessionResponse>> {
    let session_id = match request.session_id {
        Some(id) if state.sessions.contains(id).await => id,
        Some(id) => return Err(AppError::NotFound(format!("Session {} not found", id))),
        None => Uuid::new_v4(),
    };

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        "Processing profile submission"
    );

    let view_state = state
        .pipeline
        .submit(&state.sessions, session_id, &request.profile)
        .await;

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        phase = ?view_state.phase,
        "Submission completed"
    );

    Ok(Json(SessionResponse {
        session_id,
        view: render_view(&view_state, query.sort, state.unplayed_display_limit),
    }))
}

/// Re-render a session's current view with the requested sort order
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<SessionResponse>> {
    let view_state = state
        .sessions
        .snapshot(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

    Ok(Json(SessionResponse {
        session_id,
        view: render_view(&view_state, query.sort, state.unplayed_display_limit),
    }))
}
