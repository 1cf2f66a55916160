use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{InBodyData, ManualEntryRequest, ScanRequest};
use super::services;
use crate::errors::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inbody", get(list_entries).post(add_entry))
        .route("/inbody/scan", post(scan_sheet))
        .route("/inbody/:id", delete(delete_entry))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<InBodyData>>, ApiError> {
    Ok(Json(services::list(&state).await?))
}

#[instrument(skip(state))]
pub async fn add_entry(
    State(state): State<AppState>,
    Json(body): Json<ManualEntryRequest>,
) -> Result<(StatusCode, Json<InBodyData>), ApiError> {
    let entry = services::add_manual(&state, body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, body))]
pub async fn scan_sheet(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> Result<(StatusCode, Json<InBodyData>), ApiError> {
    let entry = services::scan(&state, body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn delete_entry(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    services::delete(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
