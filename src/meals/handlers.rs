use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateMealRequest, DailySummary, MealLog, MealQuery, SuggestedCategory, UpdateMealRequest};
use super::services;
use crate::errors::ApiError;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/summary", get(daily_summary))
        .route("/meals/suggested-category", get(suggested_category))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .route("/meals/:id", put(update_meal).delete(delete_meal))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB, photos travel as base64
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<MealQuery>,
) -> Result<Json<Vec<MealLog>>, ApiError> {
    Ok(Json(services::list_meals(&state, q.date).await?))
}

#[instrument(skip(state))]
pub async fn daily_summary(
    State(state): State<AppState>,
    Query(q): Query<MealQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    Ok(Json(services::daily_summary(&state, q.date).await?))
}

#[instrument(skip(state))]
pub async fn suggested_category(State(state): State<AppState>) -> Json<SuggestedCategory> {
    Json(services::suggest(state.clock.now()))
}

#[instrument(skip(state, body), fields(has_image = body.image_b64.is_some()))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealLog>), ApiError> {
    let meal = services::create_meal(&state, body).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateMealRequest>,
) -> Result<Json<MealLog>, ApiError> {
    Ok(Json(services::update_meal(&state, &id, body).await?))
}

#[instrument(skip(state))]
pub async fn delete_meal(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    services::delete_meal(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
