use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{LoginRequest, NavigateRequest, SessionStatus};
use super::services::{logout as clear_session, transact};
use crate::errors::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(status))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/session/view", post(navigate))
}

#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    let session = state.session.lock().await;
    Json(SessionStatus::from(&*session))
}

#[instrument(skip(state, body), fields(patient_id = %body.patient_id))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionStatus>, ApiError> {
    let mut session = state.session.lock().await;
    let staff_code = state.config.staff_code.as_str();
    transact(&state, &mut session, |s| s.login(&body.patient_id, &body.clinic_code, staff_code)).await?;
    Ok(Json(SessionStatus::from(&*session)))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionStatus>, ApiError> {
    let mut session = state.session.lock().await;
    clear_session(&state, &mut session).await?;
    Ok(Json(SessionStatus::from(&*session)))
}

#[instrument(skip(state))]
pub async fn navigate(
    State(state): State<AppState>,
    Json(body): Json<NavigateRequest>,
) -> Result<Json<SessionStatus>, ApiError> {
    let mut session = state.session.lock().await;
    session.navigate(body.view)?;
    Ok(Json(SessionStatus::from(&*session)))
}
