use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument};

use super::dto::{ProfileForm, ProfileSaved, TargetsResponse, UserProfile};
use super::targets::targets;
use crate::errors::ApiError;
use crate::session::{services::transact, View};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/profile/targets", get(get_targets))
}

#[instrument(skip(state))]
pub async fn get_profile(State(state): State<AppState>) -> Result<Json<UserProfile>, ApiError> {
    let mut session = state.session.lock().await;
    session.navigate(View::Profile)?;
    Ok(Json(session.profile.clone()))
}

#[instrument(skip(state, form), fields(goal = ?form.goal))]
pub async fn save_profile(
    State(state): State<AppState>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ProfileSaved>, ApiError> {
    let mut session = state.session.lock().await;
    let view = transact(&state, &mut session, |s| s.update_profile(form)).await?;
    info!(patient_id = %session.profile.patient_id, %view, "profile saved");
    Ok(Json(ProfileSaved {
        targets: targets(&session.profile),
        profile: session.profile.clone(),
        view,
    }))
}

#[instrument(skip(state))]
pub async fn get_targets(State(state): State<AppState>) -> Result<Json<TargetsResponse>, ApiError> {
    let session = state.session.lock().await;
    session.require_patient()?;
    Ok(Json(TargetsResponse {
        goal: session.profile.goal,
        targets: targets(&session.profile),
    }))
}
