//! Exercise screen: fixed clinic routines plus the (in-memory only) exercise log.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::instrument;

use crate::errors::ApiError;
use crate::session::View;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub id: String,
    #[serde(with = "crate::clock::iso_date")]
    pub date: Date,
    pub activity: String,
    pub duration_minutes: u32,
    pub intensity: Intensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedExercise {
    pub name: &'static str,
    pub duration_minutes: u32,
    pub intensity: Intensity,
    pub tags: &'static [&'static str],
}

pub const SUGGESTED_EXERCISES: &[SuggestedExercise] = &[
    SuggestedExercise {
        name: "Plank",
        duration_minutes: 2,
        intensity: Intensity::Medium,
        tags: &["core", "stability"],
    },
    SuggestedExercise {
        name: "Abdominal draw-in",
        duration_minutes: 5,
        intensity: Intensity::Low,
        tags: &["inner muscles", "lower back care"],
    },
    SuggestedExercise {
        name: "Bird dog",
        duration_minutes: 5,
        intensity: Intensity::Low,
        tags: &["back", "rehabilitation"],
    },
    SuggestedExercise {
        name: "Walking",
        duration_minutes: 20,
        intensity: Intensity::Medium,
        tags: &["aerobic", "fat burning"],
    },
    SuggestedExercise {
        name: "Foam roller release",
        duration_minutes: 10,
        intensity: Intensity::Low,
        tags: &["posture", "relaxation"],
    },
];

#[derive(Debug, Serialize)]
pub struct ExerciseScreen {
    pub advice: &'static str,
    pub suggested: &'static [SuggestedExercise],
    pub history: Vec<ExerciseLog>,
}

const CLINIC_ADVICE: &str = "Favour correct form over heavy load: activate the inner muscles and stabilise the joints.";

pub fn router() -> Router<AppState> {
    Router::new().route("/exercise", get(exercise_screen))
}

#[instrument(skip(state))]
pub async fn exercise_screen(State(state): State<AppState>) -> Result<Json<ExerciseScreen>, ApiError> {
    let mut session = state.session.lock().await;
    session.navigate(View::Exercise)?;
    Ok(Json(ExerciseScreen {
        advice: CLINIC_ADVICE,
        suggested: SUGGESTED_EXERCISES,
        history: session.exercise_logs.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn patients_see_routines_and_staff_do_not() {
        let state = AppState::fake();
        state.session.lock().await.login("P-1", "C", "STAFF999").unwrap();
        let Json(screen) = exercise_screen(State(state.clone())).await.unwrap();
        assert_eq!(screen.suggested.len(), 5);
        assert!(screen.history.is_empty());
        assert_eq!(state.session.lock().await.view, View::Exercise);

        let staff = AppState::fake();
        staff.session.lock().await.login("", "STAFF999", "STAFF999").unwrap();
        assert!(exercise_screen(State(staff)).await.is_err());
    }
}
