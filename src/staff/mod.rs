//! Read-only patient roster for clinic staff. The roster is a fixed list.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::errors::ApiError;
use crate::session::View;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: &'static str,
    pub name: &'static str,
    /// Patient needs a follow-up.
    pub alert: bool,
}

pub const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        id: "P-1001",
        name: "Kenichi Sato",
        alert: true,
    },
    RosterEntry {
        id: "P-1002",
        name: "Mika Suzuki",
        alert: false,
    },
];

pub fn router() -> Router<AppState> {
    Router::new().route("/staff/patients", get(list_patients))
}

#[instrument(skip(state))]
pub async fn list_patients(State(state): State<AppState>) -> Result<Json<&'static [RosterEntry]>, ApiError> {
    let mut session = state.session.lock().await;
    session.navigate(View::StaffPortal)?;
    Ok(Json(ROSTER))
}
