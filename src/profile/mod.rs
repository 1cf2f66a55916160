pub mod dto;
pub mod handlers;
pub mod targets;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
