use tracing::{info, warn};

use super::Session;
use crate::errors::ApiError;
use crate::state::AppState;
use crate::store::{self, StoreKey};

/// Persist hook: writes the session's three documents. Callers hold the session lock.
pub async fn commit(state: &AppState, session: &Session) -> Result<(), ApiError> {
    store::persist_snapshot(
        state.store.as_ref(),
        &session.profile,
        &session.body_history,
        &session.meal_history,
    )
    .await?;
    Ok(())
}

/// Applies `change` to a copy of the session, persists the copy and only then
/// swaps it in. A failed write leaves the live session untouched.
pub async fn transact<T>(
    state: &AppState,
    session: &mut Session,
    change: impl FnOnce(&mut Session) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut draft = session.clone();
    let out = change(&mut draft)?;
    if let Err(e) = commit(state, &draft).await {
        warn!(error = %e, "persist failed; session left unchanged");
        return Err(e);
    }
    *session = draft;
    Ok(out)
}

/// Logout: drop the persisted profile (or every key when `logout_clears_all`
/// is configured), then reset the session. The profile key goes last since
/// it is what resumes a session on restart; the in-memory reset only happens
/// once every clear succeeded.
pub async fn logout(state: &AppState, session: &mut Session) -> Result<(), ApiError> {
    let clear_all = state.config.logout_clears_all;
    let keys: &[StoreKey] = if clear_all {
        &[StoreKey::MealHistory, StoreKey::BodyHistory, StoreKey::Profile]
    } else {
        &[StoreKey::Profile]
    };
    for key in keys {
        state.store.clear(*key).await?;
    }
    session.logout(clear_all);
    info!(cleared = keys.len(), "persisted session cleared");
    Ok(())
}
