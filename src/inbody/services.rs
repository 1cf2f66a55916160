use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{InBodyData, ManualEntryRequest, ScanRequest};
use crate::ai::{BodyCompositionDraft, ImagePart};
use crate::clock::parse_iso_date;
use crate::config::SortOrder;
use crate::errors::ApiError;
use crate::session::{services::transact, View};
use crate::state::AppState;

/// History sorted by date; entries of the same day keep insertion order.
pub fn ordered(history: &[InBodyData], order: SortOrder) -> Vec<InBodyData> {
    let mut entries = history.to_vec();
    match order {
        SortOrder::Asc => entries.sort_by_key(|e| e.date),
        SortOrder::Desc => entries.sort_by(|a, b| b.date.cmp(&a.date)),
    }
    entries
}

fn positive(field: &'static str, value: Option<f64>) -> Result<(), ApiError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(ApiError::bad_request(format!("{field} must be positive"))),
        _ => Ok(()),
    }
}

pub fn manual_entry(req: ManualEntryRequest, today: Date) -> Result<InBodyData, ApiError> {
    positive("weightKg", Some(req.weight_kg))?;
    positive("bodyFatPercent", req.body_fat_percent)?;
    positive("muscleMassKg", req.muscle_mass_kg)?;
    positive("bmi", req.bmi)?;

    Ok(InBodyData {
        id: Uuid::new_v4().to_string(),
        date: req.date.unwrap_or(today),
        weight_kg: req.weight_kg,
        body_fat_percent: req.body_fat_percent,
        muscle_mass_kg: req.muscle_mass_kg,
        bmi: req.bmi,
        visceral_fat_level: req.visceral_fat_level,
        score: req.score,
        is_manual: Some(true),
    })
}

/// Entry from a readable scan. The sheet's date wins when it parses.
pub fn scanned_entry(draft: BodyCompositionDraft, today: Date) -> Result<InBodyData, ApiError> {
    if !draft.is_readable() {
        return Err(ApiError::ScanUnreadable);
    }
    let date = draft.date.as_deref().and_then(parse_iso_date).unwrap_or(today);
    Ok(InBodyData {
        id: Uuid::new_v4().to_string(),
        date,
        weight_kg: draft.weight_kg.unwrap_or_default(),
        body_fat_percent: draft.body_fat_percent,
        muscle_mass_kg: draft.muscle_mass_kg,
        bmi: draft.bmi,
        visceral_fat_level: draft.visceral_fat_level,
        score: draft.score,
        is_manual: Some(false),
    })
}

pub async fn list(state: &AppState) -> Result<Vec<InBodyData>, ApiError> {
    let mut session = state.session.lock().await;
    session.navigate(View::Inbody)?;
    Ok(ordered(&session.body_history, state.config.inbody_sort))
}

pub async fn add_manual(state: &AppState, req: ManualEntryRequest) -> Result<InBodyData, ApiError> {
    let mut session = state.session.lock().await;
    session.require_patient()?;
    let entry = manual_entry(req, state.clock.today())?;
    transact(state, &mut session, |s| {
        s.body_history.push(entry.clone());
        Ok(())
    })
    .await?;
    info!(entry_id = %entry.id, date = %entry.date, weight_kg = entry.weight_kg, "manual body entry added");
    Ok(entry)
}

/// Reads a result-sheet photo and appends it. An unreadable sheet adds nothing.
pub async fn scan(state: &AppState, req: ScanRequest) -> Result<InBodyData, ApiError> {
    let image = ImagePart::from_base64(&req.image_b64, req.content_type.as_deref())
        .map_err(|e| ApiError::bad_request(format!("invalid image: {e}")))?;

    let epoch = {
        let mut session = state.session.lock().await;
        session.require_patient()?;
        session.navigate(View::Inbody)?;
        session.epoch()
    };

    let outcome = state.ai.extract_body_composition(image).await;
    if !outcome.is_parsed() {
        warn!("body-composition sheet could not be read");
        return Err(ApiError::ScanUnreadable);
    }
    let entry = scanned_entry(outcome.into_value(), state.clock.today())?;

    let mut session = state.session.lock().await;
    transact(state, &mut session, |s| {
        s.ensure_epoch(epoch)?;
        s.body_history.push(entry.clone());
        Ok(())
    })
    .await?;
    info!(entry_id = %entry.id, date = %entry.date, weight_kg = entry.weight_kg, "scanned body entry added");
    Ok(entry)
}

pub async fn delete(state: &AppState, id: &str) -> Result<(), ApiError> {
    let mut session = state.session.lock().await;
    session.require_patient()?;
    transact(state, &mut session, |s| {
        let before = s.body_history.len();
        s.body_history.retain(|e| e.id != id);
        if s.body_history.len() == before {
            return Err(ApiError::NotFound("body-composition entry"));
        }
        Ok(())
    })
    .await?;
    info!(entry_id = %id, "body entry deleted");
    Ok(())
}
