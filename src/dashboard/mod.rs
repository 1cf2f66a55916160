//! Home screen of a patient: today's energy balance, weight trend and the
//! two AI insights.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::Date;
use tracing::{debug, instrument};

use crate::ai::DailyScore;
use crate::clock::chart_label;
use crate::config::SortOrder;
use crate::errors::ApiError;
use crate::inbody::{dto::InBodyData, services::ordered};
use crate::meals::services::{meals_on, totals};
use crate::profile::targets::targets;
use crate::session::{Insight, View};
use crate::state::AppState;

const CHART_POINTS: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeightTrend {
    pub latest_kg: Option<f64>,
    /// Latest minus the entry before it, one decimal.
    pub change_kg: Option<f64>,
    pub chart: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub name: String,
    pub target_weight_kg: f64,
    #[serde(with = "crate::clock::iso_date")]
    pub today: Date,
    pub calories_today: f64,
    pub calorie_target: u32,
    pub weight: WeightTrend,
    pub tip: String,
    pub score: DailyScore,
}

pub fn weight_trend(history: &[InBodyData]) -> WeightTrend {
    let chronological = ordered(history, SortOrder::Asc);
    let latest = chronological.last();
    let previous = chronological.len().checked_sub(2).and_then(|i| chronological.get(i));
    let change_kg = match (latest, previous) {
        (Some(l), Some(p)) => Some(((l.weight_kg - p.weight_kg) * 10.0).round() / 10.0),
        _ => None,
    };
    let chart = chronological
        .iter()
        .skip(chronological.len().saturating_sub(CHART_POINTS))
        .map(|e| ChartPoint {
            label: chart_label(e.date),
            weight_kg: e.weight_kg,
        })
        .collect();

    WeightTrend {
        latest_kg: latest.map(|e| e.weight_kg),
        change_kg,
        chart,
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, ApiError> {
    let today = state.clock.today();
    let (epoch, profile, history, day) = {
        let mut session = state.session.lock().await;
        session.navigate(View::Dashboard)?;
        session.require_patient()?;
        (
            session.epoch(),
            session.profile.clone(),
            session.body_history.clone(),
            meals_on(&session.meal_history, today),
        )
    };

    let goal = targets(&profile);
    let trend = weight_trend(&history);
    let latest = ordered(&history, SortOrder::Asc).pop();

    let (tip, score) = tokio::join!(
        state.ai.daily_tip(&profile, latest.as_ref()),
        state.ai.score_daily_diet(&day, &profile, &goal),
    );
    debug!(tip_parsed = tip.is_parsed(), score_parsed = score.is_parsed(), "dashboard insights settled");
    let insight = Insight {
        tip: tip.into_value(),
        score: score.into_value(),
    };

    let mut session = state.session.lock().await;
    if !session.set_insight(epoch, insight.clone()) {
        return Err(ApiError::SessionChanged);
    }

    Ok(Json(Dashboard {
        name: profile.name,
        target_weight_kg: profile.target_weight_kg,
        today,
        calories_today: totals(&day).calories,
        calorie_target: goal.calories,
        weight: trend,
        tip: insight.tip,
        score: insight.score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::FakeAiClient;
    use std::sync::Arc;
    use time::macros::date;

    fn entry(id: &str, date: Date, weight_kg: f64) -> InBodyData {
        InBodyData {
            id: id.into(),
            date,
            weight_kg,
            body_fat_percent: None,
            muscle_mass_kg: None,
            bmi: None,
            visceral_fat_level: None,
            score: None,
            is_manual: Some(true),
        }
    }

    #[test]
    fn trend_uses_chronological_order_and_last_five_points() {
        let history: Vec<InBodyData> = (1..=7u8)
            .rev()
            .map(|d| {
                let date = Date::from_calendar_date(2024, time::Month::March, d).unwrap();
                entry(&format!("e{d}"), date, 60.0 - f64::from(d) * 0.5)
            })
            .collect();
        let trend = weight_trend(&history);
        let labels: Vec<&str> = trend.chart.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["03/03", "03/04", "03/05", "03/06", "03/07"]);
        assert_eq!(trend.latest_kg, Some(56.5));
        assert_eq!(trend.change_kg, Some(-0.5));
    }

    #[test]
    fn trend_of_single_entry_has_no_change() {
        let trend = weight_trend(&[entry("a", date!(2024 - 01 - 05), 61.0)]);
        assert_eq!(trend.latest_kg, Some(61.0));
        assert_eq!(trend.change_kg, None);
        assert_eq!(weight_trend(&[]), WeightTrend::default());
    }

    #[tokio::test]
    async fn dashboard_falls_back_when_ai_is_down() {
        let fake = Arc::new(FakeAiClient::failing());
        let state = AppState::fake().with_ai(fake.clone());
        {
            let mut session = state.session.lock().await;
            session.login("P-1", "C", "STAFF999").unwrap();
            session.profile.name = "Aki".into();
        }

        let Json(board) = dashboard(State(state.clone())).await.unwrap();
        assert_eq!(board.name, "Aki");
        assert!(!board.tip.is_empty());
        assert_eq!(board.score, DailyScore::empty_day());
        // only the tip reaches the service on a day without meals
        assert_eq!(fake.calls(), 1);

        let session = state.session.lock().await;
        assert_eq!(session.view, View::Dashboard);
        assert_eq!(session.insight.as_ref().map(|i| i.tip.as_str()), Some(board.tip.as_str()));
    }

    #[tokio::test]
    async fn staff_cannot_open_dashboard() {
        let state = AppState::fake();
        state.session.lock().await.login("", "STAFF999", "STAFF999").unwrap();
        assert!(matches!(dashboard(State(state)).await, Err(ApiError::ViewNotAllowed(_))));
    }
}
