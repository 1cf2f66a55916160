use lazy_static::lazy_static;
use regex::Regex;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{
    CreateMealRequest, DailySummary, MealCategory, MealLog, NutritionTotals, SuggestedCategory,
    UpdateMealRequest,
};
use crate::ai::ImagePart;
use crate::clock::format_time_of_day;
use crate::errors::ApiError;
use crate::profile::targets;
use crate::session::{services::transact, View};
use crate::state::AppState;

pub fn totals(meals: &[MealLog]) -> NutritionTotals {
    meals.iter().fold(NutritionTotals::default(), |acc, m| NutritionTotals {
        calories: acc.calories + m.calories,
        protein: acc.protein + m.protein,
        fat: acc.fat + m.fat,
        carbs: acc.carbs + m.carbs,
    })
}

/// Meals of one day, breakfast first, then by time within a category.
pub fn meals_on(history: &[MealLog], date: Date) -> Vec<MealLog> {
    let mut day: Vec<MealLog> = history.iter().filter(|m| m.date == date).cloned().collect();
    day.sort_by(|a, b| a.category.rank().cmp(&b.category.rank()).then_with(|| a.time.cmp(&b.time)));
    day
}

/// Distinct categories present in an already ordered day.
pub fn logged_categories(day: &[MealLog]) -> Vec<MealCategory> {
    let mut seen = Vec::new();
    for meal in day {
        if !seen.contains(&meal.category) {
            seen.push(meal.category);
        }
    }
    seen
}

pub fn suggest(now: OffsetDateTime) -> SuggestedCategory {
    SuggestedCategory {
        category: MealCategory::for_hour(now.hour()),
        time: format_time_of_day(now.time()),
    }
}

pub fn is_valid_time(raw: &str) -> bool {
    lazy_static! {
        static ref HH_MM: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
    }
    HH_MM.is_match(raw)
}

fn check_amount(field: &'static str, value: Option<f64>) -> Result<(), ApiError> {
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => Err(ApiError::bad_request(format!("{field} must be zero or positive"))),
        _ => Ok(()),
    }
}

/// Applies a partial edit. Nothing changes unless every field is valid.
pub fn apply_update(meal: &mut MealLog, req: UpdateMealRequest) -> Result<(), ApiError> {
    if let Some(time) = req.time.as_deref() {
        if !is_valid_time(time) {
            return Err(ApiError::bad_request("time must be HH:MM"));
        }
    }
    check_amount("calories", req.calories)?;
    check_amount("protein", req.protein)?;
    check_amount("fat", req.fat)?;
    check_amount("carbs", req.carbs)?;

    if let Some(description) = req.description {
        let description = description.trim();
        if description.is_empty() {
            return Err(ApiError::bad_request("description cannot be empty"));
        }
        meal.description = description.to_string();
    }
    if let Some(category) = req.category {
        meal.category = category;
    }
    if let Some(time) = req.time {
        meal.time = time;
    }
    meal.calories = req.calories.unwrap_or(meal.calories);
    meal.protein = req.protein.unwrap_or(meal.protein);
    meal.fat = req.fat.unwrap_or(meal.fat);
    meal.carbs = req.carbs.unwrap_or(meal.carbs);
    if let Some(advice) = req.ai_analysis {
        meal.ai_analysis = Some(advice).filter(|a| !a.trim().is_empty());
    }
    Ok(())
}

/// Logs a meal from a description and/or photo. The entry is appended even
/// when the nutrition estimate fails; it then carries zeros and fallback advice.
pub async fn create_meal(state: &AppState, req: CreateMealRequest) -> Result<MealLog, ApiError> {
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let image = req
        .image_b64
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .map(|b| ImagePart::from_base64(b, req.content_type.as_deref()))
        .transpose()
        .map_err(|e| ApiError::bad_request(format!("invalid image: {e}")))?;
    if description.is_none() && image.is_none() {
        return Err(ApiError::bad_request("description or image is required"));
    }

    let (epoch, now) = {
        let mut session = state.session.lock().await;
        session.require_patient()?;
        session.navigate(View::Meals)?;
        (session.epoch(), state.clock.now())
    };
    let category = req.category.unwrap_or_else(|| MealCategory::for_hour(now.hour()));

    let outcome = state
        .ai
        .estimate_meal_nutrition(description.as_deref().unwrap_or("(see photo)"), image.clone())
        .await;
    if !outcome.is_parsed() {
        warn!("meal saved with fallback nutrition");
    }
    let estimate = outcome.into_value();

    let meal = MealLog {
        id: Uuid::new_v4().to_string(),
        date: now.date(),
        time: format_time_of_day(now.time()),
        category,
        description: description.unwrap_or_else(|| format!("{} log", category.label())),
        image_url: image.as_ref().map(ImagePart::to_data_url),
        calories: estimate.calories,
        protein: estimate.protein,
        fat: estimate.fat,
        carbs: estimate.carbs,
        ai_analysis: estimate.ai_analysis,
    };

    let mut session = state.session.lock().await;
    transact(state, &mut session, |s| {
        s.ensure_epoch(epoch)?;
        s.meal_history.push(meal.clone());
        Ok(())
    })
    .await?;
    info!(meal_id = %meal.id, category = meal.category.label(), calories = meal.calories, "meal logged");
    Ok(meal)
}

pub async fn update_meal(state: &AppState, id: &str, req: UpdateMealRequest) -> Result<MealLog, ApiError> {
    let mut session = state.session.lock().await;
    session.require_patient()?;
    let edited = transact(state, &mut session, |s| {
        let meal = s
            .meal_history
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ApiError::NotFound("meal"))?;
        apply_update(meal, req)?;
        Ok(meal.clone())
    })
    .await?;
    info!(meal_id = %id, "meal updated");
    Ok(edited)
}

pub async fn delete_meal(state: &AppState, id: &str) -> Result<(), ApiError> {
    let mut session = state.session.lock().await;
    session.require_patient()?;
    transact(state, &mut session, |s| {
        let before = s.meal_history.len();
        s.meal_history.retain(|m| m.id != id);
        if s.meal_history.len() == before {
            return Err(ApiError::NotFound("meal"));
        }
        Ok(())
    })
    .await?;
    info!(meal_id = %id, "meal deleted");
    Ok(())
}

pub async fn list_meals(state: &AppState, date: Option<Date>) -> Result<Vec<MealLog>, ApiError> {
    let mut session = state.session.lock().await;
    session.navigate(View::Meals)?;
    Ok(match date {
        Some(date) => meals_on(&session.meal_history, date),
        None => session.meal_history.clone(),
    })
}

/// One day's meals with totals, targets and the AI score.
pub async fn daily_summary(state: &AppState, date: Option<Date>) -> Result<DailySummary, ApiError> {
    let date = date.unwrap_or_else(|| state.clock.today());
    let (day, profile) = {
        let mut session = state.session.lock().await;
        session.navigate(View::Meals)?;
        (meals_on(&session.meal_history, date), session.profile.clone())
    };
    let targets = targets::targets(&profile);
    let score = state.ai.score_daily_diet(&day, &profile, &targets).await.into_value();

    Ok(DailySummary {
        date,
        logged_categories: logged_categories(&day),
        totals: totals(&day),
        meals: day,
        targets,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::FakeAiClient;
    use crate::ai::MEAL_FALLBACK_ADVICE;
    use crate::store::{FlakyStore, StoreKey};
    use std::sync::Arc;
    use time::macros::{date, datetime};

    fn meal(id: &str, date: Date, time: &str, category: MealCategory, calories: f64) -> MealLog {
        MealLog {
            id: id.into(),
            date,
            time: time.into(),
            category,
            description: format!("meal {id}"),
            image_url: None,
            calories,
            protein: 10.0,
            fat: 5.0,
            carbs: 30.0,
            ai_analysis: None,
        }
    }

    async fn patient_state(fake: FakeAiClient) -> (AppState, Arc<FakeAiClient>) {
        let fake = Arc::new(fake);
        let state = AppState::fake().with_ai(fake.clone());
        state.session.lock().await.login("P-1", "C", "STAFF999").unwrap();
        (state, fake)
    }

    #[test]
    fn totals_sum_every_field() {
        let day = [
            meal("a", date!(2024 - 06 - 01), "08:00", MealCategory::Breakfast, 400.0),
            meal("b", date!(2024 - 06 - 01), "12:00", MealCategory::Lunch, 650.5),
        ];
        let sums = totals(&day);
        assert_eq!(sums.calories, 1050.5);
        assert_eq!(sums.protein, 20.0);
        assert_eq!(totals(&[]), NutritionTotals::default());
    }

    #[test]
    fn day_is_ordered_by_category_then_time() {
        let d = date!(2024 - 06 - 01);
        let history = vec![
            meal("snack", d, "15:00", MealCategory::Snack, 1.0),
            meal("dinner", d, "19:00", MealCategory::Dinner, 1.0),
            meal("other-day", date!(2024 - 05 - 31), "08:00", MealCategory::Breakfast, 1.0),
            meal("odd", d, "10:00", MealCategory::Other, 1.0),
            meal("late-bf", d, "09:30", MealCategory::Breakfast, 1.0),
            meal("early-bf", d, "07:00", MealCategory::Breakfast, 1.0),
        ];
        let day = meals_on(&history, d);
        let ids: Vec<&str> = day.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["early-bf", "late-bf", "dinner", "snack", "odd"]);
        assert_eq!(
            logged_categories(&day),
            [MealCategory::Breakfast, MealCategory::Dinner, MealCategory::Snack, MealCategory::Other]
        );
    }

    #[test]
    fn suggests_category_from_clock() {
        let s = suggest(datetime!(2024-06-01 7:45 +9));
        assert_eq!(s.category, MealCategory::Breakfast);
        assert_eq!(s.time, "07:45");
        assert_eq!(suggest(datetime!(2024-06-01 23:10 +9)).category, MealCategory::Snack);
    }

    #[test]
    fn validates_time_of_day() {
        for ok in ["00:00", "07:05", "23:59"] {
            assert!(is_valid_time(ok), "{ok}");
        }
        for bad in ["24:00", "7:05", "12:60", "12-30", ""] {
            assert!(!is_valid_time(bad), "{bad}");
        }
    }

    #[test]
    fn invalid_update_leaves_meal_untouched() {
        let mut m = meal("a", date!(2024 - 06 - 01), "08:00", MealCategory::Breakfast, 400.0);
        let original = m.clone();
        let req = UpdateMealRequest {
            calories: Some(500.0),
            time: Some("25:00".into()),
            ..Default::default()
        };
        assert!(apply_update(&mut m, req).is_err());
        assert_eq!(m, original);

        let req = UpdateMealRequest {
            calories: Some(500.0),
            category: Some(MealCategory::Snack),
            ..Default::default()
        };
        apply_update(&mut m, req).unwrap();
        assert_eq!((m.calories, m.category, m.protein), (500.0, MealCategory::Snack, 10.0));
    }

    #[tokio::test]
    async fn malformed_estimate_still_appends_zero_valued_meal() {
        let (state, fake) = patient_state(FakeAiClient::with_replies(["about 500 kcal, I guess"])).await;
        let req = CreateMealRequest {
            description: Some("ramen".into()),
            category: Some(MealCategory::Lunch),
            ..Default::default()
        };
        let logged = create_meal(&state, req).await.unwrap();

        assert_eq!((logged.calories, logged.protein, logged.fat, logged.carbs), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(logged.ai_analysis.as_deref(), Some(MEAL_FALLBACK_ADVICE));
        assert_eq!(logged.category, MealCategory::Lunch);
        assert_eq!(fake.calls(), 1);

        let session = state.session.lock().await;
        assert_eq!(session.meal_history, vec![logged]);
        assert!(state.store.load(StoreKey::MealHistory).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn photo_only_meal_gets_default_description_and_data_url() {
        let (state, fake) = patient_state(FakeAiClient::with_replies([
            r#"{"calories": 320, "protein": 12, "fat": 9, "carbs": 45, "aiAnalysis": "Add some greens"}"#,
        ]))
        .await;
        let req = CreateMealRequest {
            image_b64: Some("aGVsbG8=".into()),
            content_type: Some("image/png".into()),
            category: Some(MealCategory::Dinner),
            ..Default::default()
        };
        let logged = create_meal(&state, req).await.unwrap();
        assert_eq!(logged.description, "dinner log");
        assert_eq!(logged.image_url.as_deref(), Some("data:image/png;base64,aGVsbG8="));
        assert_eq!(logged.calories, 320.0);
        assert!(fake.requests()[0].image.is_some());
    }

    #[tokio::test]
    async fn create_requires_some_input_and_a_patient() {
        let (state, fake) = patient_state(FakeAiClient::failing()).await;
        let empty = CreateMealRequest {
            description: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(create_meal(&state, empty).await, Err(ApiError::BadRequest(_))));
        assert_eq!(fake.calls(), 0);

        let staff = AppState::fake();
        staff.session.lock().await.login("", "STAFF999", "STAFF999").unwrap();
        let req = CreateMealRequest {
            description: Some("salad".into()),
            ..Default::default()
        };
        assert!(create_meal(&staff, req).await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_only_the_matching_meal() {
        let (state, _) = patient_state(FakeAiClient::failing()).await;
        let d = date!(2024 - 06 - 01);
        let kept = vec![
            meal("a", d, "08:00", MealCategory::Breakfast, 1.0),
            meal("c", d, "19:00", MealCategory::Dinner, 3.0),
        ];
        {
            let mut session = state.session.lock().await;
            session.meal_history = vec![kept[0].clone(), meal("b", d, "12:00", MealCategory::Lunch, 2.0), kept[1].clone()];
        }
        delete_meal(&state, "b").await.unwrap();
        assert_eq!(state.session.lock().await.meal_history, kept);
        assert!(matches!(delete_meal(&state, "b").await, Err(ApiError::NotFound("meal"))));
    }

    #[tokio::test]
    async fn summary_of_empty_day_skips_the_ai_call() {
        let (state, fake) = patient_state(FakeAiClient::failing()).await;
        let summary = daily_summary(&state, Some(date!(2024 - 06 - 01))).await.unwrap();
        assert!(summary.meals.is_empty());
        assert_eq!(summary.score.score, 0);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn failed_persist_does_not_keep_the_meal() {
        let flaky = Arc::new(FlakyStore::default());
        let fake = Arc::new(FakeAiClient::failing());
        let state = AppState::fake().with_store(flaky.clone()).with_ai(fake);
        state.session.lock().await.login("P-1", "C", "STAFF999").unwrap();
        let ramen = || CreateMealRequest {
            description: Some("ramen".into()),
            ..Default::default()
        };

        flaky.set_failing(true);
        assert!(matches!(create_meal(&state, ramen()).await, Err(ApiError::Store(_))));
        assert!(matches!(create_meal(&state, ramen()).await, Err(ApiError::Store(_))));
        assert!(state.session.lock().await.meal_history.is_empty());

        flaky.set_failing(false);
        create_meal(&state, ramen()).await.unwrap();
        assert_eq!(state.session.lock().await.meal_history.len(), 1);
        let stored = state.store.load(StoreKey::MealHistory).await.unwrap().unwrap();
        assert_eq!(stored.as_array().map(Vec::len), Some(1));
    }
}
