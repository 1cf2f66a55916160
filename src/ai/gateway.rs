use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::json::extract_json_object;
use super::{prompts, AiClient, AiOutcome, AiRequest, ImagePart};
use crate::inbody::dto::InBodyData;
use crate::meals::dto::{MealLog, NutritionTotals};
use crate::meals::services::totals;
use crate::profile::dto::{MacroTargets, UserProfile};

pub const MEAL_FALLBACK_ADVICE: &str = "Could not analyze this meal; it was saved without nutrition values.";
const MEAL_DEFAULT_ADVICE: &str = "Logged. Keep up the good work!";
pub const SCORE_EMPTY_COMMENT: &str = "Start by logging your first meal of the day!";
const SCORE_FAILED_COMMENT: &str = "Could not evaluate today's meals.";
const TIP_EMPTY: &str = "Keep a good posture today and let your metabolism work for you!";
const TIP_FAILED: &str = "Add a few stretches today to keep your circulation flowing!";

/// Values read off a result-sheet photo. Every field is best-effort.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyCompositionDraft {
    pub date: Option<String>,
    pub weight_kg: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub visceral_fat_level: Option<f64>,
    pub score: Option<f64>,
}

impl BodyCompositionDraft {
    /// A sheet without a positive weight counts as unreadable.
    pub fn is_readable(&self) -> bool {
        self.weight_kg.is_some_and(|w| w.is_finite() && w > 0.0)
    }
}

/// Missing numbers in a reply count as zero; the rest of the estimate is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEstimate {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub ai_analysis: Option<String>,
}

impl NutritionEstimate {
    pub fn fallback() -> Self {
        Self {
            calories: 0.0,
            protein: 0.0,
            fat: 0.0,
            carbs: 0.0,
            ai_analysis: Some(MEAL_FALLBACK_ADVICE.into()),
        }
    }

    fn sanitized(self) -> Self {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let advice = self
            .ai_analysis
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| MEAL_DEFAULT_ADVICE.into());
        Self {
            calories: clean(self.calories),
            protein: clean(self.protein),
            fat: clean(self.fat),
            carbs: clean(self.carbs),
            ai_analysis: Some(advice),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyScore {
    pub score: u8,
    pub comment: String,
}

impl DailyScore {
    pub fn empty_day() -> Self {
        Self {
            score: 0,
            comment: SCORE_EMPTY_COMMENT.into(),
        }
    }

    fn failed() -> Self {
        Self {
            score: 0,
            comment: SCORE_FAILED_COMMENT.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawScore {
    score: f64,
    #[serde(default)]
    comment: String,
}

fn parse_reply<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let object = extract_json_object(raw)?;
    match serde_json::from_str(object) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "reply object did not match the expected shape");
            None
        }
    }
}

#[derive(Clone)]
pub struct AiGateway {
    client: Arc<dyn AiClient>,
}

impl AiGateway {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self { client }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: AiRequest,
        fallback: T,
    ) -> AiOutcome<T> {
        match self.client.generate(request).await {
            Err(e) => {
                warn!(op, error = %e, "ai request failed");
                AiOutcome::RequestFailure {
                    fallback,
                    error: e.to_string(),
                }
            }
            Ok(raw) => match parse_reply(&raw) {
                Some(v) => AiOutcome::Parsed(v),
                None => {
                    warn!(op, raw = %raw, "ai reply unparseable");
                    AiOutcome::ParseFailure { fallback, raw }
                }
            },
        }
    }

    #[instrument(skip(self, image))]
    pub async fn extract_body_composition(&self, image: ImagePart) -> AiOutcome<BodyCompositionDraft> {
        let request = AiRequest::json(prompts::BODY_COMPOSITION).with_image(Some(image));
        self.request_json("extract_body_composition", request, BodyCompositionDraft::default())
            .await
    }

    #[instrument(skip(self, image))]
    pub async fn estimate_meal_nutrition(
        &self,
        description: &str,
        image: Option<ImagePart>,
    ) -> AiOutcome<NutritionEstimate> {
        let request = AiRequest::json(prompts::meal_nutrition(description)).with_image(image);
        match self
            .request_json("estimate_meal_nutrition", request, NutritionEstimate::fallback())
            .await
        {
            AiOutcome::Parsed(v) => AiOutcome::Parsed(v.sanitized()),
            other => other,
        }
    }

    /// Scores the given day's meals. An empty day never reaches the service.
    #[instrument(skip_all, fields(meals = meals.len()))]
    pub async fn score_daily_diet(
        &self,
        meals: &[MealLog],
        profile: &UserProfile,
        targets: &MacroTargets,
    ) -> AiOutcome<DailyScore> {
        if meals.is_empty() {
            return AiOutcome::Parsed(DailyScore::empty_day());
        }
        let sums: NutritionTotals = totals(meals);
        let request = AiRequest::json(prompts::daily_score(profile, meals.len(), &sums, targets));
        match self
            .request_json::<RawScore>(
                "score_daily_diet",
                request,
                RawScore { score: 0.0, comment: String::new() },
            )
            .await
        {
            AiOutcome::Parsed(raw) if raw.score.is_finite() => {
                let comment = raw.comment.trim();
                AiOutcome::Parsed(DailyScore {
                    score: raw.score.clamp(0.0, 100.0).round() as u8,
                    comment: if comment.is_empty() {
                        SCORE_EMPTY_COMMENT.into()
                    } else {
                        comment.to_string()
                    },
                })
            }
            AiOutcome::Parsed(_) => AiOutcome::ParseFailure {
                fallback: DailyScore::failed(),
                raw: "non-finite score".into(),
            },
            AiOutcome::ParseFailure { raw, .. } => AiOutcome::ParseFailure { fallback: DailyScore::failed(), raw },
            AiOutcome::RequestFailure { error, .. } => AiOutcome::RequestFailure {
                fallback: DailyScore::failed(),
                error,
            },
        }
    }

    /// One short coaching sentence for the dashboard.
    #[instrument(skip_all)]
    pub async fn daily_tip(&self, profile: &UserProfile, latest: Option<&InBodyData>) -> AiOutcome<String> {
        match self.client.generate(AiRequest::text(prompts::daily_tip(profile, latest))).await {
            Ok(text) if !text.trim().is_empty() => AiOutcome::Parsed(text.trim().to_string()),
            Ok(raw) => AiOutcome::ParseFailure {
                fallback: TIP_EMPTY.into(),
                raw,
            },
            Err(e) => {
                warn!(error = %e, "tip request failed");
                AiOutcome::RequestFailure {
                    fallback: TIP_FAILED.into(),
                    error: e.to_string(),
                }
            }
        }
    }
}
