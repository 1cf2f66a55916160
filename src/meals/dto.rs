use serde::{Deserialize, Serialize};
use time::Date;

use crate::ai::DailyScore;
use crate::profile::dto::MacroTargets;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealCategory {
    // stores written by the mobile client use the Japanese labels
    #[serde(alias = "朝食")]
    Breakfast,
    #[serde(alias = "昼食")]
    Lunch,
    #[serde(alias = "夕食")]
    Dinner,
    #[serde(alias = "間食")]
    Snack,
    /// Anything a store holds outside the four known values.
    #[serde(other)]
    Other,
}

impl MealCategory {
    /// Display priority in the daily list.
    pub fn rank(self) -> u8 {
        match self {
            MealCategory::Breakfast => 1,
            MealCategory::Lunch => 2,
            MealCategory::Dinner => 3,
            MealCategory::Snack => 4,
            MealCategory::Other => 5,
        }
    }

    /// Category suggested for a meal logged at `hour` (0-23).
    pub fn for_hour(hour: u8) -> Self {
        match hour {
            4..=10 => MealCategory::Breakfast,
            11..=15 => MealCategory::Lunch,
            16..=22 => MealCategory::Dinner,
            _ => MealCategory::Snack,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealCategory::Breakfast => "breakfast",
            MealCategory::Lunch => "lunch",
            MealCategory::Dinner => "dinner",
            MealCategory::Snack => "snack",
            MealCategory::Other => "meal",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealLog {
    pub id: String,
    #[serde(with = "crate::clock::iso_date")]
    pub date: Date,
    pub time: String,
    pub category: MealCategory,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
}

/// New meal from text and/or a photo.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_b64: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub category: Option<MealCategory>,
}

/// Partial edit; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealRequest {
    pub description: Option<String>,
    pub category: Option<MealCategory>,
    pub time: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub ai_analysis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MealQuery {
    #[serde(default, with = "crate::clock::iso_date::option")]
    pub date: Option<Date>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[serde(with = "crate::clock::iso_date")]
    pub date: Date,
    pub meals: Vec<MealLog>,
    pub logged_categories: Vec<MealCategory>,
    pub totals: NutritionTotals,
    pub targets: MacroTargets,
    pub score: DailyScore,
}

#[derive(Debug, Serialize)]
pub struct SuggestedCategory {
    pub category: MealCategory,
    pub time: String,
}
