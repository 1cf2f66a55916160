use serde::{Deserialize, Serialize};
use time::Date;

/// One body-composition snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InBodyData {
    pub id: String,
    #[serde(with = "crate::clock::iso_date")]
    pub date: Date,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visceral_fat_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_manual: Option<bool>,
}

/// Manual entry form. Omitted date means today.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryRequest {
    #[serde(default, with = "crate::clock::iso_date::option")]
    pub date: Option<Date>,
    pub weight_kg: f64,
    #[serde(default)]
    pub body_fat_percent: Option<f64>,
    #[serde(default)]
    pub muscle_mass_kg: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub visceral_fat_level: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Photo of a result sheet, base64 encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub image_b64: String,
    #[serde(default)]
    pub content_type: Option<String>,
}
