use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

/// Physical load of the patient's job; selects the activity factor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobActivity {
    #[default]
    Desk,
    Walk,
    Drive,
    Heavy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleActivity {
    #[default]
    None,
    Low,
    High,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DietGoal {
    #[default]
    General,
    Postpartum,
    PostpartumNursing,
    Diabetes,
    Hypertension,
    Other,
}

impl fmt::Display for DietGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DietGoal::General => "general weight management",
            DietGoal::Postpartum => "postpartum recovery",
            DietGoal::PostpartumNursing => "postpartum recovery while nursing",
            DietGoal::Diabetes => "blood sugar control",
            DietGoal::Hypertension => "blood pressure control",
            DietGoal::Other => "custom targets",
        };
        f.write_str(label)
    }
}

/// Daily energy and PFC targets, in kcal and grams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroTargets {
    pub calories: u32,
    pub protein: u32,
    pub fat: u32,
    pub carbs: u32,
}

impl MacroTargets {
    /// Prefilled values of the custom-target form.
    pub const CUSTOM_DEFAULT: MacroTargets = MacroTargets {
        calories: 2000,
        protein: 100,
        fat: 60,
        carbs: 250,
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub patient_id: String,
    pub clinic_code: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub target_weight_kg: f64,
    pub job_activity: JobActivity,
    pub lifestyle_activity: LifestyleActivity,
    pub goal: DietGoal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_targets: Option<MacroTargets>,
}

impl UserProfile {
    /// Pre-login placeholder.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        !self.patient_id.is_empty()
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff.unwrap_or(false)
    }
}

/// Body of `PUT /profile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub height_cm: f64,
    pub target_weight_kg: f64,
    #[serde(default)]
    pub job_activity: Option<JobActivity>,
    #[serde(default)]
    pub lifestyle_activity: Option<LifestyleActivity>,
    #[serde(default)]
    pub goal: Option<DietGoal>,
    #[serde(default)]
    pub custom_targets: Option<MacroTargets>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetsResponse {
    pub goal: DietGoal,
    pub targets: MacroTargets,
}

/// Reply to a saved profile form: the stored profile and where to go next.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSaved {
    pub profile: UserProfile,
    pub targets: MacroTargets,
    pub view: crate::session::View,
}
