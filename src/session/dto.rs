use serde::{Deserialize, Serialize};

use super::{Session, View};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub clinic_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigateRequest {
    pub view: View,
}

/// What the client needs to pick a screen.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub view: View,
    pub logged_in: bool,
    pub is_staff: bool,
    pub patient_id: String,
    pub name: String,
}

impl From<&Session> for SessionStatus {
    fn from(s: &Session) -> Self {
        Self {
            view: s.view,
            logged_in: s.is_logged_in(),
            is_staff: s.profile.is_staff(),
            patient_id: s.profile.patient_id.clone(),
            name: s.profile.name.clone(),
        }
    }
}
