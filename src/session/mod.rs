//! The single application-state tree and its view routing.

pub mod dto;
pub mod handlers;
pub mod services;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::DailyScore;
use crate::errors::ApiError;
use crate::exercise::ExerciseLog;
use crate::inbody::dto::InBodyData;
use crate::meals::dto::MealLog;
use crate::profile::dto::{DietGoal, MacroTargets, ProfileForm, UserProfile};
use crate::state::AppState;
use crate::store::Snapshot;

pub fn router() -> axum::Router<AppState> {
    handlers::routes()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Dashboard,
    Inbody,
    Meals,
    Exercise,
    Profile,
    StaffPortal,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Inbody => "inbody",
            View::Meals => "meals",
            View::Exercise => "exercise",
            View::Profile => "profile",
            View::StaffPortal => "staff_portal",
        };
        f.write_str(name)
    }
}

/// Dashboard AI results. Recomputed on every visit, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Insight {
    pub tip: String,
    pub score: DailyScore,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub view: View,
    pub profile: UserProfile,
    pub body_history: Vec<InBodyData>,
    pub meal_history: Vec<MealLog>,
    pub exercise_logs: Vec<ExerciseLog>,
    pub insight: Option<Insight>,
    /// Bumped on login and logout; transient results from an older epoch are dropped.
    epoch: u64,
}

impl Session {
    /// Session resumed from the store. A stored patient lands on their home screen.
    pub fn restore(snapshot: Snapshot) -> Self {
        let mut session = Self {
            view: View::Login,
            profile: snapshot.profile,
            body_history: snapshot.body_history,
            meal_history: snapshot.meal_history,
            exercise_logs: Vec::new(),
            insight: None,
            epoch: 0,
        };
        if session.profile.is_logged_in() {
            session.view = session.home_view();
        }
        session
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_logged_in(&self) -> bool {
        self.profile.is_logged_in()
    }

    pub fn home_view(&self) -> View {
        if !self.is_logged_in() {
            View::Login
        } else if self.profile.is_staff() {
            View::StaffPortal
        } else {
            View::Dashboard
        }
    }

    fn allows(&self, view: View) -> bool {
        if !self.is_logged_in() {
            return view == View::Login;
        }
        if self.profile.is_staff() {
            matches!(view, View::StaffPortal | View::Profile)
        } else {
            !matches!(view, View::StaffPortal | View::Login)
        }
    }

    /// Moves to `view` if this account may see it. Asking for the login
    /// screen while logged in redirects to the home screen.
    pub fn navigate(&mut self, view: View) -> Result<View, ApiError> {
        let target = if view == View::Login && self.is_logged_in() {
            self.home_view()
        } else {
            view
        };
        if !self.allows(target) {
            return Err(if self.is_logged_in() {
                ApiError::ViewNotAllowed(target)
            } else {
                ApiError::NotLoggedIn
            });
        }
        if self.view != target {
            debug!(from = %self.view, to = %target, "view change");
        }
        self.view = target;
        Ok(target)
    }

    /// Patient-only screens and actions.
    pub fn require_patient(&self) -> Result<(), ApiError> {
        if !self.is_logged_in() {
            return Err(ApiError::NotLoggedIn);
        }
        if self.profile.is_staff() {
            return Err(ApiError::ViewNotAllowed(self.view));
        }
        Ok(())
    }

    pub fn login(&mut self, patient_id: &str, clinic_code: &str, staff_code: &str) -> Result<View, ApiError> {
        let patient_id = patient_id.trim();
        let clinic_code = clinic_code.trim();

        if !staff_code.is_empty() && clinic_code == staff_code {
            self.profile = UserProfile {
                patient_id: "STAFF".into(),
                clinic_code: clinic_code.into(),
                is_staff: Some(true),
                ..UserProfile::empty()
            };
            self.epoch += 1;
            self.insight = None;
            self.view = View::StaffPortal;
            info!("staff login");
            return Ok(self.view);
        }

        if patient_id.is_empty() {
            return Err(ApiError::bad_request("patientId is required"));
        }

        self.profile.patient_id = patient_id.into();
        self.profile.clinic_code = clinic_code.into();
        self.profile.is_staff = Some(false);
        self.epoch += 1;
        self.insight = None;
        self.view = if self.profile.name.trim().is_empty() {
            View::Profile
        } else {
            View::Dashboard
        };
        info!(patient_id, view = %self.view, "patient login");
        Ok(self.view)
    }

    pub fn update_profile(&mut self, form: ProfileForm) -> Result<View, ApiError> {
        if !self.is_logged_in() {
            return Err(ApiError::NotLoggedIn);
        }
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("name is required"));
        }
        if form.age == 0 {
            return Err(ApiError::bad_request("age must be positive"));
        }
        if !(form.height_cm.is_finite() && form.height_cm > 0.0) {
            return Err(ApiError::bad_request("heightCm must be positive"));
        }
        if !(form.target_weight_kg.is_finite() && form.target_weight_kg > 0.0) {
            return Err(ApiError::bad_request("targetWeightKg must be positive"));
        }

        let goal = form.goal.unwrap_or_default();
        let custom_targets = match goal {
            DietGoal::Other => Some(form.custom_targets.unwrap_or(MacroTargets::CUSTOM_DEFAULT)),
            _ => None,
        };

        self.profile = UserProfile {
            name: name.into(),
            age: form.age,
            gender: form.gender.unwrap_or_default(),
            height_cm: form.height_cm,
            target_weight_kg: form.target_weight_kg,
            job_activity: form.job_activity.unwrap_or_default(),
            lifestyle_activity: form.lifestyle_activity.unwrap_or_default(),
            goal,
            custom_targets,
            ..std::mem::take(&mut self.profile)
        };
        // dashboard for patients, the roster for staff
        self.view = self.home_view();
        Ok(self.view)
    }

    /// Resets to the pre-login sentinel. Histories stay in memory unless
    /// `clear_histories` is set.
    pub fn logout(&mut self, clear_histories: bool) {
        info!(patient_id = %self.profile.patient_id, clear_histories, "logout");
        self.profile = UserProfile::empty();
        if clear_histories {
            self.body_history.clear();
            self.meal_history.clear();
        }
        self.exercise_logs.clear();
        self.insight = None;
        self.epoch += 1;
        self.view = View::Login;
    }

    /// Fails when a login or logout happened since `epoch` was read.
    pub fn ensure_epoch(&self, epoch: u64) -> Result<(), ApiError> {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "dropping result from an older session");
            return Err(ApiError::SessionChanged);
        }
        Ok(())
    }

    /// Stores a dashboard result unless the session moved on since `epoch`.
    pub fn set_insight(&mut self, epoch: u64, insight: Insight) -> bool {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "discarding stale insight");
            return false;
        }
        self.insight = Some(insight);
        true
    }
}
