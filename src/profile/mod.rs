use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{self, EngineError};
use crate::state::AppState;
use crate::storage::{self, keys, DurableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightGoal {
    Lose,
    Maintain,
    Gain,
}

/// The shopper's profile. Weight in lbs, height in inches, matching the
/// units the mobile client collects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub dietary_preferences: Vec<String>,
    pub health_conditions: Vec<String>,
    pub allergens: Vec<String>,
    pub daily_calorie_goal: f64,
    pub weekly_budget: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_goal: Option<WeightGoal>,
    pub favorite_foods: Vec<String>,
    pub onboarding_completed: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            dietary_preferences: Vec::new(),
            health_conditions: Vec::new(),
            allergens: Vec::new(),
            daily_calorie_goal: 2000.0,
            weekly_budget: 100.0,
            weight: None,
            target_weight: None,
            height: None,
            gender: None,
            weight_goal: None,
            favorite_foods: Vec::new(),
            onboarding_completed: false,
        }
    }
}

impl UserProfile {
    pub fn has_condition(&self, condition: &str) -> bool {
        self.health_conditions
            .iter()
            .any(|c| c.eq_ignore_ascii_case(condition))
    }
}

pub async fn load(store: &dyn DurableStore) -> Result<UserProfile, EngineError> {
    storage::load(store, keys::USER_PROFILE).await
}

pub async fn save(store: &dyn DurableStore, profile: &UserProfile) -> Result<(), EngineError> {
    storage::save(store, keys::USER_PROFILE, profile).await
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(put_profile))
}

#[instrument(skip(state))]
async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let profile = load(state.store.as_ref()).await.map_err(error::http)?;
    Ok(Json(profile))
}

#[instrument(skip(state, payload))]
async fn put_profile(
    State(state): State<AppState>,
    Json(payload): Json<UserProfile>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let required = [
        ("dailyCalorieGoal", Some(payload.daily_calorie_goal)),
        ("weeklyBudget", Some(payload.weekly_budget)),
        ("weight", payload.weight),
        ("targetWeight", payload.target_weight),
        ("height", payload.height),
    ];
    for (label, value) in required {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(error::http(EngineError::validation(format!(
                    "invalid {label}: {value}"
                ))));
            }
        }
    }

    let _gate = state.write_gate.lock().await;
    save(state.store.as_ref(), &payload)
        .await
        .map_err(error::http)?;
    info!("profile updated");
    Ok(Json(payload))
}
