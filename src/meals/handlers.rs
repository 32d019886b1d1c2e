use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::GenerateRequest;
use super::repo::{DailyMealPlan, Meal};
use super::services;
use crate::error;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_plans))
        .route("/meals/generate", post(generate))
        .route("/meals/:id/consume", post(consume))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyMealPlan>>, (StatusCode, String)> {
    let plans = services::list_plans(&state).await.map_err(error::http)?;
    Ok(Json(plans))
}

#[instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<Vec<DailyMealPlan>>, (StatusCode, String)> {
    let plans = services::generate_plans(&state, payload.days)
        .await
        .map_err(error::http)?;
    Ok(Json(plans))
}

#[instrument(skip(state))]
pub async fn consume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meal>, (StatusCode, String)> {
    let meal = services::consume_meal(&state, id)
        .await
        .map_err(error::http)?;
    Ok(Json(meal))
}
