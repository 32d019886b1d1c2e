use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use super::repo::{HealthScoreRecord, WeightEntry};
use super::services;
use super::trends::{self, WeeklyTrend};
use crate::error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddWeightRequest {
    pub weight: f64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_weeks")]
    pub weeks: u32,
}

fn default_weeks() -> u32 {
    trends::DEFAULT_WINDOW_WEEKS
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health-score", get(get_score))
        .route("/health-score/recalculate", post(recalculate))
        .route("/weight", get(list_weights).post(add_weight))
        .route("/trends", get(weekly_trends))
}

#[instrument(skip(state))]
pub async fn get_score(
    State(state): State<AppState>,
) -> Result<Json<Option<HealthScoreRecord>>, (StatusCode, String)> {
    let score = services::current_score(&state).await.map_err(error::http)?;
    Ok(Json(score))
}

#[instrument(skip(state))]
pub async fn recalculate(
    State(state): State<AppState>,
) -> Result<Json<HealthScoreRecord>, (StatusCode, String)> {
    let score = services::recalculate(&state).await.map_err(error::http)?;
    Ok(Json(score))
}

#[instrument(skip(state, payload))]
pub async fn add_weight(
    State(state): State<AppState>,
    Json(payload): Json<AddWeightRequest>,
) -> Result<(StatusCode, Json<WeightEntry>), (StatusCode, String)> {
    let entry = services::add_weight(&state, payload.weight, payload.note)
        .await
        .map_err(error::http)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn list_weights(
    State(state): State<AppState>,
) -> Result<Json<Vec<WeightEntry>>, (StatusCode, String)> {
    let history = services::weight_history(&state)
        .await
        .map_err(error::http)?;
    Ok(Json(history))
}

#[instrument(skip(state))]
pub async fn weekly_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<Vec<WeeklyTrend>>, (StatusCode, String)> {
    let weights = services::weight_history(&state)
        .await
        .map_err(error::http)?;
    let plans = crate::meals::services::list_plans(&state)
        .await
        .map_err(error::http)?;
    let snapshot = services::current_score(&state).await.map_err(error::http)?;

    let result = trends::weekly_trends(
        &weights,
        &plans,
        snapshot.as_ref(),
        OffsetDateTime::now_utc(),
        query.weeks.clamp(1, 52),
    );
    Ok(Json(result))
}
