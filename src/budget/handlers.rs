use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::repo::BudgetEntry;
use super::services;
use crate::error;
use crate::nutrition::NutritionFacts;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub product_code: String,
    pub product_name: String,
    pub price: f64,
    #[serde(default)]
    pub nutrition: Option<NutritionFacts>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub entries: Vec<BudgetEntry>,
    pub weekly_spent: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budget", get(list).post(add).delete(clear))
        .route("/budget/:id", delete(remove))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<BudgetSummary>, (StatusCode, String)> {
    let entries = services::list(&state).await.map_err(error::http)?;
    let weekly_spent = services::weekly_spent(&entries, OffsetDateTime::now_utc());
    Ok(Json(BudgetSummary {
        entries,
        weekly_spent,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add(
    State(state): State<AppState>,
    Json(payload): Json<AddEntryRequest>,
) -> Result<(StatusCode, Json<BudgetEntry>), (StatusCode, String)> {
    let entry = services::add_entry(
        &state,
        payload.product_code,
        payload.product_name,
        payload.price,
        payload.nutrition,
    )
    .await
    .map_err(error::http)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::remove_entry(&state, id)
        .await
        .map_err(error::http)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    services::clear(&state).await.map_err(error::http)?;
    Ok(StatusCode::NO_CONTENT)
}
