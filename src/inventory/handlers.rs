use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::dto::AddItemRequest;
use super::repo::GroceryItem;
use super::services;
use crate::error;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/inventory", get(list_inventory).post(add_item))
}

#[instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<GroceryItem>>, (StatusCode, String)> {
    let items = services::list_active(&state).await.map_err(error::http)?;
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    Json(payload): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<GroceryItem>), (StatusCode, String)> {
    let item = services::add_item(&state, payload)
        .await
        .map_err(error::http)?;
    Ok((StatusCode::CREATED, Json(item)))
}
