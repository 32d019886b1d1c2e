use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

use super::repo::{FavoriteItem, GroceryHistoryEntry};
use super::services;
use crate::error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFavoriteRequest {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFavoriteRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<FavoriteItem>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub favorite: FavoriteItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHistoryRequest {
    pub product_name: String,
    pub price: f64,
    #[serde(default, with = "history_date")]
    pub date: Option<Date>,
}

/// Optional `YYYY-MM-DD` field; omitted means today.
mod history_date {
    use serde::{Deserialize, Deserializer};
    use time::Date;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "crate::dates::iso_date")] Date);
        Ok(Option::<Wrapper>::deserialize(d)?.map(|w| w.0))
    }
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub added: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(create_favorite))
        .route(
            "/favorites/:id",
            patch(update_favorite).delete(delete_favorite),
        )
        .route("/history", get(list_history).post(record_history))
        .route("/history/merge-previous-week", post(merge_previous_week))
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
) -> Result<Json<FavoritesResponse>, (StatusCode, String)> {
    let favorites = services::list_favorites(&state)
        .await
        .map_err(error::http)?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[instrument(skip(state, payload))]
pub async fn create_favorite(
    State(state): State<AppState>,
    Json(payload): Json<CreateFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteResponse>), (StatusCode, String)> {
    let favorite = services::add_favorite(&state, payload.name, payload.brand, payload.price)
        .await
        .map_err(error::http)?;
    Ok((StatusCode::CREATED, Json(FavoriteResponse { favorite })))
}

#[instrument(skip(state, payload))]
pub async fn update_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFavoriteRequest>,
) -> Result<Json<FavoriteResponse>, (StatusCode, String)> {
    let favorite =
        services::update_favorite(&state, id, payload.name, payload.brand, payload.price)
            .await
            .map_err(error::http)?;
    Ok(Json(FavoriteResponse { favorite }))
}

#[instrument(skip(state))]
pub async fn delete_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::remove_favorite(&state, id)
        .await
        .map_err(error::http)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<GroceryHistoryEntry>>, (StatusCode, String)> {
    let entries = services::list_history(&state).await.map_err(error::http)?;
    Ok(Json(entries))
}

#[instrument(skip(state, payload))]
pub async fn record_history(
    State(state): State<AppState>,
    Json(payload): Json<RecordHistoryRequest>,
) -> Result<(StatusCode, Json<GroceryHistoryEntry>), (StatusCode, String)> {
    let date = payload
        .date
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let entry = services::record_history(&state, payload.product_name, payload.price, date)
        .await
        .map_err(error::http)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn merge_previous_week(
    State(state): State<AppState>,
) -> Result<Json<MergeResponse>, (StatusCode, String)> {
    let added = services::merge_previous_week(&state)
        .await
        .map_err(error::http)?;
    Ok(Json(MergeResponse { added }))
}
