use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;
use crate::error::EngineError;
use crate::storage::{self, keys, DurableStore};

/// A pinned product with its remembered price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One grocery purchase in the week-by-week history log. `merged_into`
/// records every target week this entry has already been copied into, so
/// merging is idempotent per target week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroceryHistoryEntry {
    pub id: Uuid,
    pub product_name: String,
    pub price: f64,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub merged_into: Vec<String>,
}

pub async fn load_favorites(store: &dyn DurableStore) -> Result<Vec<FavoriteItem>, EngineError> {
    storage::load(store, keys::FAVORITES).await
}

pub async fn save_favorites(
    store: &dyn DurableStore,
    favorites: &[FavoriteItem],
) -> Result<(), EngineError> {
    storage::save(store, keys::FAVORITES, &favorites).await
}

pub async fn load_history(
    store: &dyn DurableStore,
) -> Result<Vec<GroceryHistoryEntry>, EngineError> {
    storage::load(store, keys::GROCERY_HISTORY).await
}

pub async fn save_history(
    store: &dyn DurableStore,
    entries: &[GroceryHistoryEntry],
) -> Result<(), EngineError> {
    storage::save(store, keys::GROCERY_HISTORY, &entries).await
}
