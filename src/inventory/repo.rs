use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::EngineError;
use crate::nutrition::NutritionFacts;
use crate::storage::{self, keys, DurableStore};

/// One purchased product with a depletable serving count. Owned
/// exclusively by the ledger; `remaining_quantity` only ever moves through
/// [`super::services::apply_deduction`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub total_quantity: f64,
    pub remaining_quantity: f64,
    pub serving_size: String,
    pub servings_per_container: f64,
    pub nutrition: NutritionFacts,
    /// Raw ingredient statement when the product came with one; the
    /// aggregate health assessment runs the risk lexicon over it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_statement: Option<String>,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub date_added: OffsetDateTime,
}

pub async fn load(store: &dyn DurableStore) -> Result<Vec<GroceryItem>, EngineError> {
    storage::load(store, keys::GROCERY_INVENTORY).await
}

pub async fn save(store: &dyn DurableStore, items: &[GroceryItem]) -> Result<(), EngineError> {
    storage::save(store, keys::GROCERY_INVENTORY, &items).await
}
