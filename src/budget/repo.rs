use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::EngineError;
use crate::nutrition::NutritionFacts;
use crate::storage::{self, keys, DurableStore};

/// One tracked purchase. Append-only except for explicit user deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEntry {
    pub id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
}

pub async fn load(store: &dyn DurableStore) -> Result<Vec<BudgetEntry>, EngineError> {
    storage::load(store, keys::BUDGET_ENTRIES).await
}

pub async fn save(store: &dyn DurableStore, entries: &[BudgetEntry]) -> Result<(), EngineError> {
    storage::save(store, keys::BUDGET_ENTRIES, &entries).await
}
