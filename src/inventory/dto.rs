use serde::Deserialize;

use crate::nutrition::NutritionFacts;

/// Purchase info for a new ledger item. Serving details are optional;
/// missing ones are estimated best-effort and default to a single serving.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub total_quantity: Option<f64>,
    #[serde(default)]
    pub serving_size: Option<String>,
    #[serde(default)]
    pub servings_per_container: Option<f64>,
    pub nutrition: NutritionFacts,
    #[serde(default)]
    pub ingredient_statement: Option<String>,
    pub price: f64,
}
