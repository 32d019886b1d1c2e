use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::{parse, ChatMessage};
use crate::error::EngineError;
use crate::nutrition::NutritionFacts;
use crate::scoring::product::{self, ALTERNATIVES_THRESHOLD};
use crate::state::AppState;

/// Fallback for a missing or nonsensical model price.
const DEFAULT_PRICE: f64 = 4.99;
const MAX_RESULTS: usize = 10;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GeneratedFoodItem {
    name: String,
    brand: String,
    price: f64,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    sugar: f64,
    sodium: f64,
    saturated_fat: f64,
    ingredient_statement: Option<String>,
    warnings: Vec<String>,
    benefits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub health_score: u8,
    pub nutrition: NutritionFacts,
    pub warnings: Vec<String>,
    pub benefits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_statement: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Guards the cached latest results against out-of-order completions: a
/// response that resolves after a newer search began is discarded instead
/// of clobbering the fresher snapshot.
#[derive(Default)]
pub struct SearchCache {
    generation: AtomicU64,
    latest: RwLock<Option<SearchSnapshot>>,
}

impl SearchCache {
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn commit(&self, generation: u64, snapshot: SearchSnapshot) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "stale search result discarded");
            return false;
        }
        let mut latest = self
            .latest
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *latest = Some(snapshot);
        true
    }

    pub fn latest(&self) -> Option<SearchSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

fn merge_unique(base: Vec<String>, derived: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = base
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    for value in derived {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn sanitize_result(item: GeneratedFoodItem) -> SearchResult {
    let nutrition = NutritionFacts {
        calories: finite_or_zero(item.calories).round(),
        protein: round1(finite_or_zero(item.protein)),
        carbs: round1(finite_or_zero(item.carbs)),
        fat: round1(finite_or_zero(item.fat)),
        fiber: round1(finite_or_zero(item.fiber)),
        sugar: round1(finite_or_zero(item.sugar)),
        sodium: finite_or_zero(item.sodium).round(),
        saturated_fat: round1(finite_or_zero(item.saturated_fat)),
    };
    let price = if item.price.is_finite() && item.price > 0.0 {
        item.price
    } else {
        DEFAULT_PRICE
    };

    let scored = product::score_product(&nutrition, item.ingredient_statement.as_deref());

    SearchResult {
        name: item.name,
        brand: item.brand,
        price,
        health_score: scored.score,
        nutrition,
        warnings: merge_unique(item.warnings, scored.warnings),
        benefits: merge_unique(item.benefits, scored.benefits),
        alternatives: None,
        ingredient_statement: item.ingredient_statement,
    }
}

fn search_prompt(query: &str) -> String {
    format!(
        "You are a nutrition specialist for American grocery shoppers. The user \
         is searching for \"{query}\". Return ONLY a JSON array (no markdown) of \
         6 unique products from well-known US grocery brands that best match the \
         query. Each JSON object must have:\n\
         {{\"name\": \"Product name\", \"brand\": \"Brand name\", \"price\": 4.99, \
         \"calories\": 190, \"protein\": 12, \"carbs\": 20, \"fat\": 7, \
         \"fiber\": 3, \"sugar\": 8, \"sodium\": 320, \"saturatedFat\": 3, \
         \"ingredientStatement\": \"comma-separated ingredients\", \
         \"warnings\": [], \"benefits\": []}}\n\
         - price must be a realistic US price in dollars as a number\n\
         - calories, protein, carbs, fat, fiber, sugar in grams; sodium in \
         milligrams\n\
         Return ONLY the JSON array."
    )
}

/// Generates scored product matches for a free-text query. The model call
/// is the primary computation here, so its failure surfaces to the
/// caller; per-result alternatives stay best-effort.
pub async fn search(st: &AppState, query: &str) -> Result<Vec<SearchResult>, EngineError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(EngineError::validation("search query must not be empty"));
    }

    let generation = st.search_cache.begin();

    let raw = st
        .textgen
        .generate(&[ChatMessage::user(search_prompt(query))])
        .await?;
    let generated: Vec<GeneratedFoodItem> = parse::parse_array(&raw)?;

    let mut results: Vec<SearchResult> = generated
        .into_iter()
        .take(MAX_RESULTS)
        .map(sanitize_result)
        .collect();

    for result in &mut results {
        if result.health_score < ALTERNATIVES_THRESHOLD {
            result.alternatives =
                product::enrich_alternatives(st.textgen.as_ref(), &result.brand, &result.name)
                    .await;
        }
    }

    st.search_cache.commit(
        generation,
        SearchSnapshot {
            query: query.to_string(),
            results: results.clone(),
        },
    );
    info!(query, results = results.len(), "food search completed");
    Ok(results)
}

pub fn latest(st: &AppState) -> Option<SearchSnapshot> {
    st.search_cache.latest()
}
