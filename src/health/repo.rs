use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::scoring::Severity;
use crate::storage::{self, keys, DurableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub score: u8,
    pub status: ScoreStatus,
    pub message: String,
}

/// The six assessed categories, as a fixed structure rather than a keyed
/// map so every consumer sees the same set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCategories {
    pub sugar: CategoryScore,
    pub fat: CategoryScore,
    pub saturated_fat: CategoryScore,
    pub sodium: CategoryScore,
    pub fiber: CategoryScore,
    pub processed_foods: CategoryScore,
}

/// One flagged ingredient aggregated across the whole inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BadIngredient {
    pub name: String,
    pub severity: Severity,
    pub reason: String,
    pub found_in: Vec<String>,
    pub health_impact: String,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreRecord {
    pub overall: u8,
    pub categories: HealthCategories,
    pub recommendations: Vec<String>,
    pub bad_ingredients: Vec<BadIngredient>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Append-only weight log entry, stored newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub async fn load_score(store: &dyn DurableStore) -> Result<Option<HealthScoreRecord>, EngineError> {
    storage::load(store, keys::HEALTH_SCORE).await
}

pub async fn save_score(
    store: &dyn DurableStore,
    score: &HealthScoreRecord,
) -> Result<(), EngineError> {
    storage::save(store, keys::HEALTH_SCORE, score).await
}

pub async fn load_weights(store: &dyn DurableStore) -> Result<Vec<WeightEntry>, EngineError> {
    storage::load(store, keys::WEIGHT_HISTORY).await
}

pub async fn save_weights(
    store: &dyn DurableStore,
    entries: &[WeightEntry],
) -> Result<(), EngineError> {
    storage::save(store, keys::WEIGHT_HISTORY, &entries).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use time::macros::datetime;

    fn sample_record() -> HealthScoreRecord {
        let category = |score: u8, status: ScoreStatus, message: &str| CategoryScore {
            score,
            status,
            message: message.into(),
        };
        HealthScoreRecord {
            overall: 45,
            categories: HealthCategories {
                sugar: category(60, ScoreStatus::Good, "close to your limit"),
                fat: category(70, ScoreStatus::Good, "fine"),
                saturated_fat: category(55, ScoreStatus::Fair, "above limit"),
                sodium: category(65, ScoreStatus::Good, "near limit"),
                fiber: category(50, ScoreStatus::Fair, "below target"),
                processed_foods: category(30, ScoreStatus::Poor, "flagged additives"),
            },
            recommendations: vec!["Swap diet soda for sparkling water".into()],
            bad_ingredients: vec![BadIngredient {
                name: "sucralose".into(),
                severity: Severity::Avoid,
                reason: "Artificial sweetener".into(),
                found_in: vec!["Diet Soda".into()],
                health_impact: "May disrupt gut bacteria".into(),
                alternatives: vec!["Stevia-sweetened soda".into()],
            }],
            date: datetime!(2026 - 08 - 05 10:00 UTC),
        }
    }

    #[tokio::test]
    async fn health_score_roundtrips_identically() {
        let store = MemoryStore::new();
        let record = sample_record();
        save_score(&store, &record).await.unwrap();
        let loaded = load_score(&store).await.unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn missing_score_is_none() {
        let store = MemoryStore::new();
        assert_eq!(load_score(&store).await.unwrap(), None);
    }
}
