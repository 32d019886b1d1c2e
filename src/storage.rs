use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::EngineError;

/// Stable keys, one per persisted collection. Absence of a key means an
/// empty collection, never an error.
pub mod keys {
    pub const USER_PROFILE: &str = "userProfile";
    pub const BUDGET_ENTRIES: &str = "budgetEntries";
    pub const GROCERY_INVENTORY: &str = "groceryInventory";
    pub const MEAL_PLANS: &str = "mealPlans";
    pub const HEALTH_SCORE: &str = "healthScore";
    pub const WEIGHT_HISTORY: &str = "weightHistory";
    pub const FAVORITES: &str = "favorites";
    pub const GROCERY_HISTORY: &str = "groceryHistory";
}

/// Key-value JSON blob store backing all persisted collections.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, EngineError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), EngineError>;
}

/// Loads a collection, treating a missing key as the type's default.
pub async fn load<T>(store: &dyn DurableStore, key: &str) -> Result<T, EngineError>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| EngineError::Storage(anyhow::anyhow!("decode {}: {}", key, e))),
        None => Ok(T::default()),
    }
}

pub async fn save<T: Serialize>(
    store: &dyn DurableStore,
    key: &str,
    value: &T,
) -> Result<(), EngineError> {
    let json = serde_json::to_value(value)
        .map_err(|e| EngineError::Storage(anyhow::anyhow!("encode {}: {}", key, e)))?;
    store.set(key, json).await
}

/// Postgres-backed store: one row per collection in `kv_store`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DurableStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, EngineError> {
        let row: Option<(Value,)> =
            sqlx::query_as(r#"SELECT value FROM kv_store WHERE key = $1"#)
                .bind(key)
                .fetch_optional(&self.db)
                .await
                .map_err(|e| EngineError::Storage(e.into()))?;
        Ok(row.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .map_err(|e| EngineError::Storage(e.into()))?;
        Ok(())
    }
}

/// In-memory store used by `AppState::fake()` and unit tests.
#[derive(Default)]
pub struct MemoryStore {
    values: std::sync::RwLock<std::collections::HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, EngineError> {
        let map = self
            .values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), EngineError> {
        let mut map = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.insert(key.to_string(), value);
        Ok(())
    }
}
