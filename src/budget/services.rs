use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::repo::{self, BudgetEntry};
use crate::dates::week_start_sunday;
use crate::error::EngineError;
use crate::nutrition::NutritionFacts;
use crate::state::AppState;

/// Total spent since the start of the current Sunday-anchored week.
pub fn weekly_spent(entries: &[BudgetEntry], now: OffsetDateTime) -> f64 {
    let week_start = week_start_sunday(now);
    entries
        .iter()
        .filter(|entry| entry.date.date() >= week_start)
        .map(|entry| entry.price)
        .sum()
}

pub async fn list(st: &AppState) -> Result<Vec<BudgetEntry>, EngineError> {
    repo::load(st.store.as_ref()).await
}

pub async fn add_entry(
    st: &AppState,
    product_code: String,
    product_name: String,
    price: f64,
    nutrition: Option<NutritionFacts>,
) -> Result<BudgetEntry, EngineError> {
    if product_name.trim().is_empty() {
        return Err(EngineError::validation("product name must not be empty"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(EngineError::validation(format!("invalid price: {price}")));
    }
    if let Some(nutrition) = &nutrition {
        nutrition.validate()?;
    }

    let entry = BudgetEntry {
        id: Uuid::new_v4(),
        product_code,
        product_name,
        price,
        date: OffsetDateTime::now_utc(),
        nutrition,
    };

    let _gate = st.write_gate.lock().await;
    let mut entries = repo::load(st.store.as_ref()).await?;
    entries.push(entry.clone());
    repo::save(st.store.as_ref(), &entries).await?;
    info!(entry_id = %entry.id, price = entry.price, "budget entry added");
    Ok(entry)
}

pub async fn remove_entry(st: &AppState, entry_id: Uuid) -> Result<(), EngineError> {
    let _gate = st.write_gate.lock().await;
    let mut entries = repo::load(st.store.as_ref()).await?;
    let before = entries.len();
    entries.retain(|entry| entry.id != entry_id);
    if entries.len() == before {
        return Err(EngineError::NotFound("Budget entry not found".into()));
    }
    repo::save(st.store.as_ref(), &entries).await
}

pub async fn clear(st: &AppState) -> Result<(), EngineError> {
    let _gate = st.write_gate.lock().await;
    repo::save(st.store.as_ref(), &[]).await
}
