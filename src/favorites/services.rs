use time::{Date, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use super::repo::{self, FavoriteItem, GroceryHistoryEntry};
use crate::dates::{iso_week_key, previous_week};
use crate::error::EngineError;
use crate::state::AppState;

fn validate_price(price: f64) -> Result<(), EngineError> {
    if !price.is_finite() || price < 0.0 {
        return Err(EngineError::validation(format!("invalid price: {price}")));
    }
    Ok(())
}

pub async fn list_favorites(st: &AppState) -> Result<Vec<FavoriteItem>, EngineError> {
    repo::load_favorites(st.store.as_ref()).await
}

pub async fn add_favorite(
    st: &AppState,
    name: String,
    brand: String,
    price: f64,
) -> Result<FavoriteItem, EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::validation("favorite name must not be empty"));
    }
    validate_price(price)?;

    let favorite = FavoriteItem {
        id: Uuid::new_v4(),
        name,
        brand,
        price,
        created_at: OffsetDateTime::now_utc(),
    };

    let _gate = st.write_gate.lock().await;
    let mut favorites = repo::load_favorites(st.store.as_ref()).await?;
    favorites.insert(0, favorite.clone());
    repo::save_favorites(st.store.as_ref(), &favorites).await?;
    info!(favorite_id = %favorite.id, "favorite added");
    Ok(favorite)
}

pub async fn update_favorite(
    st: &AppState,
    favorite_id: Uuid,
    name: Option<String>,
    brand: Option<String>,
    price: Option<f64>,
) -> Result<FavoriteItem, EngineError> {
    if let Some(price) = price {
        validate_price(price)?;
    }

    let _gate = st.write_gate.lock().await;
    let mut favorites = repo::load_favorites(st.store.as_ref()).await?;
    let favorite = favorites
        .iter_mut()
        .find(|f| f.id == favorite_id)
        .ok_or_else(|| EngineError::NotFound("Favorite not found".into()))?;

    if let Some(name) = name {
        favorite.name = name;
    }
    if let Some(brand) = brand {
        favorite.brand = brand;
    }
    if let Some(price) = price {
        favorite.price = price;
    }
    let updated = favorite.clone();
    repo::save_favorites(st.store.as_ref(), &favorites).await?;
    Ok(updated)
}

pub async fn remove_favorite(st: &AppState, favorite_id: Uuid) -> Result<(), EngineError> {
    let _gate = st.write_gate.lock().await;
    let mut favorites = repo::load_favorites(st.store.as_ref()).await?;
    let before = favorites.len();
    favorites.retain(|f| f.id != favorite_id);
    if favorites.len() == before {
        return Err(EngineError::NotFound("Favorite not found".into()));
    }
    repo::save_favorites(st.store.as_ref(), &favorites).await
}

pub async fn list_history(st: &AppState) -> Result<Vec<GroceryHistoryEntry>, EngineError> {
    repo::load_history(st.store.as_ref()).await
}

pub async fn record_history(
    st: &AppState,
    product_name: String,
    price: f64,
    date: Date,
) -> Result<GroceryHistoryEntry, EngineError> {
    if product_name.trim().is_empty() {
        return Err(EngineError::validation("product name must not be empty"));
    }
    validate_price(price)?;

    let entry = GroceryHistoryEntry {
        id: Uuid::new_v4(),
        product_name,
        price,
        date,
        merged_into: Vec::new(),
    };

    let _gate = st.write_gate.lock().await;
    let mut entries = repo::load_history(st.store.as_ref()).await?;
    entries.push(entry.clone());
    repo::save_history(st.store.as_ref(), &entries).await?;
    Ok(entry)
}

/// Copies every entry from the previous ISO week into the current week,
/// tagging each source entry with the target week key. Entries already
/// tagged for this week are skipped, so repeating the merge within one
/// week adds nothing. Returns how many entries were added.
pub fn merge_entries(entries: &mut Vec<GroceryHistoryEntry>, today: Date) -> usize {
    let current_key = iso_week_key(today);
    let previous_key = iso_week_key(previous_week(today));

    let mut added = Vec::new();
    for entry in entries.iter_mut() {
        if iso_week_key(entry.date) == previous_key && !entry.merged_into.contains(&current_key) {
            entry.merged_into.push(current_key.clone());
            added.push(GroceryHistoryEntry {
                id: Uuid::new_v4(),
                product_name: entry.product_name.clone(),
                price: entry.price,
                date: today,
                merged_into: Vec::new(),
            });
        }
    }
    let count = added.len();
    entries.extend(added);
    count
}

pub async fn merge_previous_week(st: &AppState) -> Result<usize, EngineError> {
    let _gate = st.write_gate.lock().await;
    let mut entries = repo::load_history(st.store.as_ref()).await?;
    let added = merge_entries(&mut entries, OffsetDateTime::now_utc().date());
    if added > 0 {
        repo::save_history(st.store.as_ref(), &entries).await?;
    }
    info!(added, "previous week merged into current week");
    Ok(added)
}
