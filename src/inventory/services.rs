use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::AddItemRequest;
use super::repo::{self, GroceryItem};
use crate::ai::{parse, ChatMessage, TextGenClient};
use crate::error::EngineError;
use crate::state::AppState;

/// Deducts servings from one item in place, clamping at zero, and prunes
/// any item whose remaining count reaches zero. Unknown ids are a no-op:
/// consumption may reference ingredients that never resolved to a row.
pub fn apply_deduction(items: &mut Vec<GroceryItem>, item_id: Uuid, servings: f64) {
    if !servings.is_finite() || servings <= 0.0 {
        return;
    }
    for item in items.iter_mut() {
        if item.id == item_id {
            item.remaining_quantity = (item.remaining_quantity - servings).max(0.0);
        }
    }
    items.retain(|item| item.remaining_quantity > 0.0);
}

/// Best-effort match of a generated ingredient name onto an inventory row
/// by case-insensitive substring. `None` means the ingredient will simply
/// skip inventory deduction when its meal is consumed.
pub fn resolve_item(items: &[GroceryItem], ingredient_name: &str) -> Option<Uuid> {
    let needle = ingredient_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    items
        .iter()
        .find(|item| item.name.to_lowercase().contains(&needle))
        .map(|item| item.id)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ServingInfo {
    servings_per_container: f64,
    serving_size: String,
}

impl Default for ServingInfo {
    fn default() -> Self {
        Self {
            servings_per_container: 1.0,
            serving_size: "1 serving".into(),
        }
    }
}

/// Estimates package serving details for a product. Degrades to a single
/// serving whenever the service fails or answers nonsense.
async fn resolve_serving_info(
    textgen: &dyn TextGenClient,
    brand: Option<&str>,
    name: &str,
) -> ServingInfo {
    let label = match brand {
        Some(brand) if !brand.is_empty() => format!("{brand} {name}"),
        _ => name.to_string(),
    };
    let prompt = format!(
        "Based on this product: \"{label}\", determine:\n\
         1. How many servings are in a typical package?\n\
         2. What is the serving size?\n\n\
         Return ONLY a JSON object:\n\
         {{\n  \"servingsPerContainer\": 12,\n  \"servingSize\": \"1 bar (40g)\"\n}}"
    );
    let raw = match textgen.generate(&[ChatMessage::user(prompt)]).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "serving info estimation failed");
            return ServingInfo::default();
        }
    };
    let mut info: ServingInfo = parse::parse_object(&raw).unwrap_or_default();
    if !info.servings_per_container.is_finite() || info.servings_per_container <= 0.0 {
        info.servings_per_container = 1.0;
    }
    if info.serving_size.trim().is_empty() {
        info.serving_size = "1 serving".into();
    }
    info
}

/// Adds a purchased item to the ledger with `remaining = total`.
pub async fn add_item(st: &AppState, req: AddItemRequest) -> Result<GroceryItem, EngineError> {
    if req.name.trim().is_empty() {
        return Err(EngineError::validation("item name must not be empty"));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(EngineError::validation(format!(
            "invalid price: {}",
            req.price
        )));
    }
    if let Some(total) = req.total_quantity {
        if !total.is_finite() || total < 0.0 {
            return Err(EngineError::validation(format!(
                "invalid total quantity: {total}"
            )));
        }
    }
    req.nutrition.validate()?;

    // Enrichment happens before taking the write gate; the gate is never
    // held across a text-generation call.
    let serving = match (req.servings_per_container, req.serving_size.clone()) {
        (Some(count), Some(size)) if count.is_finite() && count > 0.0 => ServingInfo {
            servings_per_container: count,
            serving_size: size,
        },
        _ => resolve_serving_info(st.textgen.as_ref(), req.brand.as_deref(), &req.name).await,
    };

    let total_quantity = req
        .total_quantity
        .unwrap_or(serving.servings_per_container);
    let item = GroceryItem {
        id: Uuid::new_v4(),
        name: req.name,
        brand: req.brand,
        total_quantity,
        remaining_quantity: total_quantity,
        serving_size: serving.serving_size,
        servings_per_container: serving.servings_per_container,
        nutrition: req.nutrition,
        ingredient_statement: req.ingredient_statement,
        price: req.price,
        date_added: OffsetDateTime::now_utc(),
    };

    let _gate = st.write_gate.lock().await;
    let mut items = repo::load(st.store.as_ref()).await?;
    items.push(item.clone());
    repo::save(st.store.as_ref(), &items).await?;
    info!(item_id = %item.id, name = %item.name, "item added to inventory");
    Ok(item)
}

/// Deducts servings from one item; unknown ids are accepted silently.
pub async fn deplete(st: &AppState, item_id: Uuid, servings: f64) -> Result<(), EngineError> {
    let _gate = st.write_gate.lock().await;
    let mut items = repo::load(st.store.as_ref()).await?;
    apply_deduction(&mut items, item_id, servings);
    repo::save(st.store.as_ref(), &items).await
}

/// Items with servings left, in insertion order. The only valid input
/// surface for meal generation and risk aggregation.
pub async fn list_active(st: &AppState) -> Result<Vec<GroceryItem>, EngineError> {
    let items = repo::load(st.store.as_ref()).await?;
    Ok(items
        .into_iter()
        .filter(|item| item.remaining_quantity > 0.0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::NutritionFacts;

    fn item(name: &str, total: f64) -> GroceryItem {
        GroceryItem {
            id: Uuid::new_v4(),
            name: name.into(),
            brand: None,
            total_quantity: total,
            remaining_quantity: total,
            serving_size: "1 serving".into(),
            servings_per_container: total,
            nutrition: NutritionFacts::default(),
            ingredient_statement: None,
            price: 3.49,
            date_added: OffsetDateTime::now_utc(),
        }
    }

    fn add_request(name: &str, price: f64, total: Option<f64>) -> AddItemRequest {
        AddItemRequest {
            name: name.into(),
            brand: None,
            total_quantity: total,
            serving_size: Some("1 cup".into()),
            servings_per_container: total,
            nutrition: NutritionFacts::default(),
            ingredient_statement: None,
            price,
        }
    }

    #[test]
    fn deduction_clamps_and_prunes() {
        let target = item("Greek Yogurt", 4.0);
        let target_id = target.id;
        let mut items = vec![target, item("Oats", 10.0)];

        apply_deduction(&mut items, target_id, 1.5);
        assert_eq!(items[0].remaining_quantity, 2.5);

        apply_deduction(&mut items, target_id, 3.0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Oats");
    }

    #[test]
    fn deduction_of_unknown_id_is_a_noop() {
        let mut items = vec![item("Milk", 8.0)];
        apply_deduction(&mut items, Uuid::new_v4(), 2.0);
        assert_eq!(items[0].remaining_quantity, 8.0);
    }

    #[test]
    fn junk_servings_deduct_nothing() {
        let target = item("Milk", 8.0);
        let id = target.id;
        let mut items = vec![target];
        apply_deduction(&mut items, id, f64::NAN);
        apply_deduction(&mut items, id, -2.0);
        assert_eq!(items[0].remaining_quantity, 8.0);
    }

    #[test]
    fn invariant_holds_over_arbitrary_sequences() {
        let a = item("Eggs", 12.0);
        let b = item("Bread", 6.0);
        let (a_id, b_id) = (a.id, b.id);
        let mut items = vec![a, b];

        for servings in [0.5, 3.0, 100.0, 0.25, 7.0] {
            apply_deduction(&mut items, a_id, servings);
            apply_deduction(&mut items, b_id, servings / 2.0);
            for item in &items {
                assert!(item.remaining_quantity > 0.0);
                assert!(item.remaining_quantity <= item.total_quantity);
            }
        }
    }

    #[test]
    fn resolve_matches_by_case_insensitive_substring() {
        let items = vec![item("Chobani Greek Yogurt", 4.0), item("Whole Milk", 8.0)];
        assert_eq!(resolve_item(&items, "greek yogurt"), Some(items[0].id));
        assert_eq!(resolve_item(&items, "MILK"), Some(items[1].id));
        assert_eq!(resolve_item(&items, "salmon"), None);
        assert_eq!(resolve_item(&items, "   "), None);
    }

    #[tokio::test]
    async fn add_rejects_invalid_price_and_quantity() {
        let st = AppState::fake();
        for price in [-1.0, f64::NAN, f64::INFINITY] {
            let err = add_item(&st, add_request("Milk", price, Some(4.0)))
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
        let err = add_item(&st, add_request("Milk", 2.0, Some(-4.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn add_then_deplete_to_zero_removes_from_active() {
        let st = AppState::fake();
        let added = add_item(&st, add_request("Greek Yogurt", 5.99, Some(4.0)))
            .await
            .unwrap();
        assert_eq!(added.remaining_quantity, 4.0);

        deplete(&st, added.id, 1.5).await.unwrap();
        let active = list_active(&st).await.unwrap();
        assert_eq!(active[0].remaining_quantity, 2.5);

        deplete(&st, added.id, 3.0).await.unwrap();
        let active = list_active(&st).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn missing_serving_info_defaults_to_one_serving() {
        // The fake state's text generation always degrades, so the local
        // fallback has to kick in.
        let st = AppState::fake();
        let req = AddItemRequest {
            name: "Protein Bar".into(),
            brand: Some("Acme".into()),
            total_quantity: None,
            serving_size: None,
            servings_per_container: None,
            nutrition: NutritionFacts::default(),
            ingredient_statement: None,
            price: 1.99,
        };
        let added = add_item(&st, req).await.unwrap();
        assert_eq!(added.total_quantity, 1.0);
        assert_eq!(added.serving_size, "1 serving");
    }
}
