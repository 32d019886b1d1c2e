use std::collections::HashMap;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::repo::{
    self, BadIngredient, CategoryScore, HealthCategories, HealthScoreRecord, ScoreStatus,
    WeightEntry,
};
use crate::ai::{parse, ChatMessage, TextGenClient};
use crate::error::EngineError;
use crate::inventory::repo::GroceryItem;
use crate::inventory::services as inventory_services;
use crate::nutrition::NutritionFacts;
use crate::profile::{self, Gender, UserProfile};
use crate::scoring::{lexicon, Severity};
use crate::state::AppState;

/// Personalized daily reference limits derived from the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTargets {
    pub calorie_need: f64,
    pub max_sugar: f64,
    pub max_sodium: f64,
    pub max_saturated_fat: f64,
    pub max_fat: f64,
    pub min_fiber: f64,
}

const DEFAULT_WEIGHT_LBS: f64 = 150.0;
const DEFAULT_HEIGHT_IN: f64 = 66.0;
const ASSUMED_AGE_YEARS: f64 = 30.0;
const ACTIVITY_FACTOR: f64 = 1.55;
const FAT_REF_G: f64 = 78.0;

/// Estimated servings eaten per day when projecting inventory onto a
/// daily intake.
const SERVINGS_PER_DAY: f64 = 3.0;

pub fn personal_targets(profile: &UserProfile) -> DailyTargets {
    let weight = profile.weight.unwrap_or(DEFAULT_WEIGHT_LBS);
    let height = profile.height.unwrap_or(DEFAULT_HEIGHT_IN);

    // Harris-Benedict, weight converted to kg and height to cm.
    let bmr = match profile.gender {
        Some(Gender::Male) => {
            88.362 + 13.397 * weight / 2.205 + 4.799 * height * 2.54
                - 5.677 * ASSUMED_AGE_YEARS
        }
        Some(Gender::Female) => {
            447.593 + 9.247 * weight / 2.205 + 3.098 * height * 2.54
                - 4.330 * ASSUMED_AGE_YEARS
        }
        _ => 1800.0,
    };
    let calorie_need = (bmr * ACTIVITY_FACTOR).round();

    let male = profile.gender == Some(Gender::Male);
    let mut max_sugar = if male { 36.0 } else { 25.0 };
    if profile.has_condition("diabetes") {
        max_sugar /= 2.0;
    }

    DailyTargets {
        calorie_need,
        max_sugar,
        max_sodium: 2300.0,
        max_saturated_fat: (calorie_need * 0.10 / 9.0).round(),
        max_fat: FAT_REF_G,
        min_fiber: if male { 38.0 } else { 25.0 },
    }
}

pub fn status_for(score: u8) -> ScoreStatus {
    match score {
        80..=u8::MAX => ScoreStatus::Excellent,
        60..=79 => ScoreStatus::Good,
        40..=59 => ScoreStatus::Fair,
        20..=39 => ScoreStatus::Poor,
        _ => ScoreStatus::Bad,
    }
}

fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Scores a limit-type nutrient: 100 when nothing is eaten, 50 at the
/// limit, 0 at twice the limit.
fn limit_score(intake: f64, limit: f64) -> u8 {
    if limit <= 0.0 {
        return 0;
    }
    clamp_score(100.0 - 50.0 * intake / limit)
}

/// Scores fiber against its daily minimum: 100 at or above target.
fn fiber_score(intake: f64, target: f64) -> u8 {
    if target <= 0.0 {
        return 100;
    }
    clamp_score(100.0 * intake / target)
}

fn category(score: u8, message: String) -> CategoryScore {
    CategoryScore {
        score,
        status: status_for(score),
        message,
    }
}

fn severity_reason(severity: Severity) -> &'static str {
    match severity {
        Severity::Avoid => "Artificial additive with significant evidence of harm",
        Severity::Concerning => "Additive linked to potential health concerns",
        _ => "Highly processed ingredient best consumed sparingly",
    }
}

fn severity_impact(severity: Severity) -> &'static str {
    match severity {
        Severity::Avoid => {
            "Regular intake is associated with adverse effects; choose products without it."
        }
        Severity::Concerning => {
            "Evidence is mixed; limiting exposure is the safer choice."
        }
        _ => "Fine occasionally, but whole-food alternatives are the better habit.",
    }
}

/// Builds one `BadIngredient` per distinct matched lexicon fragment,
/// merging the products each was found in. Severity comes straight from
/// the lexicon, the same table the product scorer uses.
fn collect_bad_ingredients(inventory: &[GroceryItem]) -> Vec<BadIngredient> {
    let mut found: Vec<BadIngredient> = Vec::new();
    for item in inventory {
        let statement = item.ingredient_statement.as_deref().unwrap_or("");
        for entry in lexicon::matches(statement) {
            let product = item.name.clone();
            match found.iter_mut().find(|b| b.name == entry.fragment) {
                Some(existing) => {
                    if !existing.found_in.contains(&product) {
                        existing.found_in.push(product);
                    }
                }
                None => found.push(BadIngredient {
                    name: entry.fragment.to_string(),
                    severity: entry.severity,
                    reason: severity_reason(entry.severity).into(),
                    found_in: vec![product],
                    health_impact: severity_impact(entry.severity).into(),
                    alternatives: Vec::new(),
                }),
            }
        }
    }
    found
}

/// Deterministic aggregate assessment of the active inventory. Pure:
/// reproducible without the text-generation service.
pub fn assess(
    inventory: &[GroceryItem],
    profile: &UserProfile,
    now: OffsetDateTime,
) -> HealthScoreRecord {
    let targets = personal_targets(profile);
    let count = inventory.len().max(1) as f64;

    let per_serving_avg =
        NutritionFacts::sum(inventory.iter().map(|i| &i.nutrition)).scale(1.0 / count);
    let intake = per_serving_avg.scale(SERVINGS_PER_DAY);

    let total_penalty: f64 = inventory
        .iter()
        .map(|item| {
            let statement = item.ingredient_statement.as_deref().unwrap_or("");
            lexicon::total_penalty(&lexicon::matches(statement))
        })
        .sum();
    let penalty_density = total_penalty / count;

    let sugar = limit_score(intake.sugar, targets.max_sugar);
    let fat = limit_score(intake.fat, targets.max_fat);
    let saturated_fat = limit_score(intake.saturated_fat, targets.max_saturated_fat);
    let sodium = limit_score(intake.sodium, targets.max_sodium);
    let fiber = fiber_score(intake.fiber, targets.min_fiber);
    let processed = clamp_score(100.0 - penalty_density);

    let bad_ingredients = collect_bad_ingredients(inventory);

    let categories = HealthCategories {
        sugar: category(
            sugar,
            format!(
                "Estimated {:.0}g of sugar per day against your {:.0}g limit",
                intake.sugar, targets.max_sugar
            ),
        ),
        fat: category(
            fat,
            format!(
                "Estimated {:.0}g of fat per day against a {:.0}g reference",
                intake.fat, targets.max_fat
            ),
        ),
        saturated_fat: category(
            saturated_fat,
            format!(
                "Estimated {:.0}g of saturated fat per day against your {:.0}g limit",
                intake.saturated_fat, targets.max_saturated_fat
            ),
        ),
        sodium: category(
            sodium,
            format!(
                "Estimated {:.0}mg of sodium per day against the {:.0}mg limit",
                intake.sodium, targets.max_sodium
            ),
        ),
        fiber: category(
            fiber,
            format!(
                "Estimated {:.0}g of fiber per day toward your {:.0}g minimum",
                intake.fiber, targets.min_fiber
            ),
        ),
        processed_foods: category(
            processed,
            if bad_ingredients.is_empty() {
                "No flagged artificial ingredients in your groceries".to_string()
            } else {
                format!(
                    "{} flagged ingredient(s) across your groceries",
                    bad_ingredients.len()
                )
            },
        ),
    };

    let overall = clamp_score(
        0.20 * f64::from(sugar)
            + 0.10 * f64::from(fat)
            + 0.15 * f64::from(saturated_fat)
            + 0.15 * f64::from(sodium)
            + 0.10 * f64::from(fiber)
            + 0.30 * f64::from(processed),
    );

    let mut recommendations = Vec::new();
    if sugar < 60 {
        recommendations.push(format!(
            "Cut back on sugary items; aim for under {:.0}g of sugar per day",
            targets.max_sugar
        ));
    }
    if saturated_fat < 60 {
        recommendations.push("Swap saturated-fat-heavy items for leaner options".to_string());
    }
    if sodium < 60 {
        recommendations.push("Choose low-sodium versions of your staples".to_string());
    }
    if fiber < 60 {
        recommendations.push(format!(
            "Add fiber-rich foods to reach {:.0}g per day",
            targets.min_fiber
        ));
    }
    if processed < 60 {
        recommendations.push("Reduce processed foods with artificial additives".to_string());
    }
    for bad in &bad_ingredients {
        if bad.severity == Severity::Avoid {
            recommendations.push(format!(
                "Avoid products containing {} (found in {})",
                bad.name,
                bad.found_in.join(", ")
            ));
        }
    }

    HealthScoreRecord {
        overall,
        categories,
        recommendations,
        bad_ingredients,
        date: now,
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct IngredientNarrative {
    health_impact: String,
    alternatives: Vec<String>,
}

/// Optional narrative enrichment for flagged ingredients. Best-effort: on
/// any failure the locally computed defaults stand.
async fn enrich_bad_ingredients(textgen: &dyn TextGenClient, record: &mut HealthScoreRecord) {
    if record.bad_ingredients.is_empty() {
        return;
    }
    let names: Vec<&str> = record
        .bad_ingredients
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    let prompt = format!(
        "You are a nutrition expert. For each of these food additives: {names}, \
         describe the health impact in 2-3 sentences and suggest 2-3 healthier \
         branded alternatives. Return ONLY a JSON object keyed by additive name, \
         each value of the form {{\"healthImpact\": \"...\", \"alternatives\": \
         [\"...\"]}}.",
        names = names.join(", ")
    );
    let raw = match textgen.generate(&[ChatMessage::user(prompt)]).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "bad ingredient enrichment failed");
            return;
        }
    };
    let narratives: HashMap<String, IngredientNarrative> = match parse::parse_object(&raw) {
        Ok(map) => map,
        Err(e) => {
            debug!(error = %e, "bad ingredient enrichment unparseable");
            return;
        }
    };
    for bad in &mut record.bad_ingredients {
        if let Some(n) = narratives
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&bad.name))
            .map(|(_, n)| n)
        {
            if !n.health_impact.trim().is_empty() {
                bad.health_impact = n.health_impact.clone();
            }
            if !n.alternatives.is_empty() {
                bad.alternatives = n.alternatives.clone();
            }
        }
    }
}

/// Recomputes and stores the health score for the current inventory.
pub async fn recalculate(st: &AppState) -> Result<HealthScoreRecord, EngineError> {
    let inventory = inventory_services::list_active(st).await?;
    if inventory.is_empty() {
        return Err(EngineError::validation(
            "No groceries in inventory. Please add items to your budget first.",
        ));
    }
    let profile = profile::load(st.store.as_ref()).await?;

    let mut record = assess(&inventory, &profile, OffsetDateTime::now_utc());
    // Narrative only; the numeric result above is final either way.
    enrich_bad_ingredients(st.textgen.as_ref(), &mut record).await;

    let _gate = st.write_gate.lock().await;
    repo::save_score(st.store.as_ref(), &record).await?;
    info!(overall = record.overall, "health score recalculated");
    Ok(record)
}

pub async fn current_score(st: &AppState) -> Result<Option<HealthScoreRecord>, EngineError> {
    repo::load_score(st.store.as_ref()).await
}

/// Appends a weight entry, newest first.
pub async fn add_weight(
    st: &AppState,
    weight: f64,
    note: Option<String>,
) -> Result<WeightEntry, EngineError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(EngineError::validation(format!("invalid weight: {weight}")));
    }
    let entry = WeightEntry {
        date: OffsetDateTime::now_utc(),
        weight,
        note,
    };

    let _gate = st.write_gate.lock().await;
    let mut history = repo::load_weights(st.store.as_ref()).await?;
    history.insert(0, entry.clone());
    repo::save_weights(st.store.as_ref(), &history).await?;
    Ok(entry)
}

pub async fn weight_history(st: &AppState) -> Result<Vec<WeightEntry>, EngineError> {
    repo::load_weights(st.store.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn item(name: &str, nutrition: NutritionFacts, ingredients: Option<&str>) -> GroceryItem {
        GroceryItem {
            id: Uuid::new_v4(),
            name: name.into(),
            brand: None,
            total_quantity: 4.0,
            remaining_quantity: 4.0,
            serving_size: "1 serving".into(),
            servings_per_container: 4.0,
            nutrition,
            ingredient_statement: ingredients.map(String::from),
            price: 3.99,
            date_added: datetime!(2026 - 08 - 01 09:00 UTC),
        }
    }

    fn male_profile() -> UserProfile {
        UserProfile {
            gender: Some(Gender::Male),
            weight: Some(180.0),
            height: Some(70.0),
            ..UserProfile::default()
        }
    }

    #[test]
    fn targets_follow_gender_and_conditions() {
        let male = personal_targets(&male_profile());
        assert_eq!(male.max_sugar, 36.0);
        assert_eq!(male.min_fiber, 38.0);
        assert_eq!(male.max_sodium, 2300.0);

        let mut diabetic = male_profile();
        diabetic.health_conditions = vec!["diabetes".into()];
        assert_eq!(personal_targets(&diabetic).max_sugar, 18.0);

        let unspecified = personal_targets(&UserProfile::default());
        assert_eq!(unspecified.max_sugar, 25.0);
        assert_eq!(unspecified.min_fiber, 25.0);
        // BMR fallback of 1800 at the 1.55 activity factor.
        assert_eq!(unspecified.calorie_need, 2790.0);
    }

    #[test]
    fn clean_inventory_scores_high() {
        let inventory = vec![item(
            "Rolled Oats",
            NutritionFacts {
                calories: 150.0,
                protein: 5.0,
                fiber: 4.0,
                ..NutritionFacts::default()
            },
            Some("whole grain rolled oats"),
        )];
        let record = assess(&inventory, &male_profile(), datetime!(2026 - 08 - 05 10:00 UTC));
        assert_eq!(record.categories.sugar.score, 100);
        assert_eq!(record.categories.processed_foods.score, 100);
        assert!(record.bad_ingredients.is_empty());
        assert!(record.overall >= 80);
    }

    #[test]
    fn flagged_additives_sink_processed_foods_and_merge_found_in() {
        let soda = |name: &str| {
            item(
                name,
                NutritionFacts {
                    sugar: 40.0,
                    ..NutritionFacts::default()
                },
                Some("carbonated water, aspartame, red 40"),
            )
        };
        let inventory = vec![soda("Diet Soda"), soda("Fruit Punch")];
        let record = assess(&inventory, &male_profile(), datetime!(2026 - 08 - 05 10:00 UTC));

        // 100 penalty points per item.
        assert_eq!(record.categories.processed_foods.score, 0);
        assert_eq!(record.categories.processed_foods.status, ScoreStatus::Bad);

        // One entry per fragment, found-in merged across both drinks.
        assert_eq!(record.bad_ingredients.len(), 2);
        let aspartame = record
            .bad_ingredients
            .iter()
            .find(|b| b.name == "aspartame")
            .unwrap();
        assert_eq!(aspartame.severity, Severity::Avoid);
        assert_eq!(
            aspartame.found_in,
            vec!["Diet Soda".to_string(), "Fruit Punch".to_string()]
        );

        assert!(record
            .recommendations
            .iter()
            .any(|r| r.contains("aspartame")));
        assert!(record.overall < 60);
    }

    #[test]
    fn scores_are_deterministic_and_bounded() {
        let inventory = vec![item(
            "Candy",
            NutritionFacts {
                sugar: 90.0,
                sodium: 4000.0,
                saturated_fat: 60.0,
                fat: 200.0,
                ..NutritionFacts::default()
            },
            Some("sugar, red 40, yellow 5, tbhq"),
        )];
        let now = datetime!(2026 - 08 - 05 10:00 UTC);
        let a = assess(&inventory, &male_profile(), now);
        let b = assess(&inventory, &male_profile(), now);
        assert_eq!(a, b);
        assert_eq!(a.categories.sugar.score, 0);
        assert!(a.overall <= 100);
    }

    #[tokio::test]
    async fn recalculate_requires_inventory() {
        let st = AppState::fake();
        let err = recalculate(&st).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn add_weight_validates_and_prepends() {
        let st = AppState::fake();
        assert!(add_weight(&st, f64::NAN, None).await.is_err());
        assert!(add_weight(&st, -10.0, None).await.is_err());

        add_weight(&st, 180.0, None).await.unwrap();
        add_weight(&st, 179.5, Some("after run".into())).await.unwrap();
        let history = weight_history(&st).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].weight, 179.5);
    }
}
