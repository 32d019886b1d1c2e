use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lexicon;
use crate::ai::{parse, ChatMessage, TextGenClient};
use crate::nutrition::NutritionFacts;

/// Outcome of scoring one product. Immutable once computed; the optional
/// `alternatives` list is filled by a separate best-effort enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRiskResult {
    pub score: u8,
    pub warnings: Vec<String>,
    pub benefits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<String>>,
}

/// Daily reference values the base formula scores against.
const SUGAR_REF_G: f64 = 50.0;
const SODIUM_REF_MG: f64 = 2300.0;
const SATURATED_FAT_REF_G: f64 = 20.0;
const FAT_REF_G: f64 = 78.0;
const FIBER_REF_G: f64 = 30.0;
const PROTEIN_REF_G: f64 = 50.0;

/// Score below which callers may ask for healthier alternatives.
pub const ALTERNATIVES_THRESHOLD: u8 = 60;

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Computes a product's 0-100 health score from its nutrition facts and
/// ingredient statement. Pure; no side effects.
pub fn score_product(
    nutrition: &NutritionFacts,
    ingredient_statement: Option<&str>,
) -> ProductRiskResult {
    let base = (100.0 - (nutrition.sugar / SUGAR_REF_G) * 20.0
        - (nutrition.sodium / SODIUM_REF_MG) * 20.0
        - (nutrition.saturated_fat / SATURATED_FAT_REF_G) * 15.0
        - (nutrition.fat / FAT_REF_G) * 10.0
        + (nutrition.fiber / FIBER_REF_G) * 15.0
        + (nutrition.protein / PROTEIN_REF_G) * 10.0)
        .clamp(0.0, 100.0);

    let statement = ingredient_statement.unwrap_or("");
    let matched = lexicon::matches(statement);
    let penalty = lexicon::total_penalty(&matched);

    let score = (base - penalty).max(0.0).round().clamp(0.0, 100.0) as u8;

    let mut warnings = Vec::new();
    if nutrition.sugar > 15.0 {
        push_unique(&mut warnings, "High in sugar".into());
    }
    if nutrition.sodium > 400.0 {
        push_unique(&mut warnings, "High in sodium".into());
    }
    if nutrition.saturated_fat > 5.0 {
        push_unique(&mut warnings, "High in saturated fat".into());
    }
    if !matched.is_empty() {
        let named: Vec<&str> = matched.iter().take(2).map(|e| e.fragment).collect();
        push_unique(&mut warnings, format!("Contains: {}", named.join(", ")));
    }

    let mut benefits = Vec::new();
    if nutrition.protein > 10.0 {
        push_unique(&mut benefits, "Good protein source".into());
    }
    if nutrition.fiber > 5.0 {
        push_unique(&mut benefits, "High fiber".into());
    }
    if matched.is_empty() && !statement.to_lowercase().contains("artificial") {
        push_unique(&mut benefits, "No artificial ingredients".into());
    }

    ProductRiskResult {
        score,
        warnings,
        benefits,
        alternatives: None,
    }
}

/// Asks the text-generation service for 2-3 healthier branded
/// alternatives. Best-effort: any failure or junk response yields `None`
/// and never fails the caller.
pub async fn enrich_alternatives(
    textgen: &dyn TextGenClient,
    brand: &str,
    name: &str,
) -> Option<Vec<String>> {
    let prompt = format!(
        "For this product: \"{brand} {name}\", suggest 2-3 healthier brand \
         alternatives available in US grocery stores. Return as a simple JSON \
         array of strings. For example: [\"Brand A Product\", \"Brand B Product\"]"
    );
    let raw = match textgen.generate(&[ChatMessage::user(prompt)]).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "alternatives generation failed");
            return None;
        }
    };
    let span = parse::extract_first_json_array(&raw)?;
    let alternatives: Vec<String> = serde_json::from_str(span).ok()?;
    if alternatives.is_empty() {
        return None;
    }
    Some(alternatives)
}
