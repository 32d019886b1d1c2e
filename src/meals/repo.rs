use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::dates::iso_date;
use crate::error::EngineError;
use crate::nutrition::NutritionFacts;
use crate::storage::{self, keys, DurableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Lenient parse for model-generated labels; anything unknown lands in
    /// the snack bucket.
    pub fn parse(raw: &str) -> MealType {
        match raw.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            _ => MealType::Snack,
        }
    }
}

/// A meal ingredient with its nutrition frozen at meal-creation time, so
/// later inventory changes never rewrite historical meal nutrition. The
/// grocery reference is a lookup id only, and optional: generated
/// ingredients that never matched an inventory row stay unresolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealIngredient {
    pub grocery_item_id: Option<Uuid>,
    pub name: String,
    pub servings: f64,
    pub nutrition: NutritionFacts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub ingredients: Vec<MealIngredient>,
    pub instructions: Vec<String>,
    pub total_nutrition: NutritionFacts,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub is_consumed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyMealPlan {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<Meal>,
    pub total_nutrition: NutritionFacts,
    pub calorie_goal: f64,
    /// Goal minus planned calories; negative means the day is over goal.
    pub remaining_calories: f64,
}

pub async fn load(store: &dyn DurableStore) -> Result<Vec<DailyMealPlan>, EngineError> {
    storage::load(store, keys::MEAL_PLANS).await
}

pub async fn save(store: &dyn DurableStore, plans: &[DailyMealPlan]) -> Result<(), EngineError> {
    storage::save(store, keys::MEAL_PLANS, &plans).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_parse_is_lenient() {
        assert_eq!(MealType::parse("Breakfast"), MealType::Breakfast);
        assert_eq!(MealType::parse(" dinner "), MealType::Dinner);
        assert_eq!(MealType::parse("brunch"), MealType::Snack);
    }

    #[test]
    fn meal_serializes_with_client_field_names() {
        let meal = Meal {
            id: Uuid::new_v4(),
            name: "Scrambled Eggs".into(),
            meal_type: MealType::Breakfast,
            ingredients: vec![],
            instructions: vec!["Beat eggs".into()],
            total_nutrition: NutritionFacts::default(),
            date: time::macros::date!(2026 - 08 - 03),
            is_consumed: false,
        };
        let json = serde_json::to_value(&meal).unwrap();
        assert_eq!(json["type"], "breakfast");
        assert_eq!(json["isConsumed"], false);
        assert_eq!(json["date"], "2026-08-03");
    }
}
