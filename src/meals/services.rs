use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{self, DailyMealPlan, Meal, MealIngredient, MealType};
use crate::ai::{parse, ChatMessage};
use crate::error::EngineError;
use crate::inventory::repo::GroceryItem;
use crate::inventory::{repo as inventory_repo, services as inventory_services};
use crate::nutrition::NutritionFacts;
use crate::profile::{self, UserProfile};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GeneratedIngredient {
    name: String,
    servings: f64,
    nutrition: NutritionFacts,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GeneratedMeal {
    name: String,
    #[serde(rename = "type")]
    meal_type: String,
    ingredients: Vec<GeneratedIngredient>,
    instructions: Vec<String>,
    total_nutrition: NutritionFacts,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GeneratedPlan {
    meals: Vec<GeneratedMeal>,
}

pub async fn list_plans(st: &AppState) -> Result<Vec<DailyMealPlan>, EngineError> {
    repo::load(st.store.as_ref()).await
}

fn planning_prompt(inventory: &[GroceryItem], profile: &UserProfile, days: u32) -> String {
    let inventory_list: Vec<serde_json::Value> = inventory
        .iter()
        .map(|item| {
            serde_json::json!({
                "name": item.name,
                "brand": item.brand.clone().unwrap_or_default(),
                "remaining": item.remaining_quantity,
                "servingSize": item.serving_size,
                "nutrition": item.nutrition,
            })
        })
        .collect();

    let restrictions = if profile.dietary_preferences.is_empty() {
        "none".to_string()
    } else {
        profile.dietary_preferences.join(", ")
    };
    let conditions = if profile.health_conditions.is_empty() {
        "none".to_string()
    } else {
        profile.health_conditions.join(", ")
    };

    format!(
        "You are a meal planning expert. Create a COMPLETE {days}-day meal plan \
         using ONLY these available groceries:\n\n{inventory}\n\n\
         User profile: dietary restrictions: {restrictions}; health conditions: \
         {conditions}; daily calorie goal: {goal} calories.\n\n\
         Requirements:\n\
         1. Create 3 meals per day (breakfast, lunch, dinner) for ALL {days} days\n\
         2. Add snacks ONLY if needed to meet calorie goals\n\
         3. Calculate nutrition for the stated servings from the provided data\n\
         4. Track inventory and never use more servings than available\n\
         5. Honor all dietary restrictions and health conditions\n\
         6. Provide simple cooking instructions (1-3 steps)\n\n\
         Return ONLY a valid JSON array of {days} daily plans (no markdown), \
         each of the form:\n\
         {{\"meals\": [{{\"name\": \"Scrambled Eggs\", \"type\": \"breakfast\", \
         \"ingredients\": [{{\"name\": \"Eggs\", \"servings\": 2, \
         \"nutrition\": {{\"calories\": 140, \"protein\": 12, \"carbs\": 2, \
         \"fat\": 10, \"fiber\": 0, \"sugar\": 0, \"sodium\": 140, \
         \"saturatedFat\": 3}}}}], \"instructions\": [\"Beat eggs\", \"Cook in pan\"], \
         \"totalNutrition\": {{\"calories\": 140, \"protein\": 12, \"carbs\": 2, \
         \"fat\": 10, \"fiber\": 0, \"sugar\": 0, \"sodium\": 140, \
         \"saturatedFat\": 3}}}}]}}",
        inventory = serde_json::to_string(&inventory_list).unwrap_or_else(|_| "[]".into()),
        goal = profile.daily_calorie_goal,
    )
}

fn simple_meal(
    name: &str,
    meal_type: MealType,
    calories: f64,
    macros: (f64, f64, f64, f64, f64, f64, f64),
    date: time::Date,
) -> Meal {
    let (protein, carbs, fat, fiber, sugar, sodium, saturated_fat) = macros;
    Meal {
        id: Uuid::new_v4(),
        name: name.into(),
        meal_type,
        ingredients: Vec::new(),
        instructions: vec![format!(
            "Prepare a simple {} with available items",
            name.to_lowercase()
        )],
        total_nutrition: NutritionFacts {
            calories,
            protein,
            carbs,
            fat,
            fiber,
            sugar,
            sodium,
            saturated_fat,
        },
        date,
        is_consumed: false,
    }
}

/// Filler day used when the model returns fewer days than requested:
/// breakfast/lunch/dinner splitting the calorie goal 25/35/40.
fn fallback_day_meals(calorie_goal: f64, date: time::Date) -> Vec<Meal> {
    vec![
        simple_meal(
            "Simple Breakfast",
            MealType::Breakfast,
            (calorie_goal * 0.25).floor(),
            (15.0, 40.0, 10.0, 5.0, 5.0, 200.0, 3.0),
            date,
        ),
        simple_meal(
            "Simple Lunch",
            MealType::Lunch,
            (calorie_goal * 0.35).floor(),
            (25.0, 50.0, 15.0, 8.0, 8.0, 300.0, 5.0),
            date,
        ),
        simple_meal(
            "Simple Dinner",
            MealType::Dinner,
            (calorie_goal * 0.4).floor(),
            (30.0, 60.0, 18.0, 10.0, 10.0, 400.0, 6.0),
            date,
        ),
    ]
}

fn convert_meal(generated: GeneratedMeal, date: time::Date, inventory: &[GroceryItem]) -> Meal {
    let ingredients: Vec<MealIngredient> = generated
        .ingredients
        .into_iter()
        .filter_map(|ing| {
            if !ing.servings.is_finite() || ing.servings <= 0.0 {
                return None;
            }
            Some(MealIngredient {
                grocery_item_id: inventory_services::resolve_item(inventory, &ing.name),
                servings: ing.servings,
                nutrition: ing.nutrition.sanitize(),
                name: ing.name,
            })
        })
        .collect();

    // Ingredient nutrition covers the stated servings, so the meal total is
    // their plain sum; ingredient-less meals keep the model's own total.
    let total_nutrition = if ingredients.is_empty() {
        generated.total_nutrition.sanitize()
    } else {
        NutritionFacts::sum(ingredients.iter().map(|i| &i.nutrition))
    };

    let name = if generated.name.trim().is_empty() {
        "Meal".to_string()
    } else {
        generated.name
    };
    let instructions = if generated.instructions.is_empty() {
        vec!["Prepare meal".to_string()]
    } else {
        generated.instructions
    };

    Meal {
        id: Uuid::new_v4(),
        name,
        meal_type: MealType::parse(&generated.meal_type),
        ingredients,
        instructions,
        total_nutrition,
        date,
        is_consumed: false,
    }
}

fn build_plan(date: time::Date, meals: Vec<Meal>, calorie_goal: f64) -> DailyMealPlan {
    let total_nutrition = NutritionFacts::sum(meals.iter().map(|m| &m.total_nutrition));
    DailyMealPlan {
        date,
        meals,
        total_nutrition,
        calorie_goal,
        remaining_calories: calorie_goal - total_nutrition.calories,
    }
}

/// Generates and stores a fresh meal plan for the next `days` days.
///
/// Needs at least one active inventory item; an empty pantry is an
/// actionable user error, never a silent empty plan. The model call runs
/// before the write gate is taken.
pub async fn generate_plans(st: &AppState, days: u32) -> Result<Vec<DailyMealPlan>, EngineError> {
    if !(1..=31).contains(&days) {
        return Err(EngineError::validation(format!(
            "days must be between 1 and 31, got {days}"
        )));
    }

    let inventory = inventory_services::list_active(st).await?;
    if inventory.is_empty() {
        return Err(EngineError::validation(
            "No groceries in inventory. Please add items to your budget first.",
        ));
    }
    let profile = profile::load(st.store.as_ref()).await?;

    let prompt = planning_prompt(&inventory, &profile, days);
    let raw = st.textgen.generate(&[ChatMessage::user(prompt)]).await?;
    let generated: Vec<GeneratedPlan> = parse::parse_array(&raw)?;

    if (generated.len() as u32) < days {
        warn!(
            generated = generated.len(),
            requested = days,
            "model returned fewer days than requested; filling the rest"
        );
    }

    let today = OffsetDateTime::now_utc().date();
    let mut generated = generated.into_iter();
    let plans: Vec<DailyMealPlan> = (0..days)
        .map(|offset| {
            let date = today + Duration::days(i64::from(offset));
            let meals = match generated.next() {
                Some(plan) if !plan.meals.is_empty() => plan
                    .meals
                    .into_iter()
                    .map(|meal| convert_meal(meal, date, &inventory))
                    .collect(),
                _ => fallback_day_meals(profile.daily_calorie_goal, date),
            };
            build_plan(date, meals, profile.daily_calorie_goal)
        })
        .collect();

    let _gate = st.write_gate.lock().await;
    repo::save(st.store.as_ref(), &plans).await?;
    info!(days = plans.len(), "meal plans generated");
    Ok(plans)
}

/// Marks a meal consumed, deducting its resolved ingredients from the
/// inventory first. The whole operation runs under the write gate: a
/// second call is an idempotent no-op and two concurrent calls can never
/// double-deduct.
pub async fn consume_meal(st: &AppState, meal_id: Uuid) -> Result<Meal, EngineError> {
    let _gate = st.write_gate.lock().await;

    let mut plans = repo::load(st.store.as_ref()).await?;
    let meal = plans
        .iter()
        .flat_map(|plan| plan.meals.iter())
        .find(|meal| meal.id == meal_id)
        .cloned()
        .ok_or_else(|| EngineError::NotFound("Meal not found".into()))?;

    if meal.is_consumed {
        return Ok(meal);
    }

    let mut items = inventory_repo::load(st.store.as_ref()).await?;
    for ingredient in &meal.ingredients {
        // Unresolved ingredients deduct nothing; accepted lossy behavior.
        if let Some(item_id) = ingredient.grocery_item_id {
            inventory_services::apply_deduction(&mut items, item_id, ingredient.servings);
        }
    }
    inventory_repo::save(st.store.as_ref(), &items).await?;

    let mut consumed = meal;
    for plan in &mut plans {
        for meal in &mut plan.meals {
            if meal.id == meal_id {
                meal.is_consumed = true;
                consumed = meal.clone();
            }
        }
    }
    repo::save(st.store.as_ref(), &plans).await?;

    info!(meal_id = %meal_id, "meal consumed");
    Ok(consumed)
}
