use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use super::repo::{HealthScoreRecord, WeightEntry};
use crate::dates::iso_date;
use crate::meals::repo::DailyMealPlan;

pub const DEFAULT_WINDOW_WEEKS: u32 = 12;

/// One week's rollup. Derived on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrend {
    #[serde(with = "iso_date")]
    pub week_start: Date,
    #[serde(with = "iso_date")]
    pub week_end: Date,
    pub average_health_score: u8,
    pub average_weight: f64,
    pub calories_consumed: f64,
    pub meals_completed: usize,
}

fn in_window(date: Date, start: Date, end: Date) -> bool {
    date >= start && date <= end
}

/// Rolls the weight, meal-plan and health-score logs up into per-week
/// summaries over the `weeks` most recent 7-day windows ending at `now`.
///
/// The health score is a single stored snapshot, so a week's
/// `average_health_score` is that snapshot's overall when its timestamp
/// falls inside the window and 0 otherwise; it is not an average over
/// multiple in-window records. Weeks with no signal at all are dropped.
/// Result is ordered oldest first.
pub fn weekly_trends(
    weights: &[WeightEntry],
    plans: &[DailyMealPlan],
    snapshot: Option<&HealthScoreRecord>,
    now: OffsetDateTime,
    weeks: u32,
) -> Vec<WeeklyTrend> {
    let mut trends = Vec::new();

    for offset in 0..weeks {
        let week_end = now.date() - Duration::days(7 * i64::from(offset));
        let week_start = week_end - Duration::days(6);

        let week_weights: Vec<f64> = weights
            .iter()
            .filter(|entry| in_window(entry.date.date(), week_start, week_end))
            .map(|entry| entry.weight)
            .collect();
        let average_weight = if week_weights.is_empty() {
            0.0
        } else {
            week_weights.iter().sum::<f64>() / week_weights.len() as f64
        };

        let consumed: Vec<_> = plans
            .iter()
            .filter(|plan| in_window(plan.date, week_start, week_end))
            .flat_map(|plan| plan.meals.iter())
            .filter(|meal| meal.is_consumed)
            .collect();
        let calories_consumed: f64 = consumed
            .iter()
            .map(|meal| meal.total_nutrition.calories)
            .sum();

        let average_health_score = snapshot
            .filter(|record| in_window(record.date.date(), week_start, week_end))
            .map_or(0, |record| record.overall);

        if !week_weights.is_empty() || !consumed.is_empty() || average_health_score > 0 {
            trends.push(WeeklyTrend {
                week_start,
                week_end,
                average_health_score,
                average_weight,
                calories_consumed,
                meals_completed: consumed.len(),
            });
        }
    }

    trends.reverse();
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meals::repo::{Meal, MealType};
    use crate::nutrition::NutritionFacts;
    use time::macros::datetime;
    use uuid::Uuid;

    const NOW: OffsetDateTime = datetime!(2026 - 08 - 07 12:00 UTC);

    fn weight_at(days_ago: i64, weight: f64) -> WeightEntry {
        WeightEntry {
            date: NOW - Duration::days(days_ago),
            weight,
            note: None,
        }
    }

    fn plan_with_meal(days_ago: i64, calories: f64, consumed: bool) -> DailyMealPlan {
        let date = (NOW - Duration::days(days_ago)).date();
        let meal = Meal {
            id: Uuid::new_v4(),
            name: "Dinner".into(),
            meal_type: MealType::Dinner,
            ingredients: vec![],
            instructions: vec![],
            total_nutrition: NutritionFacts {
                calories,
                ..NutritionFacts::default()
            },
            date,
            is_consumed: consumed,
        };
        DailyMealPlan {
            date,
            meals: vec![meal],
            total_nutrition: NutritionFacts {
                calories,
                ..NutritionFacts::default()
            },
            calorie_goal: 2000.0,
            remaining_calories: 2000.0 - calories,
        }
    }

    #[test]
    fn empty_weeks_are_dropped_and_order_is_oldest_first() {
        // Entries in the current week and two weeks back; the week in
        // between has no data and must be dropped.
        let weights = vec![weight_at(1, 180.0), weight_at(15, 184.0)];
        let trends = weekly_trends(&weights, &[], None, NOW, 3);

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].average_weight, 184.0);
        assert_eq!(trends[1].average_weight, 180.0);
        assert!(trends[0].week_start < trends[1].week_start);
    }

    #[test]
    fn average_weight_is_the_in_window_mean() {
        let weights = vec![weight_at(0, 181.0), weight_at(2, 179.0)];
        let trends = weekly_trends(&weights, &[], None, NOW, 1);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].average_weight, 180.0);
    }

    #[test]
    fn only_consumed_meals_count() {
        let plans = vec![
            plan_with_meal(1, 600.0, true),
            plan_with_meal(2, 450.0, true),
            plan_with_meal(3, 999.0, false),
        ];
        let trends = weekly_trends(&[], &plans, None, NOW, 1);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].meals_completed, 2);
        assert_eq!(trends[0].calories_consumed, 1050.0);
    }

    #[test]
    fn health_snapshot_counts_only_in_its_week() {
        use crate::health::repo::{CategoryScore, HealthCategories, ScoreStatus};
        let blank = CategoryScore {
            score: 0,
            status: ScoreStatus::Bad,
            message: String::new(),
        };
        let record = HealthScoreRecord {
            overall: 72,
            categories: HealthCategories {
                sugar: blank.clone(),
                fat: blank.clone(),
                saturated_fat: blank.clone(),
                sodium: blank.clone(),
                fiber: blank.clone(),
                processed_foods: blank,
            },
            recommendations: vec![],
            bad_ingredients: vec![],
            date: NOW - Duration::days(10),
        };
        // Snapshot sits in the second week back; make both weeks non-empty
        // via weight entries so both survive.
        let weights = vec![weight_at(1, 180.0), weight_at(10, 182.0)];
        let trends = weekly_trends(&weights, &[], Some(&record), NOW, 2);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].average_health_score, 72);
        assert_eq!(trends[1].average_health_score, 0);
    }

    #[test]
    fn windows_are_seven_days_inclusive() {
        let trends = weekly_trends(&[weight_at(6, 170.0)], &[], None, NOW, 1);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].week_end - trends[0].week_start, Duration::days(6));

        // Seven days ago falls just outside the current window.
        let trends = weekly_trends(&[weight_at(7, 170.0)], &[], None, NOW, 1);
        assert!(trends.is_empty());
    }
}
