use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Nutrition facts for one reference serving. Grams except `calories`
/// (kcal) and `sodium` (mg).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NutritionFacts {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub saturated_fat: f64,
}

impl NutritionFacts {
    fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
            ("sodium", self.sodium),
            ("saturatedFat", self.saturated_fat),
        ]
    }

    /// Rejects negative or non-finite values. Caller-provided facts must
    /// pass this before entering the ledger.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in self.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::validation(format!(
                    "invalid nutrition value for {name}: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Coerces junk from the text-generation boundary to zero instead of
    /// rejecting it. Enrichment data is never trusted blindly.
    pub fn sanitize(mut self) -> Self {
        for value in [
            &mut self.calories,
            &mut self.protein,
            &mut self.carbs,
            &mut self.fat,
            &mut self.fiber,
            &mut self.sugar,
            &mut self.sodium,
            &mut self.saturated_fat,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
            }
        }
        self
    }

    pub fn add(&mut self, other: &NutritionFacts) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fat += other.fat;
        self.fiber += other.fiber;
        self.sugar += other.sugar;
        self.sodium += other.sodium;
        self.saturated_fat += other.saturated_fat;
    }

    pub fn sum<'a>(items: impl IntoIterator<Item = &'a NutritionFacts>) -> NutritionFacts {
        let mut total = NutritionFacts::default();
        for item in items {
            total.add(item);
        }
        total
    }

    pub fn scale(&self, factor: f64) -> NutritionFacts {
        NutritionFacts {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
            sodium: self.sodium * factor,
            saturated_fat: self.saturated_fat * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_negative_and_non_finite() {
        let mut facts = NutritionFacts::default();
        assert!(facts.validate().is_ok());

        facts.sugar = -1.0;
        assert!(facts.validate().is_err());

        facts.sugar = f64::NAN;
        assert!(facts.validate().is_err());

        facts.sugar = f64::INFINITY;
        assert!(facts.validate().is_err());
    }

    #[test]
    fn sanitize_zeroes_out_junk() {
        let facts = NutritionFacts {
            calories: f64::NAN,
            protein: -3.0,
            sugar: 12.0,
            ..NutritionFacts::default()
        }
        .sanitize();
        assert_eq!(facts.calories, 0.0);
        assert_eq!(facts.protein, 0.0);
        assert_eq!(facts.sugar, 12.0);
    }

    #[test]
    fn sum_and_scale() {
        let a = NutritionFacts {
            calories: 100.0,
            protein: 10.0,
            ..NutritionFacts::default()
        };
        let b = NutritionFacts {
            calories: 50.0,
            fiber: 4.0,
            ..NutritionFacts::default()
        };
        let total = NutritionFacts::sum([&a, &b]);
        assert_eq!(total.calories, 150.0);
        assert_eq!(total.protein, 10.0);
        assert_eq!(total.fiber, 4.0);

        let half = total.scale(0.5);
        assert_eq!(half.calories, 75.0);
    }

    #[test]
    fn serde_uses_camel_case() {
        let facts = NutritionFacts {
            saturated_fat: 3.5,
            ..NutritionFacts::default()
        };
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["saturatedFat"], 3.5);
    }
}
