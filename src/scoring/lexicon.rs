use serde::{Deserialize, Serialize};

/// Ordered risk classification for an ingredient, worst last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Excellent,
    Good,
    Moderate,
    Concerning,
    Avoid,
}

/// One lexicon row: a lowercase name fragment, its penalty points
/// (20..=50) and its severity class.
pub struct LexiconEntry {
    pub fragment: &'static str,
    pub points: u32,
    pub severity: Severity,
}

const fn entry(fragment: &'static str, points: u32, severity: Severity) -> LexiconEntry {
    LexiconEntry {
        fragment,
        points,
        severity,
    }
}

/// Single source of truth for ingredient risk. Both the product scorer and
/// the aggregate health assessment read this table; classifying an
/// ingredient differently in the two paths is a bug.
pub const RISK_LEXICON: &[LexiconEntry] = &[
    entry("sucralose", 50, Severity::Avoid),
    entry("aspartame", 50, Severity::Avoid),
    entry("acesulfame", 45, Severity::Avoid),
    entry("acesulfame-k", 45, Severity::Avoid),
    entry("red 40", 50, Severity::Avoid),
    entry("red dye 40", 50, Severity::Avoid),
    entry("yellow 5", 45, Severity::Avoid),
    entry("yellow 6", 45, Severity::Avoid),
    entry("blue 1", 40, Severity::Avoid),
    entry("blue 2", 40, Severity::Avoid),
    entry("caramel color", 35, Severity::Concerning),
    entry("tartrazine", 45, Severity::Avoid),
    entry("sunset yellow", 45, Severity::Avoid),
    entry("tbhq", 48, Severity::Avoid),
    entry("bha", 48, Severity::Avoid),
    entry("bht", 48, Severity::Avoid),
    entry("high fructose corn syrup", 25, Severity::Concerning),
    entry("corn syrup", 20, Severity::Moderate),
    entry("partially hydrogenated", 50, Severity::Avoid),
    entry("trans fat", 50, Severity::Avoid),
    entry("monosodium glutamate", 30, Severity::Concerning),
    entry("msg", 30, Severity::Concerning),
    entry("sodium benzoate", 25, Severity::Moderate),
    entry("potassium bromate", 50, Severity::Avoid),
    entry("propyl gallate", 35, Severity::Concerning),
    entry("sodium nitrite", 40, Severity::Concerning),
    entry("sodium nitrate", 38, Severity::Concerning),
    entry("artificial flavor", 30, Severity::Concerning),
    entry("artificial flavoring", 30, Severity::Concerning),
    entry("carrageenan", 28, Severity::Concerning),
    entry("polysorbate", 32, Severity::Concerning),
];

/// Every lexicon row whose fragment occurs in the statement,
/// case-insensitively, in table order. Overlapping fragments all count;
/// each is a separate risk signal.
pub fn matches(ingredient_statement: &str) -> Vec<&'static LexiconEntry> {
    let lowered = ingredient_statement.to_lowercase();
    RISK_LEXICON
        .iter()
        .filter(|e| lowered.contains(e.fragment))
        .collect()
}

/// Accumulated penalty of the matched rows.
pub fn total_penalty(matched: &[&'static LexiconEntry]) -> f64 {
    matched.iter().map(|e| f64::from(e.points)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive_substring() {
        let matched = matches("Sugar, RED 40, natural flavors");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].fragment, "red 40");
    }

    #[test]
    fn overlapping_fragments_accumulate() {
        // "high fructose corn syrup" contains "corn syrup" as well; both
        // rows fire and both penalties count.
        let matched = matches("high fructose corn syrup");
        let fragments: Vec<_> = matched.iter().map(|e| e.fragment).collect();
        assert!(fragments.contains(&"high fructose corn syrup"));
        assert!(fragments.contains(&"corn syrup"));
        assert_eq!(total_penalty(&matched), 45.0);
    }

    #[test]
    fn penalty_sums_distinct_matches() {
        let matched = matches("contains red 40, aspartame");
        assert_eq!(total_penalty(&matched), 100.0);
    }

    #[test]
    fn points_stay_in_documented_range() {
        for row in RISK_LEXICON {
            assert!((20..=50).contains(&row.points), "{}", row.fragment);
        }
    }

    #[test]
    fn severity_ordering_puts_avoid_last() {
        assert!(Severity::Excellent < Severity::Good);
        assert!(Severity::Good < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Concerning);
        assert!(Severity::Concerning < Severity::Avoid);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Severity::Avoid).unwrap(),
            serde_json::json!("avoid")
        );
    }
}
