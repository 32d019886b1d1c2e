//! Defensive extraction of JSON from free-form model output.
//!
//! Responses routinely wrap the payload in prose or markdown fences; the
//! engine takes the first plausible bracketed span and refuses to crash on
//! anything else.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::EngineError;

lazy_static! {
    static ref ARRAY_SPAN: Regex = Regex::new(r"(?s)\[.*\]").unwrap();
    static ref OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    static ref FIRST_ARRAY_SPAN: Regex = Regex::new(r"(?s)\[.*?\]").unwrap();
}

/// Widest `[...]` span in the text, if any.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    ARRAY_SPAN.find(raw).map(|m| m.as_str())
}

/// Widest `{...}` span in the text, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    OBJECT_SPAN.find(raw).map(|m| m.as_str())
}

/// Narrowest leading `[...]` span; used for short flat lists where the
/// model tends to append trailing commentary.
pub fn extract_first_json_array(raw: &str) -> Option<&str> {
    FIRST_ARRAY_SPAN.find(raw).map(|m| m.as_str())
}

/// Parses the array span out of a raw response. A missing span, a parse
/// failure or an empty array all degrade rather than crash.
pub fn parse_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, EngineError> {
    let span = extract_json_array(raw)
        .ok_or_else(|| EngineError::degraded("response contained no JSON array"))?;
    let items: Vec<T> = serde_json::from_str(span)
        .map_err(|e| EngineError::degraded(format!("unparseable JSON array: {e}")))?;
    if items.is_empty() {
        return Err(EngineError::degraded("response JSON array was empty"));
    }
    Ok(items)
}

/// Parses the object span out of a raw response, degrading on failure.
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, EngineError> {
    let span = extract_json_object(raw)
        .ok_or_else(|| EngineError::degraded("response contained no JSON object"))?;
    serde_json::from_str(span)
        .map_err(|e| EngineError::degraded(format!("unparseable JSON object: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_array_from_prose() {
        let raw = "Sure! Here is the list:\n```json\n[1, 2, 3]\n```\nHope it helps.";
        assert_eq!(extract_json_array(raw), Some("[1, 2, 3]"));
        let parsed: Vec<i32> = parse_array(raw).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn extracts_object_from_prose() {
        let raw = r#"The result is {"servingsPerContainer": 12, "servingSize": "1 bar"} as requested."#;
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ServingInfo {
            servings_per_container: f64,
            serving_size: String,
        }
        let info: ServingInfo = parse_object(raw).unwrap();
        assert_eq!(info.servings_per_container, 12.0);
        assert_eq!(info.serving_size, "1 bar");
    }

    #[test]
    fn first_array_is_non_greedy() {
        let raw = r#"["Brand A", "Brand B"] and also ["junk"]"#;
        assert_eq!(
            extract_first_json_array(raw),
            Some(r#"["Brand A", "Brand B"]"#)
        );
    }

    #[test]
    fn missing_or_empty_payload_degrades() {
        assert!(matches!(
            parse_array::<i32>("no json here"),
            Err(crate::error::EngineError::DependencyDegraded(_))
        ));
        assert!(matches!(
            parse_array::<i32>("here: []"),
            Err(crate::error::EngineError::DependencyDegraded(_))
        ));
        assert!(matches!(
            parse_array::<i32>("[not, valid, json"),
            Err(crate::error::EngineError::DependencyDegraded(_))
        ));
    }
}
