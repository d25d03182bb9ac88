use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::error::ExtractError;
use crate::models::{ErrorResult, NutritionReport};

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)\s*```").expect("fence pattern is valid")
    })
}

/// Inner content of the first fenced block, or the whole text when there is none.
fn fenced_candidate(text: &str) -> &str {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

/// First `{` through the last `}` after it. Greedy, not balanced.
pub fn brace_span(candidate: &str) -> Option<&str> {
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&candidate[start..=end])
}

/// Locate and parse the JSON object embedded in a model reply
pub fn parse_embedded_json(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let candidate = fenced_candidate(text);
    let span = brace_span(candidate).ok_or(ExtractError::NoJsonFound)?;
    Ok(serde_json::from_str(span)?)
}

/// Turn free model text into a report. Never fails: a missing or malformed
/// object becomes an `ErrorResult` carrying the untouched reply.
pub fn extract_json(text: &str) -> NutritionReport {
    match parse_embedded_json(text) {
        Ok(map) => NutritionReport::Analysis(map),
        Err(e) => {
            match &e {
                ExtractError::NoJsonFound => {
                    log::error!("No JSON object found in model response. Raw text: {}", text)
                }
                ExtractError::JsonParse(err) => {
                    log::error!("Malformed JSON in model response ({}). Raw text: {}", err, text)
                }
            }
            NutritionReport::Error(ErrorResult {
                error: e.to_string(),
                original_response: text.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis(report: NutritionReport) -> Value {
        match report {
            NutritionReport::Analysis(map) => Value::Object(map),
            NutritionReport::Error(e) => panic!("expected analysis, got error: {}", e.error),
        }
    }

    fn error(report: NutritionReport) -> ErrorResult {
        match report {
            NutritionReport::Error(e) => e,
            NutritionReport::Analysis(map) => panic!("expected error, got {:?}", map),
        }
    }

    #[test]
    fn test_fenced_json_block() {
        let text = "Sure! Here's the analysis:\n```json\n{\"total_calories\": 650, \"items\": [{\"name\": \"Pizza\"}]}\n```\nEnjoy your meal.";
        let value = analysis(extract_json(text));
        assert_eq!(value, json!({"total_calories": 650, "items": [{"name": "Pizza"}]}));
    }

    #[test]
    fn test_fence_language_tag_is_case_insensitive() {
        let text = "```JSON\n{\"health_rating\": 7}\n```";
        assert_eq!(analysis(extract_json(text)), json!({"health_rating": 7}));
    }

    #[test]
    fn test_untagged_fence() {
        let text = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(analysis(extract_json(text)), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_prose_wrapped_object() {
        let value = analysis(extract_json("Here is the result: {\"a\": 1} Thanks!"));
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_fenced_content_preferred_over_surrounding_braces() {
        let text = "Note {draft}\n```json\n{\"a\": 2}\n```\n{\"a\": 3}";
        assert_eq!(analysis(extract_json(text)), json!({"a": 2}));
    }

    #[test]
    fn test_nested_objects_use_last_brace() {
        let text = "{\"micronutrients\": {\"vitamins\": [\"C\"], \"minerals\": []}} done";
        assert_eq!(
            analysis(extract_json(text)),
            json!({"micronutrients": {"vitamins": ["C"], "minerals": []}})
        );
    }

    #[test]
    fn test_no_braces_returns_error_with_original_text() {
        let text = "I can't identify any food in this picture.";
        let err = error(extract_json(text));
        assert!(err.error.starts_with("No nutritional data found"));
        assert_eq!(err.original_response, text);
    }

    #[test]
    fn test_closing_brace_before_opening_is_not_a_span() {
        let text = "} nothing here {";
        let err = error(extract_json(text));
        assert!(err.error.starts_with("No nutritional data found"));
        assert_eq!(err.original_response, text);
    }

    #[test]
    fn test_empty_text() {
        let err = error(extract_json(""));
        assert_eq!(err.original_response, "");
    }

    #[test]
    fn test_two_objects_select_malformed_greedy_span() {
        let text = "first {\"a\": 1} then {\"b\": 2}";
        let err = error(extract_json(text));
        assert!(err.error.starts_with("Failed to parse nutritional data"));
        assert_eq!(err.original_response, text);
    }

    #[test]
    fn test_parse_embedded_json_reports_kind() {
        assert!(matches!(
            parse_embedded_json("no json"),
            Err(ExtractError::NoJsonFound)
        ));
        assert!(matches!(
            parse_embedded_json("{not json}"),
            Err(ExtractError::JsonParse(_))
        ));
    }

    #[test]
    fn test_brace_span() {
        assert_eq!(brace_span("x {a} y {b} z"), Some("{a} y {b}"));
        assert_eq!(brace_span("no braces"), None);
        assert_eq!(brace_span("{ open only"), None);
    }
}
