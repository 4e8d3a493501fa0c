//! Parsing of structured model responses
//!
//! Models occasionally wrap their JSON in prose or code fences. Parsing
//! first tries the raw text, then the outermost bracketed slice; anything
//! else is a malformed response carrying the raw text for diagnosis.

use serde::de::DeserializeOwned;

use crate::pipeline::Stage;
use crate::{Error, Result};

/// Parse a JSON array response
pub fn parse_array<T: DeserializeOwned>(stage: Stage, raw: &str) -> Result<Vec<T>> {
    parse_with_fallback(stage, raw, '[', ']')
}

/// Parse a JSON object response
pub fn parse_object<T: DeserializeOwned>(stage: Stage, raw: &str) -> Result<T> {
    parse_with_fallback(stage, raw, '{', '}')
}

fn parse_with_fallback<T: DeserializeOwned>(
    stage: Stage,
    raw: &str,
    open: char,
    close: char,
) -> Result<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(slice) = outermost_slice(trimmed, open, close) {
        if let Ok(value) = serde_json::from_str(slice) {
            return Ok(value);
        }
    }

    Err(Error::MalformedResponse {
        stage,
        raw: raw.to_string(),
    })
}

/// Slice from the first `open` to the last `close`, inclusive
fn outermost_slice(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_array() {
        let parsed: Vec<u32> = parse_array(Stage::Filter, "[1, 2, 3]").unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_array_wrapped_in_prose() {
        let raw = "Here are the decisions:\n\n[1, 2]\n\nLet me know if you need more.";
        let parsed: Vec<u32> = parse_array(Stage::Filter, raw).unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }

    #[test]
    fn test_parse_object_in_code_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        let parsed: serde_json::Value = parse_object(Stage::Group, raw).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn test_unparsable_response_keeps_raw() {
        let err = parse_array::<u32>(Stage::Group, "I could not categorize these.").unwrap_err();
        match err {
            Error::MalformedResponse { stage, raw } => {
                assert_eq!(stage, Stage::Group);
                assert_eq!(raw, "I could not categorize these.");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_mismatched_brackets_rejected() {
        assert!(parse_array::<u32>(Stage::Filter, "] nope [").is_err());
    }
}
