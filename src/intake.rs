//! Loading chunk results produced by the model runner.
//!
//! Accepts either a JSON array or JSON Lines. Each element is a parsed
//! result object or a raw model response string.

use crate::models::ChunkResult;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that stop intake entirely.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("malformed JSON array: {0}")]
    MalformedArray(#[from] serde_json::Error),
}

/// Outcome of loading a results file.
#[derive(Debug, Clone, Default)]
pub struct Intake {
    /// Number of entries found in the input.
    pub entries: usize,
    /// Entries accepted as chunk results, tagged with their index.
    pub results: Vec<ChunkResult>,
}

/// Parse one raw model response.
///
/// Tolerates surrounding whitespace and a Markdown code fence. Only JSON
/// objects carrying a `scores` key are accepted.
pub fn parse_chunk_response(raw: &str) -> Option<ChunkResult> {
    let body = strip_code_fence(raw.trim());

    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => accept(value),
        Ok(_) => {
            debug!("Model response is not a JSON object");
            None
        }
        Err(e) => {
            debug!("Model response is not valid JSON: {}", e);
            None
        }
    }
}

/// Load chunk results from a JSON array or JSON Lines document.
pub fn load_chunk_results(content: &str) -> Result<Intake, IntakeError> {
    let trimmed = content.trim();

    let entries: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<Value>(line.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping line {}: {}", n + 1, e);
                    None
                }
            })
            .collect()
    };

    let mut intake = Intake {
        entries: entries.len(),
        results: Vec::new(),
    };

    for (i, entry) in entries.into_iter().enumerate() {
        let parsed = match entry {
            Value::String(raw) => parse_chunk_response(&raw),
            Value::Object(_) => accept(entry),
            other => {
                debug!("Entry {} is neither an object nor a string: {}", i + 1, other);
                None
            }
        };

        match parsed {
            Some(mut result) => {
                result.set_index(i + 1);
                intake.results.push(result);
            }
            None => warn!("Skipping entry {}: no scores", i + 1),
        }
    }

    debug!(
        "Accepted {}/{} chunk results",
        intake.results.len(),
        intake.entries
    );

    Ok(intake)
}

fn accept(value: Value) -> Option<ChunkResult> {
    let result = ChunkResult::new(value);
    result.has_scores().then_some(result)
}

/// Strip a ```json ... ``` fence if the whole body is wrapped in one.
fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return body;
    };
    // Drop the info string (e.g. "json") on the opening line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use serde_json::json;

    #[test]
    fn test_parse_plain_response() {
        let result = parse_chunk_response(r#" {"scores": {"security_and_breach": 8}} "#).unwrap();
        assert_eq!(result.score(Category::SecurityAndBreach), Some(8));
    }

    #[test]
    fn test_parse_fenced_response() {
        let raw = "```json\n{\"scores\": {\"transparency_and_notice\": 6}}\n```";
        let result = parse_chunk_response(raw).unwrap();
        assert_eq!(result.score(Category::TransparencyAndNotice), Some(6));
    }

    #[test]
    fn test_parse_rejects_non_results() {
        assert!(parse_chunk_response("not json").is_none());
        assert!(parse_chunk_response("[1, 2]").is_none());
        assert!(parse_chunk_response(r#"{"rationales": {}}"#).is_none());
        assert!(parse_chunk_response("").is_none());
    }

    #[test]
    fn test_load_json_array() {
        let content = json!([
            {"scores": {"security_and_breach": 5}},
            {"notes": ["no scores here"]},
            "{\"scores\": {\"security_and_breach\": 7}}",
            42
        ])
        .to_string();

        let intake = load_chunk_results(&content).unwrap();
        assert_eq!(intake.entries, 4);
        assert_eq!(intake.results.len(), 2);
        assert_eq!(intake.results[0].as_value()["index"], json!(1));
        assert_eq!(intake.results[1].as_value()["index"], json!(3));
        assert_eq!(intake.results[1].score(Category::SecurityAndBreach), Some(7));
    }

    #[test]
    fn test_load_json_lines_skips_bad_lines() {
        let content = "\
{\"scores\": {\"security_and_breach\": 3}}

this is not json
{\"scores\": {\"security_and_breach\": 9}, \"red_flags\": [\"x\"]}
";
        let intake = load_chunk_results(content).unwrap();
        assert_eq!(intake.entries, 2);
        assert_eq!(intake.results.len(), 2);
        assert_eq!(intake.results[1].red_flags().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_load_malformed_array_fails() {
        assert!(matches!(
            load_chunk_results("[{\"scores\": {}"),
            Err(IntakeError::MalformedArray(_))
        ));
    }

    #[test]
    fn test_load_empty_input() {
        let intake = load_chunk_results("  \n ").unwrap();
        assert_eq!(intake.entries, 0);
        assert!(intake.results.is_empty());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("{}"), "{}");
        assert_eq!(strip_code_fence("```{}"), "```{}");
    }
}
