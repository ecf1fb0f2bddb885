//! Pulls a JSON document out of free-form model output.

use cafetal_core::AssistantError;
use serde_json::Value;
use tracing::debug;

type Candidate = fn(&str) -> Option<&str>;

/// Tried in order; the first candidate that parses wins.
const ATTEMPTS: [(&str, Candidate); 3] = [
    ("json fence", json_fenced),
    ("plain fence", plain_fenced),
    ("raw text", raw_text),
];

/// Extract a JSON value from `raw`, looking at a ```` ```json ```` block first,
/// then a plain ```` ``` ```` block, then the whole text.
pub fn extract_json(raw: &str) -> Result<Value, AssistantError> {
    let mut last_error = None;

    for (label, candidate) in ATTEMPTS {
        let Some(text) = candidate(raw) else {
            continue;
        };
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => {
                debug!(attempt = label, "Parsed JSON from model output");
                return Ok(value);
            }
            Err(e) => last_error = Some(format!("{label}: {e}")),
        }
    }

    Err(AssistantError::MalformedModelOutput {
        reason: last_error.unwrap_or_else(|| "respuesta vacía".to_string()),
        raw: raw.to_string(),
    })
}

fn fenced<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let (_, rest) = raw.split_once(opener)?;
    let (body, _) = rest.split_once("```")?;
    Some(body)
}

fn json_fenced(raw: &str) -> Option<&str> {
    fenced(raw, "```json")
}

fn plain_fenced(raw: &str) -> Option<&str> {
    fenced(raw, "```")
}

fn raw_text(raw: &str) -> Option<&str> {
    Some(raw)
}
