//! Structured JSON output: instruction template, code-fence stripping
//! and parsing that preserves the raw model output on failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The answer shape requested by [`json_instruction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

/// Build the instruction prompt asking the model to answer as JSON.
pub fn json_instruction(query: &str) -> String {
    format!(
        "Answer the following question in JSON format \
         '{{\"answer\": \"Your answer here\"}}'. Question: {query}"
    )
}

/// Strip a surrounding markdown code fence from model output.
/// Handles ``` and ```json openers; text without fences passes through unchanged.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// Parse model output as a JSON value, stripping any code fences first.
/// On failure the raw output is preserved in the error.
pub fn parse_value(raw: &str) -> Result<serde_json::Value, Error> {
    let clean = strip_code_fences(raw);
    serde_json::from_str(clean).map_err(|e| {
        tracing::error!("JSON parse error: {e}, output: {raw:?}");
        Error::json_output(raw)
    })
}

/// Parse model output into a caller-provided type, stripping any code fences first.
pub fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    let clean = strip_code_fences(raw);
    serde_json::from_str(clean).map_err(|e| {
        tracing::error!("JSON parse error: {e}, output: {raw:?}");
        Error::json_output(raw)
    })
}
