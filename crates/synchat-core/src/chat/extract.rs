//! Display-content extraction from parsed event payloads
//!
//! The backend relays several response envelope shapes (bare `content`,
//! Spring-AI style `result`/`results` with nested `output`), plus an
//! `error` field on failure frames. Precedence, checked in order:
//!
//! 1. `error` field - wins over any content in the same payload
//! 2. array payload - concatenation of each element's extraction
//! 3. `result.output.{content,text}`
//! 4. `results[].output.{content,text}` concatenated
//! 5. top-level `content`
//! 6. nothing - the frame carries no displayable content

use serde_json::Value;

/// What a payload contributes to the rendered message, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Text(String),
    Error(String),
}

pub fn extract(value: &Value) -> Option<Extracted> {
    if let Some(error) = value.get("error") {
        return Some(Extracted::Error(display_string(error)));
    }

    if let Some(items) = value.as_array() {
        let combined: String = items
            .iter()
            .filter_map(extract)
            .map(|extracted| match extracted {
                Extracted::Text(text) | Extracted::Error(text) => text,
            })
            .collect();
        return if combined.is_empty() {
            None
        } else {
            Some(Extracted::Text(combined))
        };
    }

    if let Some(text) = value.get("result").and_then(output_text) {
        return Some(Extracted::Text(text));
    }

    if let Some(results) = value.get("results").and_then(Value::as_array) {
        let combined: String = results.iter().filter_map(output_text).collect();
        if !combined.is_empty() {
            return Some(Extracted::Text(combined));
        }
    }

    if let Some(content) = value.get("content").and_then(Value::as_str) {
        return Some(Extracted::Text(content.to_string()));
    }

    None
}

/// `output.content` or `output.text` of one result object.
fn output_text(result: &Value) -> Option<String> {
    let output = result.get("output")?;
    output
        .get("content")
        .or_else(|| output.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Error fields arrive as strings or as structured objects; either way the
/// user sees one line.
fn display_string(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
