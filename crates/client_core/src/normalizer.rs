//! Turns whatever the compiler service sent back into a [`CompileResult`].
//!
//! Replies come in three flavours: a JSON envelope with `success`,
//! `assemblyOutput`/`output` and `error` fields, plain compiler text, or a JSON
//! string that wraps one of the former a second time. Any other JSON value
//! carries no output fields and reads as an empty envelope. None of them is an
//! error at this layer.

use serde_json::{Map, Value};
use shared::protocol::{CompileResult, NO_OUTPUT_PLACEHOLDER};
use tracing::debug;

/// Error text used when a reply reports failure without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

pub fn normalize(raw_body: &str) -> CompileResult {
    match serde_json::from_str::<Value>(raw_body) {
        Ok(Value::Object(envelope)) => normalize_envelope(&envelope),
        Ok(Value::String(inner)) => {
            debug!("reply is a JSON-encoded string; normalizing its contents");
            normalize(&inner)
        }
        Ok(_) => {
            debug!("reply is JSON without output fields");
            CompileResult::success(NO_OUTPUT_PLACEHOLDER)
        }
        Err(_) => {
            debug!(bytes = raw_body.len(), "reply is not JSON; treating as plain text");
            CompileResult::success(unescape_sequences(raw_body))
        }
    }
}

fn normalize_envelope(envelope: &Map<String, Value>) -> CompileResult {
    if let Some(error) = present(envelope, "error") {
        return CompileResult::failure(unescape_embedded(error));
    }

    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let output = present(envelope, "assemblyOutput").or_else(|| present(envelope, "output"));

    if success {
        return CompileResult::success(output.unwrap_or(NO_OUTPUT_PLACEHOLDER));
    }

    CompileResult {
        success: false,
        output: output.map(str::to_string),
        error: Some(output.unwrap_or(UNKNOWN_ERROR).to_string()),
    }
}

/// A field counts only when it holds a non-empty string.
fn present<'a>(envelope: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    envelope
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Error fields are sometimes a serialized reply of their own.
fn unescape_embedded(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(inner)) => unescape_embedded(&inner),
        Ok(Value::Object(nested)) => present(&nested, "assemblyOutput")
            .or_else(|| present(&nested, "output"))
            .or_else(|| present(&nested, "error"))
            .map(unescape_embedded)
            .unwrap_or_else(|| text.to_string()),
        Ok(_) => text.to_string(),
        Err(_) => unescape_sequences(text),
    }
}

fn unescape_sequences(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\r", "\r")
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
