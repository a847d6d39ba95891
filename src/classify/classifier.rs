//! Status and body classification rules

use super::types::Outcome;
use serde_json::Value;

const HTTP_OK: u16 = 200;
const HTTP_NOT_FOUND: u16 = 404;

/// Classify a raw response
///
/// Rules apply in order: 404, any other non-200 status, undecodable body,
/// missing `status: "ok"` marker (only when `expect_status_ok`), success.
pub fn classify(status: u16, body: &str, expect_status_ok: bool) -> Outcome {
    if status == HTTP_NOT_FOUND {
        return Outcome::NotFound;
    }
    if status != HTTP_OK {
        return Outcome::ServerError {
            status,
            body: error_body(body),
        };
    }

    let payload: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return Outcome::Invalid(format!("response is not JSON ({e})")),
    };

    if expect_status_ok && payload.get("status").and_then(Value::as_str) != Some("ok") {
        return Outcome::Invalid("response is missing status \"ok\"".to_string());
    }

    Outcome::Success(payload)
}

/// Best-effort string form of an error body
///
/// Objects become ` key => value;` pairs, strings and non-JSON text pass
/// through, anything else is reported as an unknown format.
pub fn error_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!(" {key} => {s};"),
                other => format!(" {key} => {other};"),
            })
            .collect(),
        Ok(Value::String(s)) => s,
        Ok(_) => "Unknown body format".to_string(),
        Err(_) => body.to_string(),
    }
}
