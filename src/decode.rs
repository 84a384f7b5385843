// Response decoder: pulls individual fields out of JSON response bodies
// by key. The server's responses are flat JSON objects, so callers only
// ever ask for top-level keys. Kept behind this narrow interface so the
// rest of the crate never touches serde_json values directly.

use thiserror::Error;

/// The response body could not be read as a JSON object at all. This is
/// distinct from a key simply being absent, which is a normal outcome
/// for optional fields and is reported as `Ok(None)`.
#[derive(Error, Debug)]
#[error("response body is not a JSON object: {0}")]
pub struct DecodeError(String);

/// Extract the value for `key` from a JSON object body.
///
/// String values come back verbatim. Numbers and booleans come back as
/// their JSON text (`42` -> `"42"`), since callers only ever display
/// them. An absent key is `Ok(None)`; a body that isn't a JSON object
/// is a `DecodeError`.
pub fn extract(body: &str, key: &str) -> Result<Option<String>, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| DecodeError(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError("top-level value is not an object".into()))?;

    Ok(obj.get(key).and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }))
}
