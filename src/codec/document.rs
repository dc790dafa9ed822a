use super::converter::ValueConverter;
use crate::core::{ProfileError, ProfileMap, Result};
use serde_json::Value as JsonValue;

/// Parse a persisted document into a profile map.
///
/// The document must be a JSON object. Array-typed values are dropped with a
/// warning; anything that is not valid JSON, or not an object, fails.
pub fn decode(document: &str) -> Result<ProfileMap> {
    match serde_json::from_str::<JsonValue>(document)? {
        JsonValue::Object(object) => Ok(ValueConverter::object_to_map(&object)),
        other => Err(ProfileError::DecodeError(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Serialize a profile map to its persisted document form.
pub fn encode(map: &ProfileMap) -> Result<String> {
    let object = ValueConverter::map_to_object(map)?;
    serde_json::to_string(&object).map_err(|e| ProfileError::EncodeError(e.to_string()))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
