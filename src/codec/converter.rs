//! JSON to profile value conversion

use crate::core::{ProfileError, ProfileMap, Result, Value};
use log::{debug, warn};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

/// Converts JSON values to and from profile [`Value`]s
pub struct ValueConverter;

impl ValueConverter {
    /// Convert a JSON object into a profile map, skipping what cannot be stored.
    ///
    /// Arrays are logged and dropped per key; nulls are dropped because the map
    /// never holds them. Nested objects are converted recursively.
    pub fn object_to_map(object: &JsonMap<String, JsonValue>) -> ProfileMap {
        let mut map = ProfileMap::new();
        for (key, json_value) in object {
            match json_value {
                JsonValue::Array(_) => {
                    warn!("Profile data doesn't support array value, dropping key '{}'", key);
                }
                JsonValue::Null => {
                    debug!("Dropping null value for key '{}'", key);
                }
                JsonValue::Object(nested) => {
                    map.insert(key.clone(), Value::Map(Self::object_to_map(nested)));
                }
                scalar => {
                    if let Some(value) = Self::scalar(scalar) {
                        map.insert(key.clone(), value);
                    }
                }
            }
        }
        map
    }

    /// Convert an inbound attribute value. `null` becomes `None` (delete the key).
    ///
    /// Unlike [`object_to_map`](Self::object_to_map) this is strict: an array
    /// anywhere in the value is an error so that a command carrying one can be
    /// rejected before it touches the store.
    pub fn from_json(json_value: &JsonValue) -> Result<Option<Value>> {
        match json_value {
            JsonValue::Null => Ok(None),
            JsonValue::Array(_) => Err(ProfileError::UnsupportedValueType(
                "array values are not supported".to_string(),
            )),
            JsonValue::Object(object) => {
                let mut map = ProfileMap::new();
                for (key, nested) in object {
                    if let Some(value) = Self::from_json(nested)? {
                        map.insert(key.clone(), value);
                    }
                }
                Ok(Some(Value::Map(map)))
            }
            scalar => Self::scalar(scalar).map(Some).ok_or_else(|| {
                ProfileError::UnsupportedValueType(format!("cannot convert {}", scalar))
            }),
        }
    }

    /// Convert a profile value back to JSON
    pub fn to_json(value: &Value) -> Result<JsonValue> {
        match value {
            Value::Integer(i) => Ok(JsonValue::Number(Number::from(*i))),
            Value::Unsigned(u) => Ok(JsonValue::Number(Number::from(*u))),
            Value::Float(f) => Number::from_f64(*f).map(JsonValue::Number).ok_or_else(|| {
                ProfileError::EncodeError(format!("{} is not representable in JSON", f))
            }),
            Value::Text(s) => Ok(JsonValue::String(s.clone())),
            Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
            Value::Map(m) => Self::map_to_object(m).map(JsonValue::Object),
        }
    }

    /// Convert a profile map back to a JSON object
    pub fn map_to_object(map: &ProfileMap) -> Result<JsonMap<String, JsonValue>> {
        let mut object = JsonMap::with_capacity(map.len());
        for (key, value) in map {
            object.insert(key.clone(), Self::to_json(value)?);
        }
        Ok(object)
    }

    fn scalar(json_value: &JsonValue) -> Option<Value> {
        match json_value {
            JsonValue::Bool(b) => Some(Value::Boolean(*b)),
            JsonValue::String(s) => Some(Value::Text(s.clone())),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_u64().map(Value::Unsigned))
                .or_else(|| n.as_f64().map(Value::Float)),
            _ => None,
        }
    }
}
