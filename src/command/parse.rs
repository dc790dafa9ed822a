//! Inbound command validation
//!
//! An [`Event`] is turned into a [`Command`] before anything touches the
//! store, so a malformed payload is rejected whole.

use crate::codec::ValueConverter;
use crate::core::{AttributeUpdates, ProfileError, Result};
use crate::event::{Event, EventData, EventSource, EventType, keys};
use serde_json::Value as JsonValue;

/// Consequence type handled by the profile store
pub const CONSEQUENCE_TYPE_PROFILE: &str = "csp";

const OPERATION_WRITE: &str = "write";
const OPERATION_DELETE: &str = "delete";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert, overwrite or (for `None`) delete attributes
    Update(AttributeUpdates),
    /// Delete attributes by key
    Remove(Vec<String>),
    /// Read attributes by key
    Get(Vec<String>),
    /// Rule-triggered single write or delete
    Consequence(Consequence),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Consequence {
    /// Rule consequence id, only used for diagnostics
    pub id: String,
    pub operation: ConsequenceOperation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsequenceOperation {
    /// `value` is kept as received: for the aggregate keys it names the
    /// message whose counter is bumped, otherwise it is the attribute value
    /// (`null` deletes the key).
    Write { key: String, value: JsonValue },
    Delete { key: String },
}

impl Command {
    /// Extract the command carried by `event`.
    ///
    /// Returns `Ok(None)` for events that are not addressed to the profile
    /// store, and `MalformedCommand` when they are but the payload is invalid.
    pub fn from_event(event: &Event) -> Result<Option<Command>> {
        match (event.event_type, event.source) {
            (EventType::UserProfile, EventSource::RequestProfile) => {
                if let Some(update) = event.get(keys::UPDATE_DATA) {
                    parse_updates(update).map(|updates| Some(Command::Update(updates)))
                } else if let Some(get) = event.get(keys::GET_DATA_ATTRIBUTES) {
                    parse_key_list(get, keys::GET_DATA_ATTRIBUTES).map(|k| Some(Command::Get(k)))
                } else {
                    Err(ProfileError::MalformedCommand(
                        "no update/get request key in event data".to_string(),
                    ))
                }
            }
            (EventType::UserProfile, EventSource::RequestReset) => {
                match event.get(keys::REMOVE_DATA_KEYS) {
                    Some(remove) => parse_key_list(remove, keys::REMOVE_DATA_KEYS)
                        .map(|k| Some(Command::Remove(k))),
                    None => Err(ProfileError::MalformedCommand(
                        "no remove request key in event data".to_string(),
                    )),
                }
            }
            (EventType::RulesEngine, EventSource::ResponseContent) => {
                Ok(Consequence::from_event_data(&event.data)?.map(Command::Consequence))
            }
            _ => Ok(None),
        }
    }
}

impl Consequence {
    /// Parse the triggered consequence of a rules-engine response.
    ///
    /// Consequences of another type are not ours and yield `Ok(None)`.
    pub fn from_event_data(data: &EventData) -> Result<Option<Consequence>> {
        let triggered = match data.get(keys::CONSEQUENCE_TRIGGERED) {
            None | Some(JsonValue::Null) => return Ok(None),
            Some(JsonValue::Object(triggered)) => triggered,
            Some(_) => {
                return Err(ProfileError::MalformedCommand(
                    "triggered consequence is not an object".to_string(),
                ));
            }
        };
        if triggered.is_empty() {
            return Ok(None);
        }

        let consequence_type = triggered.get(keys::CONSEQUENCE_TYPE).and_then(JsonValue::as_str);
        if consequence_type != Some(CONSEQUENCE_TYPE_PROFILE) {
            return Ok(None);
        }

        let id = triggered
            .get(keys::CONSEQUENCE_ID)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();

        let detail = match triggered.get(keys::CONSEQUENCE_DETAIL).and_then(JsonValue::as_object) {
            Some(detail) if !detail.is_empty() => detail,
            _ => {
                return Err(ProfileError::MalformedCommand(format!(
                    "invalid detail provided for consequence id ({})",
                    id
                )));
            }
        };

        let key = detail
            .get(keys::CONSEQUENCE_KEY)
            .and_then(JsonValue::as_str)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        let operation = match detail.get(keys::CONSEQUENCE_OPERATION).and_then(JsonValue::as_str) {
            Some(OPERATION_WRITE) => ConsequenceOperation::Write {
                key: key.ok_or_else(|| invalid_key(OPERATION_WRITE, &id))?,
                value: detail
                    .get(keys::CONSEQUENCE_VALUE)
                    .cloned()
                    .unwrap_or(JsonValue::Null),
            },
            Some(OPERATION_DELETE) => ConsequenceOperation::Delete {
                key: key.ok_or_else(|| invalid_key(OPERATION_DELETE, &id))?,
            },
            other => {
                return Err(ProfileError::MalformedCommand(format!(
                    "invalid consequence operation {:?} for consequence id ({})",
                    other, id
                )));
            }
        };

        Ok(Some(Consequence { id, operation }))
    }
}

fn invalid_key(operation: &str, id: &str) -> ProfileError {
    ProfileError::MalformedCommand(format!(
        "invalid {} key for consequence id ({})",
        operation, id
    ))
}

fn parse_updates(payload: &JsonValue) -> Result<AttributeUpdates> {
    let object = payload.as_object().ok_or_else(|| {
        ProfileError::MalformedCommand(format!("'{}' is not an object", keys::UPDATE_DATA))
    })?;

    let mut updates = AttributeUpdates::new();
    for (key, json_value) in object {
        let value = ValueConverter::from_json(json_value).map_err(|err| {
            ProfileError::MalformedCommand(format!("attribute '{}': {}", key, err))
        })?;
        updates.insert(key.clone(), value);
    }
    Ok(updates)
}

fn parse_key_list(payload: &JsonValue, field: &str) -> Result<Vec<String>> {
    let items = payload
        .as_array()
        .ok_or_else(|| ProfileError::MalformedCommand(format!("'{}' is not a list", field)))?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ProfileError::MalformedCommand(format!("'{}' contains a non-string key", field))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use serde_json::json;

    fn profile_request(key: &str, payload: JsonValue) -> Event {
        Event::new("test", EventType::UserProfile, EventSource::RequestProfile).with_entry(key, payload)
    }

    fn rules_event(consequence: JsonValue) -> Event {
        Event::new("Consequence Rule", EventType::RulesEngine, EventSource::ResponseContent)
            .with_entry(keys::CONSEQUENCE_TRIGGERED, consequence)
    }

    #[test]
    fn test_parse_update() {
        let event = profile_request(keys::UPDATE_DATA, json!({"k1": "v", "k2": null, "k3": {"n": 1}}));
        let Some(Command::Update(updates)) = Command::from_event(&event).unwrap() else {
            panic!("expected update command");
        };
        assert_eq!(updates.get("k1"), Some(&Some(Value::from("v"))));
        assert_eq!(updates.get("k2"), Some(&None));
        assert!(matches!(updates.get("k3"), Some(Some(Value::Map(_)))));
    }

    #[test]
    fn test_update_with_array_is_malformed() {
        let event = profile_request(keys::UPDATE_DATA, json!({"ok": 1, "list": [1, 2]}));
        assert!(matches!(
            Command::from_event(&event),
            Err(ProfileError::MalformedCommand(_))
        ));
    }

    #[test]
    fn test_parse_get_and_remove() {
        let event = profile_request(keys::GET_DATA_ATTRIBUTES, json!(["k1", "k2"]));
        assert_eq!(
            Command::from_event(&event).unwrap(),
            Some(Command::Get(vec!["k1".into(), "k2".into()]))
        );

        let event = Event::new("RemoveUserProfile", EventType::UserProfile, EventSource::RequestReset)
            .with_entry(keys::REMOVE_DATA_KEYS, json!(["k1"]));
        assert_eq!(
            Command::from_event(&event).unwrap(),
            Some(Command::Remove(vec!["k1".into()]))
        );

        let event = profile_request(keys::GET_DATA_ATTRIBUTES, json!(["k1", 2]));
        assert!(Command::from_event(&event).is_err());
    }

    #[test]
    fn test_missing_request_key_is_malformed() {
        let event = profile_request("unrelated", json!(1));
        assert!(Command::from_event(&event).is_err());
    }

    #[test]
    fn test_unrelated_event_is_ignored() {
        let event = Event::new("x", EventType::UserProfile, EventSource::ResponseProfile);
        assert_eq!(Command::from_event(&event).unwrap(), None);
    }

    #[test]
    fn test_parse_write_consequence() {
        let event = rules_event(json!({
            "type": "csp",
            "id": "xxx",
            "detail": {"operation": "write", "key": "a.clicked", "value": "msg123"}
        }));
        assert_eq!(
            Command::from_event(&event).unwrap(),
            Some(Command::Consequence(Consequence {
                id: "xxx".into(),
                operation: ConsequenceOperation::Write {
                    key: "a.clicked".into(),
                    value: json!("msg123"),
                },
            }))
        );
    }

    #[test]
    fn test_write_without_value_is_null() {
        let event = rules_event(json!({
            "type": "csp",
            "id": "xxx",
            "detail": {"operation": "write", "key": "k3"}
        }));
        let Some(Command::Consequence(consequence)) = Command::from_event(&event).unwrap() else {
            panic!("expected consequence");
        };
        assert_eq!(
            consequence.operation,
            ConsequenceOperation::Write { key: "k3".into(), value: JsonValue::Null }
        );
    }

    #[test]
    fn test_other_consequence_type_is_ignored() {
        let event = rules_event(json!({
            "type": "url",
            "id": "xxx",
            "detail": {"url": "https://example.com"}
        }));
        assert_eq!(Command::from_event(&event).unwrap(), None);

        let event = Event::new("Consequence Rule", EventType::RulesEngine, EventSource::ResponseContent);
        assert_eq!(Command::from_event(&event).unwrap(), None);
    }

    #[test]
    fn test_invalid_consequences_are_malformed() {
        for consequence in [
            json!({"type": "csp", "id": "1"}),
            json!({"type": "csp", "id": "2", "detail": {}}),
            json!({"type": "csp", "id": "3", "detail": {"operation": "append", "key": "k"}}),
            json!({"type": "csp", "id": "4", "detail": {"operation": "write", "key": ""}}),
            json!({"type": "csp", "id": "5", "detail": {"operation": "delete"}}),
        ] {
            let event = rules_event(consequence);
            assert!(matches!(
                Command::from_event(&event),
                Err(ProfileError::MalformedCommand(_))
            ));
        }
    }
}
