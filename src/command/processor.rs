use super::aggregate::{self, is_aggregate_key};
use super::events::{ProfileEvents, Response};
use super::parse::{Command, Consequence, ConsequenceOperation};
use crate::codec::ValueConverter;
use crate::core::{AttributeUpdates, ProfileMap, Result, Value};
use crate::event::Event;
use crate::profile::ProfileStore;
use log::debug;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

/// Applies inbound commands to a [`ProfileStore`].
///
/// Mutations are persisted right away; the new snapshot is advertised and
/// answered only when the persist succeeded, so nothing is published that did
/// not reach storage. Callers serialize access, one command at a time.
pub struct CommandProcessor<E: ProfileEvents> {
    store: ProfileStore,
    events: E,
}

impl<E: ProfileEvents> CommandProcessor<E> {
    pub fn new(store: ProfileStore, events: E) -> Self {
        Self { store, events }
    }

    /// Load the store and publish whatever was persisted.
    ///
    /// Returns `false` if the persisted document could not be loaded; every
    /// later command is then dropped.
    pub fn on_registered(&mut self) -> bool {
        if !self.store.is_ready() && !self.store.load() {
            return false;
        }
        if !self.store.is_empty() {
            self.publish(None);
        }
        true
    }

    /// Validate and execute the command carried by `event`.
    ///
    /// Events for other components are ignored; malformed ones are logged and
    /// dropped without touching the store.
    pub fn handle_event(&mut self, event: &Event) {
        if !self.store.is_ready() {
            debug!("Unable to work with persisted profile data, dropping event {}", event.id);
            return;
        }

        match Command::from_event(event) {
            Ok(Some(command)) => self.execute(command, event.id),
            Ok(None) => {}
            Err(err) => debug!("Ignoring event '{}' ({}): {}", event.name, event.id, err),
        }
    }

    pub fn execute(&mut self, command: Command, correlation_id: Uuid) {
        match command {
            Command::Update(updates) => self.apply_updates(updates, correlation_id),
            Command::Remove(keys) => self.apply_removal(&keys, correlation_id),
            Command::Get(keys) => self.answer_get(&keys, correlation_id),
            Command::Consequence(consequence) => self.apply_consequence(consequence, correlation_id),
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    fn apply_updates(&mut self, updates: AttributeUpdates, correlation_id: Uuid) {
        if updates.is_empty() {
            return;
        }
        if let Err(err) = self.store.update_or_delete(updates) {
            debug!("Profile update dropped: {}", err);
            return;
        }
        if self.store.persist() {
            self.publish(Some(correlation_id));
        }
    }

    fn apply_removal(&mut self, keys: &[String], correlation_id: Uuid) {
        if keys.is_empty() {
            return;
        }
        if let Err(err) = self.store.delete(keys) {
            debug!("Profile removal dropped: {}", err);
            return;
        }
        if self.store.persist() {
            self.publish(Some(correlation_id));
        }
    }

    fn answer_get(&mut self, keys: &[String], correlation_id: Uuid) {
        let found: ProfileMap = keys
            .iter()
            .filter_map(|key| self.store.get(key).map(|value| (key.clone(), value.clone())))
            .collect();
        self.events.respond(Some(correlation_id), Response::Attributes(found));
    }

    fn apply_consequence(&mut self, consequence: Consequence, correlation_id: Uuid) {
        debug!("Processing user profile consequence with id ({})", consequence.id);
        match consequence.operation {
            ConsequenceOperation::Delete { key } => self.apply_removal(&[key], correlation_id),
            ConsequenceOperation::Write { key, value } => {
                let effective = match self.resolve_write_value(&key, &value) {
                    Ok(effective) => effective,
                    Err(err) => {
                        debug!(
                            "Invalid value for consequence id ({}), key '{}': {}",
                            consequence.id, key, err
                        );
                        return;
                    }
                };
                let mut updates = AttributeUpdates::new();
                updates.insert(key, effective);
                self.apply_updates(updates, correlation_id);
            }
        }
    }

    /// Value actually written for a write consequence. For the aggregate keys
    /// the supplied value is a message id and the result is the bumped counter map.
    fn resolve_write_value(&self, key: &str, value: &JsonValue) -> Result<Option<Value>> {
        if value.is_null() {
            return Ok(None);
        }
        if is_aggregate_key(key) {
            let message_id = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            let counts = aggregate::increment(self.store.get_nested_map(key), &message_id);
            return Ok(Some(Value::Map(counts)));
        }
        ValueConverter::from_json(value)
    }

    fn publish(&mut self, correlation_id: Option<Uuid>) {
        let snapshot = self.store.snapshot();
        self.events.advertise(Arc::clone(&snapshot));
        self.events.respond(correlation_id, Response::Profile(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventSource, EventType, keys};
    use crate::profile::KEY_USER_PROFILE;
    use crate::storage::MemoryDataStore;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        advertised: Vec<Arc<ProfileMap>>,
        responses: Vec<(Option<Uuid>, Response)>,
    }

    impl ProfileEvents for Recorder {
        fn advertise(&mut self, snapshot: Arc<ProfileMap>) {
            self.advertised.push(snapshot);
        }

        fn respond(&mut self, correlation_id: Option<Uuid>, response: Response) {
            self.responses.push((correlation_id, response));
        }
    }

    fn processor(document: &str) -> CommandProcessor<Recorder> {
        let backend = Arc::new(MemoryDataStore::with_entry(KEY_USER_PROFILE, document));
        let mut processor = CommandProcessor::new(ProfileStore::new(backend), Recorder::default());
        assert!(processor.on_registered());
        processor
    }

    #[test]
    fn test_registration_publishes_loaded_profile() {
        let processor = processor(r#"{"key":"value"}"#);
        assert_eq!(processor.events().advertised.len(), 1);
        assert_eq!(processor.events().responses.len(), 1);
        assert_eq!(processor.events().responses[0].0, None);
    }

    #[test]
    fn test_registration_with_empty_profile_is_silent() {
        let processor = processor("{}");
        assert!(processor.events().advertised.is_empty());
        assert!(processor.events().responses.is_empty());
    }

    #[test]
    fn test_write_consequence_bumps_counter() {
        let mut processor = processor(r#"{"a.clicked":{"msg123":2}}"#);
        let event = Event::new("Consequence Rule", EventType::RulesEngine, EventSource::ResponseContent)
            .with_entry(
                keys::CONSEQUENCE_TRIGGERED,
                json!({"type": "csp", "id": "c1", "detail": {"operation": "write", "key": "a.clicked", "value": "msg123"}}),
            );
        processor.handle_event(&event);

        let counts = processor.store().get_nested_map("a.clicked").unwrap();
        assert_eq!(counts.get("msg123"), Some(&Value::Integer(3)));
        let (correlation, _) = processor.events().responses.last().unwrap();
        assert_eq!(*correlation, Some(event.id));
    }

    #[test]
    fn test_numeric_message_id_is_stringified() {
        let mut processor = processor("{}");
        processor.execute(
            Command::Consequence(Consequence {
                id: "c".into(),
                operation: ConsequenceOperation::Write { key: "a.viewed".into(), value: json!(42) },
            }),
            Uuid::new_v4(),
        );
        let counts = processor.store().get_nested_map("a.viewed").unwrap();
        assert_eq!(counts.get("42"), Some(&Value::Integer(1)));
    }
}
