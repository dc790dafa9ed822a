use crate::codec::ValueConverter;
use crate::core::{ProfileMap, Result};
use crate::event::{Event, EventSource, EventType, keys};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

pub const RESPONSE_EVENT_NAME: &str = "UserProfile Response Event";

/// Outbound side of the command processor, implemented by the host dispatcher.
pub trait ProfileEvents {
    /// Publish the full profile as observable shared state
    fn advertise(&mut self, snapshot: Arc<ProfileMap>);

    /// Emit a response, correlated to the request that caused it when there is one
    fn respond(&mut self, correlation_id: Option<Uuid>, response: Response);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Attributes found for a get request; absent keys are omitted
    Attributes(ProfileMap),
    /// Full profile after a committed update or remove
    Profile(Arc<ProfileMap>),
}

impl Response {
    pub fn attributes(&self) -> &ProfileMap {
        match self {
            Self::Attributes(map) => map,
            Self::Profile(map) => map,
        }
    }

    /// Event data key the payload is published under
    pub fn data_key(&self) -> &'static str {
        match self {
            Self::Attributes(_) => keys::GET_DATA_ATTRIBUTES,
            Self::Profile(_) => keys::USER_PROFILE_DATA,
        }
    }

    /// Build the response event for the dispatcher
    pub fn into_event(self, correlation_id: Option<Uuid>) -> Result<Event> {
        let payload = ValueConverter::map_to_object(self.attributes())?;
        let event = Event::new(RESPONSE_EVENT_NAME, EventType::UserProfile, EventSource::ResponseProfile)
            .with_entry(self.data_key(), JsonValue::Object(payload));
        Ok(match correlation_id {
            Some(id) => event.in_response_to(id),
            None => event,
        })
    }
}
