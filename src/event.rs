//! Event envelope exchanged with the dispatcher
//!
//! Inbound commands and outbound responses travel as [`Event`]s whose data is
//! a JSON object. The key names below are the wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use uuid::Uuid;

pub type EventData = JsonMap<String, JsonValue>;

/// Event data keys
pub mod keys {
    /// Full profile snapshot in update/remove responses and in shared state
    pub const USER_PROFILE_DATA: &str = "userprofiledata";
    /// Attribute map of an update request
    pub const UPDATE_DATA: &str = "userprofileupdatekey";
    /// Key list of a get request, and the attribute subset of its response
    pub const GET_DATA_ATTRIBUTES: &str = "userprofilegetattributes";
    /// Key list of a remove request
    pub const REMOVE_DATA_KEYS: &str = "userprofileremovekeys";

    pub const CONSEQUENCE_TRIGGERED: &str = "triggeredconsequence";
    pub const CONSEQUENCE_ID: &str = "id";
    pub const CONSEQUENCE_TYPE: &str = "type";
    pub const CONSEQUENCE_DETAIL: &str = "detail";
    pub const CONSEQUENCE_OPERATION: &str = "operation";
    pub const CONSEQUENCE_KEY: &str = "key";
    pub const CONSEQUENCE_VALUE: &str = "value";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    UserProfile,
    RulesEngine,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserProfile => "com.adobe.eventType.userProfile",
            Self::RulesEngine => "com.adobe.eventType.rulesEngine",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    RequestProfile,
    RequestReset,
    ResponseProfile,
    ResponseContent,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestProfile => "com.adobe.eventSource.requestProfile",
            Self::RequestReset => "com.adobe.eventSource.requestReset",
            Self::ResponseProfile => "com.adobe.eventSource.responseProfile",
            Self::ResponseContent => "com.adobe.eventSource.responseContent",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub event_type: EventType,
    pub source: EventSource,
    pub data: EventData,
    /// Id of the request this event answers, if any
    pub response_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(name: impl Into<String>, event_type: EventType, source: EventSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            event_type,
            source,
            data: EventData::new(),
            response_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_entry(mut self, key: &str, value: JsonValue) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn in_response_to(mut self, request_id: Uuid) -> Self {
        self.response_id = Some(request_id);
        self
    }

    pub fn is_response_to(&self, request_id: Uuid) -> bool {
        self.response_id == Some(request_id)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }
}
