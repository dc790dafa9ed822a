//! Public user profile API
//!
//! [`UserProfile`] turns method calls into request events and hands them to a
//! dispatcher task that owns the store, so every command is applied in order.
//! Updates and removals are fire-and-forget; reads wait for the correlated
//! response for at most [`ProfileConfig::response_timeout`].

pub mod config;
mod dispatcher;

pub use config::ProfileConfig;

use crate::codec::ValueConverter;
use crate::command::CommandProcessor;
use crate::core::{AttributeUpdates, ProfileError, ProfileMap, Result, Value};
use crate::event::{Event, EventSource, EventType, keys};
use crate::profile::ProfileStore;
use crate::storage::DataStore;
use dispatcher::{DispatchEvents, Envelope, SharedState};
use log::debug;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{Instrument, info_span};

pub const EXTENSION_VERSION: &str = "2.0.0";

/// Handle to a running user profile dispatcher
///
/// # Examples
///
/// ```
/// use profilestore::{ProfileConfig, UserProfile, Value};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let profile = UserProfile::start(ProfileConfig::new())?;
///
/// profile.update_user_attribute("tier", Some(Value::from("gold"))).await?;
/// let attributes = profile.get_user_attributes(["tier"]).await?;
/// assert_eq!(attributes.get("tier"), Some(&Value::from("gold")));
///
/// profile.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct UserProfile {
    config: ProfileConfig,
    sender: mpsc::Sender<Envelope>,
    shared_state: watch::Receiver<SharedState>,
    responses: broadcast::Sender<Event>,
    task: JoinHandle<()>,
}

impl UserProfile {
    /// Open the configured collection and spawn the dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: ProfileConfig) -> Result<Self> {
        let data_store = config.open_data_store()?;
        Ok(Self::start_with_store(config, data_store))
    }

    /// Spawn the dispatcher over an existing collection
    pub fn start_with_store(config: ProfileConfig, data_store: Arc<dyn DataStore>) -> Self {
        let capacity = config.channel_capacity.max(1);
        let (sender, inbox) = mpsc::channel(capacity);
        let (state_tx, shared_state) = watch::channel(None);
        let (responses, _) = broadcast::channel(capacity);

        let processor =
            CommandProcessor::new(ProfileStore::new(data_store), DispatchEvents::new(state_tx));
        let task = tokio::spawn(
            dispatcher::run(processor, inbox, responses.clone()).instrument(info_span!("user_profile")),
        );

        Self {
            config,
            sender,
            shared_state,
            responses,
            task,
        }
    }

    pub fn extension_version() -> &'static str {
        EXTENSION_VERSION
    }

    /// Set attributes; a `None` value removes the attribute
    pub async fn update_user_attributes(&self, attributes: AttributeUpdates) -> Result<()> {
        if attributes.is_empty() {
            debug!("updateUserAttributes - the given attribute map is empty, no event was dispatched");
            return Ok(());
        }

        let mut payload = JsonMap::new();
        for (key, value) in &attributes {
            let json = match value {
                Some(value) => ValueConverter::to_json(value)?,
                None => JsonValue::Null,
            };
            payload.insert(key.clone(), json);
        }

        let event = Event::new("UserProfileUpdate", EventType::UserProfile, EventSource::RequestProfile)
            .with_entry(keys::UPDATE_DATA, JsonValue::Object(payload));
        self.dispatch(event).await
    }

    pub async fn update_user_attribute(&self, name: &str, value: Option<Value>) -> Result<()> {
        if name.is_empty() {
            debug!("updateUserAttribute - attribute name is empty, no event was dispatched");
            return Ok(());
        }
        let mut attributes = AttributeUpdates::new();
        attributes.insert(name.to_string(), value);
        self.update_user_attributes(attributes).await
    }

    pub async fn remove_user_attribute(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            debug!("removeUserAttribute - attribute name is empty, no event was dispatched");
            return Ok(());
        }
        self.remove_user_attributes([name]).await
    }

    pub async fn remove_user_attributes<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            debug!("removeUserAttributes - the given key list is empty, no event was dispatched");
            return Ok(());
        }

        let event = Event::new("RemoveUserProfile", EventType::UserProfile, EventSource::RequestReset)
            .with_entry(keys::REMOVE_DATA_KEYS, JsonValue::from(names));
        self.dispatch(event).await
    }

    /// Read the listed attributes. Keys without a value are left out.
    ///
    /// Fails with [`ProfileError::Timeout`] if no response arrives in time,
    /// for example because the store could not be loaded.
    pub async fn get_user_attributes<I, S>(&self, names: I) -> Result<ProfileMap>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Ok(ProfileMap::new());
        }

        let event = Event::new("getUserAttributes", EventType::UserProfile, EventSource::RequestProfile)
            .with_entry(keys::GET_DATA_ATTRIBUTES, JsonValue::from(names));
        let response = self.request(event).await?;

        match response.get(keys::GET_DATA_ATTRIBUTES) {
            Some(JsonValue::Object(attributes)) => Ok(ValueConverter::object_to_map(attributes)),
            _ => Err(ProfileError::DecodeError(
                "response does not carry user attributes".to_string(),
            )),
        }
    }

    /// Hand an event to the dispatcher without waiting for a response.
    ///
    /// This is also how rules-engine consequences reach the store.
    pub async fn dispatch(&self, event: Event) -> Result<()> {
        self.sender
            .send(Envelope { event, reply: None })
            .await
            .map_err(|_| ProfileError::Disconnected)
    }

    /// Hand an event to the dispatcher and wait for the response correlated to it
    pub async fn request(&self, event: Event) -> Result<Event> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope {
                event,
                reply: Some(reply),
            })
            .await
            .map_err(|_| ProfileError::Disconnected)?;

        match timeout(self.config.response_timeout, response).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ProfileError::Disconnected),
            Err(_) => Err(ProfileError::Timeout(self.config.response_timeout)),
        }
    }

    /// Last advertised profile snapshot
    pub fn shared_state(&self) -> Option<Arc<ProfileMap>> {
        self.shared_state.borrow().clone()
    }

    /// Wait until a snapshot is advertised after this call
    pub async fn shared_state_changed(&mut self) -> Result<Option<Arc<ProfileMap>>> {
        self.shared_state
            .changed()
            .await
            .map_err(|_| ProfileError::Disconnected)?;
        Ok(self.shared_state.borrow_and_update().clone())
    }

    /// Receive every response event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.responses.subscribe()
    }

    /// Stop accepting events and wait for the queued ones to be applied
    pub async fn shutdown(self) -> Result<()> {
        let Self { sender, task, .. } = self;
        drop(sender);
        task.await
            .map_err(|e| ProfileError::Io(format!("profile dispatcher failed: {}", e)))
    }
}
