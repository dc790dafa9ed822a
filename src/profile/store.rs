//! Attribute store
//!
//! Owns the in-memory [`ProfileMap`] and its durable JSON copy. Mutations only
//! touch memory; [`ProfileStore::persist`] commits the whole map in one write.
//! A failed persist never rolls back memory, which stays authoritative for the
//! rest of the process.

use crate::codec;
use crate::core::{AttributeUpdates, ProfileError, ProfileMap, Result, StoreState, Value};
use crate::storage::DataStore;
use log::{debug, error, trace};
use std::sync::Arc;

/// Collection the profile document is stored in
pub const USER_PROFILE_DATASTORE_NAME: &str = "ADBUserProfile";
/// Record holding the profile document
pub const KEY_USER_PROFILE: &str = "user_profile";
/// Document assumed when nothing has been persisted yet
pub const EMPTY_DOCUMENT: &str = "{}";

pub struct ProfileStore {
    data_store: Arc<dyn DataStore>,
    data: Arc<ProfileMap>,
    state: StoreState,
}

impl ProfileStore {
    pub fn new(data_store: Arc<dyn DataStore>) -> Self {
        Self {
            data_store,
            data: Arc::new(ProfileMap::new()),
            state: StoreState::Uninitialized,
        }
    }

    /// Replace the in-memory map with the persisted document.
    ///
    /// A missing document loads as an empty map and succeeds. A malformed
    /// document, or a collection that cannot be read, leaves the map empty,
    /// keeps the store uninitialized and returns `false`.
    pub fn load(&mut self) -> bool {
        let document = match self.data_store.get(KEY_USER_PROFILE) {
            Ok(document) => document.unwrap_or_else(|| EMPTY_DOCUMENT.to_string()),
            Err(err) => {
                error!("Could not read persistent profile data: {}", err);
                self.data = Arc::new(ProfileMap::new());
                return false;
            }
        };

        match codec::decode(&document) {
            Ok(map) => {
                debug!("Loaded {} persisted profile attributes", map.len());
                self.data = Arc::new(map);
                self.state = StoreState::Ready;
                true
            }
            Err(err) => {
                error!("Could not load persistent profile data: {}", err);
                self.data = Arc::new(ProfileMap::new());
                false
            }
        }
    }

    /// Apply an update batch: `None` removes the key, `Some` inserts or overwrites it.
    pub fn update_or_delete(&mut self, attributes: AttributeUpdates) -> Result<()> {
        self.ensure_ready()?;
        let data = Arc::make_mut(&mut self.data);
        for (key, value) in attributes {
            match value {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Remove every listed key. Absent keys are ignored.
    pub fn delete<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<()> {
        self.ensure_ready()?;
        let data = Arc::make_mut(&mut self.data);
        for key in keys {
            data.remove(key.as_ref());
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Value under `key` if it is itself a map
    pub fn get_nested_map(&self, key: &str) -> Option<&ProfileMap> {
        self.data.get(key).and_then(Value::as_map)
    }

    /// Read-only view of the current attributes.
    ///
    /// The returned map is shared until the next mutation, which copies it, so
    /// holders never observe later changes.
    pub fn snapshot(&self) -> Arc<ProfileMap> {
        Arc::clone(&self.data)
    }

    /// Write the whole map to the data store. Returns `false` on any failure.
    pub fn persist(&self) -> bool {
        if !self.state.is_ready() {
            debug!("Profile data is not loaded, skipping persist");
            return false;
        }

        let document = match codec::encode(&self.data) {
            Ok(document) => document,
            Err(err) => {
                error!("Profile data is not persisted: {}", err);
                return false;
            }
        };

        match self.data_store.set(KEY_USER_PROFILE, &document) {
            Ok(()) => {
                trace!("Profile data is persisted: {}", document);
                true
            }
            Err(err) => {
                error!("Profile data is not persisted: {}", err);
                false
            }
        }
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(ProfileError::NotReady)
        }
    }
}
