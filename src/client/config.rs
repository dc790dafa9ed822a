use crate::core::Result;
use crate::profile::USER_PROFILE_DATASTORE_NAME;
use crate::storage::{DataStore, FileDataStore, MemoryDataStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// User profile client configuration
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Directory holding the profile collection; `None` keeps it in memory
    pub data_dir: Option<PathBuf>,

    /// Name of the key-value collection the profile is stored in
    pub collection: String,

    /// How long a get request waits for its response
    pub response_timeout: Duration,

    /// Bound of the dispatcher inbox and of the response broadcast
    pub channel_capacity: usize,
}

impl ProfileConfig {
    pub fn new() -> Self {
        Self {
            data_dir: None,
            collection: USER_PROFILE_DATASTORE_NAME.to_string(),
            response_timeout: Duration::from_secs(5),
            channel_capacity: 64,
        }
    }

    /// Persist under `dir` instead of in memory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn collection(mut self, name: &str) -> Self {
        self.collection = name.to_string();
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Open the configured key-value collection
    pub fn open_data_store(&self) -> Result<Arc<dyn DataStore>> {
        match &self.data_dir {
            Some(dir) => Ok(Arc::new(FileDataStore::open(dir, &self.collection)?)),
            None => Ok(Arc::new(MemoryDataStore::new())),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self::new()
    }
}
