use crate::core::Result;

/// Named key-value collection the attribute store persists into.
///
/// Implementations use interior mutability so a single collection can be
/// shared behind an `Arc<dyn DataStore>`.
pub trait DataStore: Send + Sync {
    /// Read the string stored under `key`. `Ok(None)` means the key is absent;
    /// an error means the collection could not be read at all.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` from the collection
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys
    fn keys(&self) -> Vec<String>;
}
