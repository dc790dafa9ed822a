use super::{ProfileMap, Value};
use std::collections::BTreeMap;

/// Update batch: `None` deletes the attribute, `Some` inserts or overwrites it.
pub type AttributeUpdates = BTreeMap<String, Option<Value>>;

/// Lifecycle of an attribute store. Only `load` is accepted while uninitialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreState {
    #[default]
    Uninitialized,
    Ready,
}

impl StoreState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Builds an update batch that sets every attribute of `map`.
pub fn updates_from_map(map: ProfileMap) -> AttributeUpdates {
    map.into_iter().map(|(key, value)| (key, Some(value))).collect()
}
