// ============================================================================
// ProfileStore Library
// ============================================================================

pub mod core;
pub mod codec;
pub mod storage;
pub mod profile;
pub mod event;
pub mod command;
pub mod client;

// Re-export main types for convenience
pub use core::{AttributeUpdates, ProfileError, ProfileMap, Result, StoreState, Value};
pub use profile::ProfileStore;
pub use storage::{DataStore, FileDataStore, MemoryDataStore};
pub use event::{Event, EventSource, EventType};
pub use command::{Command, CommandProcessor, ProfileEvents, Response};
pub use client::{ProfileConfig, UserProfile};
