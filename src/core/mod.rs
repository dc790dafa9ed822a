pub mod error;
pub mod types;
pub mod value;

pub use error::{ProfileError, Result};
pub use types::{AttributeUpdates, StoreState, updates_from_map};
pub use value::{ProfileMap, Value};
