//! Scalar codec
//!
//! Converts between the persisted JSON document and the in-memory
//! [`ProfileMap`](crate::core::ProfileMap).
//!
//! - `converter.rs` - value-level conversion between `serde_json` and [`Value`](crate::core::Value)
//! - `document.rs` - whole-document `decode`/`encode`

mod converter;
mod document;

pub use converter::ValueConverter;
pub use document::{decode, encode};
