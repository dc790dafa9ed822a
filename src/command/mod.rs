//! Command processing
//!
//! - `parse.rs` - inbound event validation into typed [`Command`]s
//! - `aggregate.rs` - message interaction counters for the reserved keys
//! - `events.rs` - outbound collaborator ([`ProfileEvents`]) and [`Response`]
//! - `processor.rs` - applies commands to the store and publishes results

mod aggregate;
mod parse;
mod events;
mod processor;

pub use aggregate::{AGGREGATE_KEYS, MESSAGE_CLICKED, MESSAGE_TRIGGERED, MESSAGE_VIEWED, is_aggregate_key};
pub use parse::{CONSEQUENCE_TYPE_PROFILE, Command, Consequence, ConsequenceOperation};
pub use events::{ProfileEvents, RESPONSE_EVENT_NAME, Response};
pub use processor::CommandProcessor;
