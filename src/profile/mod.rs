pub mod store;

pub use store::{EMPTY_DOCUMENT, KEY_USER_PROFILE, ProfileStore, USER_PROFILE_DATASTORE_NAME};
