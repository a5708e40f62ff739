//! Session persistence adapters
//!
//! [`JsonFileSessionStore`] implements the
//! [`SessionStore`](agora_application::SessionStore) port on a directory tree.
//! The same adapter serves as local cache and, pointed at a shared or synced
//! directory, as the durable remote mirror.

mod json_file_store;

pub use json_file_store::JsonFileSessionStore;
