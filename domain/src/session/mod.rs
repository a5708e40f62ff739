//! Session domain.
//!
//! - [`entities::Session`]: one bounded conversation and its metadata
//! - [`entities::SessionMode`]: council or one-on-one direct mode

pub mod entities;
