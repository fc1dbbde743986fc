//! SQLite-backed cache of the mirrored post list.
//!
//! Persistent storage with async access via tokio-rusqlite:
//!
//! - ordered item list plus freshness metadata
//! - explicit absent/present distinction
//! - change subscriptions for panel surfaces
//! - identity and theme settings

pub mod connection;
pub mod items;
pub mod migrations;
pub mod settings;
pub mod watch;

pub use crate::Error;

pub use connection::CacheStore;
pub use watch::{StoreChange, Subscription};
