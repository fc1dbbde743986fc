//! Core types and shared functionality for postmirror.
//!
//! This crate provides:
//! - Post data model and freshness rules
//! - Cache implementation with SQLite backend
//! - The remote source seam and the enrichment pipeline
//! - Event reconciliation and the single-writer sync engine
//! - Unified error types and configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod relay;
pub mod remote;
pub mod sort;
pub mod sync;

pub use cache::{CacheStore, StoreChange, Subscription};
pub use config::{AppConfig, ConfigError, TriggerPolicy};
pub use error::Error;
pub use model::{CacheMeta, CacheRecord, CacheState, EditedFields, Item, MutationEvent, StatSnapshot, Theme, ViewStat};
pub use relay::{RelayRequest, RelayResponse, RelayRouter};
pub use remote::{ItemsPage, RemoteError, RemoteSource};
pub use sort::SortOption;
pub use sync::{SyncEngine, SyncOutcome, SyncSettings};
