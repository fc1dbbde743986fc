//! Domain types shared by the store, the sync engine and the client.

pub mod event;
pub mod item;
pub mod record;
pub mod stat;

pub use event::MutationEvent;
pub use item::{EditedFields, Item, SeriesRef};
pub use record::{CacheMeta, CacheRecord, CacheState, Theme};
pub use stat::{StatSnapshot, ViewStat, parse_day};

#[cfg(test)]
pub(crate) use item::fixtures;
