//! Keeping the cached record in step with the remote listing.
//!
//! Full syncs live in [`bulk`], single-event updates in [`reconcile`], and
//! [`SyncEngine`] serializes both behind one writer.

mod bulk;
mod engine;
mod reconcile;

pub use bulk::{SyncOutcome, SyncSettings, bulk_sync, local_today};
pub use engine::{Intent, IntentOutcome, SyncEngine};
pub use reconcile::{Reconciled, SkipReason, reconcile};
