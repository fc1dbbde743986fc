//! Client-side surfaces for postmirror.
//!
//! This crate provides the GraphQL remote source, the network tap that
//! classifies the host page's own mutations, and the anchor mount scheduler.

pub mod graphql;
pub mod mount;
pub mod tap;

pub use graphql::{GraphqlClient, GraphqlConfig};
pub use mount::{
    AnchorHost, MountError, MountScheduler, MountSettings, MountTrigger, PassOutcome, ThemeSource, ThemeSync,
    TriggerOutcome,
};
pub use tap::{NetworkTap, PageRequest, Primitives, RequestBody, RequestObserver, TapError, TapMessage};
