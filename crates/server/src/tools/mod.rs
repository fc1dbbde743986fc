//! MCP tool implementations.
//!
//! This module contains all tools exposed by the postmirror server.

pub mod observe;
pub mod posts;
pub mod relay;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use observe::{ObserveRequestParams, observe_impl};
pub use posts::{PostsListParams, posts_impl};
pub use relay::{RelayRequestParams, relay_impl};
pub use status::status_impl;
