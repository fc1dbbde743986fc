//! Mutation events classified from observed page traffic.

use std::fmt;

/// A transient signal that the remote collection changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationEvent {
    /// A new post was created; its id is not known yet.
    Written,
    /// An existing post changed.
    Edited(String),
    /// A post was deleted.
    Removed(String),
}

impl MutationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MutationEvent::Written => "written",
            MutationEvent::Edited(_) => "edited",
            MutationEvent::Removed(_) => "removed",
        }
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            MutationEvent::Written => None,
            MutationEvent::Edited(id) | MutationEvent::Removed(id) => Some(id),
        }
    }
}

impl fmt::Display for MutationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target_id() {
            Some(id) => write!(f, "{}({id})", self.kind()),
            None => f.write_str(self.kind()),
        }
    }
}
