//! Attaching UI into a page this process does not own.
//!
//! The host page renders asynchronously, so anchors are polled for on a fixed
//! interval under an attempt budget. Each scheduler owns its own pass state:
//! at most one pass is in flight per scheduler, and a trigger that arrives
//! mid-pass is dropped or coalesced according to [`TriggerPolicy`].

mod poll;
mod theme;

pub use poll::{Polled, poll_until};
pub use theme::{ThemeSource, ThemeSync, ThemeSyncOutcome};

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use postmirror_core::config::{AppConfig, TriggerPolicy};

/// Error returned by a host when attaching UI fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("mount failed: {0}")]
pub struct MountError(pub String);

/// The host page as seen by the scheduler.
#[async_trait]
pub trait AnchorHost: Send + Sync + 'static {
    type Anchor: Send + Sync;

    /// Anchors currently in the page, in document order.
    fn query_anchors(&self, selector: &str) -> Vec<Self::Anchor>;

    /// Visible label of an anchor.
    fn anchor_label(&self, anchor: &Self::Anchor) -> String;

    /// Whether UI keyed `key` is already attached.
    fn has_marker(&self, key: &str) -> bool;

    async fn mount(&self, anchor: &Self::Anchor, key: &str) -> Result<(), MountError>;

    fn unmount(&self, key: &str);
}

/// Why a pass was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountTrigger {
    PageReady,
    Navigated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassState {
    Idle,
    Running { rerun: bool },
}

/// How a completed pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Anchors showed up on `tick`; `mounted` of them were newly attached.
    Found { tick: u32, mounted: usize },
    AbsentAfterBudget,
}

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// This trigger ran the pass (and any coalesced re-run); the last pass ended so.
    Ran(PassOutcome),
    /// A pass was in flight and the trigger was ignored.
    Dropped,
    /// A pass was in flight and will run once more when it finishes.
    Queued,
}

#[derive(Debug, Clone)]
pub struct MountSettings {
    pub interval: Duration,
    pub budget: u32,
    pub selector: String,
    pub key_prefix: String,
    pub skip_label: Option<String>,
    pub policy: TriggerPolicy,
}

impl MountSettings {
    fn key(&self, index: usize) -> String {
        format!("{}-{index}", self.key_prefix)
    }
}

impl From<&AppConfig> for MountSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval: config.mount_poll_interval(),
            budget: config.mount_budget,
            selector: config.anchor_selector.clone(),
            key_prefix: config.mount_key_prefix.clone(),
            skip_label: config.skip_anchor_label.clone(),
            policy: config.mount_trigger_policy,
        }
    }
}

/// Ownership of a scheduler's Running state.
///
/// Dropping the guard while it is still held puts the scheduler back to Idle,
/// so a pass whose future is cancelled does not block later triggers.
struct PassGuard<'a> {
    state: &'a Mutex<PassState>,
    held: bool,
}

impl PassGuard<'_> {
    /// Leave Running. Returns true if a coalesced re-run is owed, in which
    /// case the state stays Running with the flag cleared and the guard is
    /// still held.
    fn finish(&mut self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == (PassState::Running { rerun: true }) {
            *state = PassState::Running { rerun: false };
            return true;
        }
        *state = PassState::Idle;
        self.held = false;
        false
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            *self.state.lock().unwrap_or_else(|e| e.into_inner()) = PassState::Idle;
        }
    }
}

pub struct MountScheduler<H: AnchorHost> {
    host: Arc<H>,
    settings: MountSettings,
    state: Mutex<PassState>,
    mounted: Mutex<BTreeSet<String>>,
}

impl<H: AnchorHost> MountScheduler<H> {
    pub fn new(host: Arc<H>, settings: MountSettings) -> Self {
        Self { host, settings, state: Mutex::new(PassState::Idle), mounted: Mutex::new(BTreeSet::new()) }
    }

    /// Request a mount pass.
    ///
    /// Runs the pass on the caller's task unless one is already in flight on
    /// this scheduler, in which case the trigger is dropped or queued.
    pub async fn trigger(&self, reason: MountTrigger) -> TriggerOutcome {
        let Some(mut guard) = self.begin_pass() else {
            return match self.settings.policy {
                TriggerPolicy::Drop => {
                    tracing::debug!(?reason, "mount pass in flight, trigger dropped");
                    TriggerOutcome::Dropped
                }
                TriggerPolicy::Coalesce => {
                    tracing::debug!(?reason, "mount pass in flight, re-run queued");
                    TriggerOutcome::Queued
                }
            };
        };

        loop {
            let outcome = self.pass().await;
            if !guard.finish() {
                return TriggerOutcome::Ran(outcome);
            }
            tracing::debug!("running coalesced mount pass");
        }
    }

    /// Idle -> Running. Returns `None` if a pass was already running, after
    /// recording a re-run request under the coalescing policy.
    fn begin_pass(&self) -> Option<PassGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            PassState::Idle => {
                *state = PassState::Running { rerun: false };
                Some(PassGuard { state: &self.state, held: true })
            }
            PassState::Running { .. } => {
                if self.settings.policy == TriggerPolicy::Coalesce {
                    *state = PassState::Running { rerun: true };
                }
                None
            }
        }
    }

    async fn pass(&self) -> PassOutcome {
        let polled = poll_until(self.settings.interval, self.settings.budget, |_| {
            let anchors = self.host.query_anchors(&self.settings.selector);
            (!anchors.is_empty()).then_some(anchors)
        })
        .await;

        match polled {
            Polled::Found { value: anchors, tick } => {
                let mounted = self.mount_all(&anchors).await;
                tracing::debug!(tick, found = anchors.len(), mounted, "mount pass finished");
                PassOutcome::Found { tick, mounted }
            }
            Polled::AbsentAfterBudget => {
                tracing::debug!(budget = self.settings.budget, "no anchors within budget");
                PassOutcome::AbsentAfterBudget
            }
        }
    }

    async fn mount_all(&self, anchors: &[H::Anchor]) -> usize {
        let mut mounted = 0;

        for (index, anchor) in anchors.iter().enumerate() {
            let key = self.settings.key(index);
            if self.host.has_marker(&key) {
                continue;
            }
            if self.is_skipped(anchor) {
                continue;
            }

            match self.host.mount(anchor, &key).await {
                Ok(()) => {
                    self.mounted.lock().unwrap_or_else(|e| e.into_inner()).insert(key);
                    mounted += 1;
                }
                Err(err) => tracing::warn!(key = %key, error = %err, "mount failed"),
            }
        }

        mounted
    }

    fn is_skipped(&self, anchor: &H::Anchor) -> bool {
        match &self.settings.skip_label {
            Some(skip) => self.host.anchor_label(anchor).trim() == skip,
            None => false,
        }
    }

    /// Keys attached by this scheduler and not yet removed.
    pub fn mounted_keys(&self) -> Vec<String> {
        self.mounted.lock().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }

    /// Detach everything this scheduler attached.
    pub fn unmount_all(&self) {
        let keys = std::mem::take(&mut *self.mounted.lock().unwrap_or_else(|e| e.into_inner()));
        for key in keys {
            self.host.unmount(&key);
        }
    }

    /// Serve triggers until the channel closes, then unmount everything.
    ///
    /// Each trigger gets its own task so that a running pass does not block
    /// the loop from seeing (and dropping or queueing) the next trigger.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::Receiver<MountTrigger>) {
        let mut passes = JoinSet::new();

        while let Some(reason) = triggers.recv().await {
            let scheduler = Arc::clone(&self);
            passes.spawn(async move { scheduler.trigger(reason).await });
            while passes.try_join_next().is_some() {}
        }

        while passes.join_next().await.is_some() {}
        self.unmount_all();
    }
}
