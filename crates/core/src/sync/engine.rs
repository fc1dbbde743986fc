//! Single-writer queue for every cache mutation.
//!
//! Bulk sync, on-demand refresh, logout and tap-driven reconciliation all
//! submit an [`Intent`]. One task drains the queue and runs each intent to
//! completion before starting the next, so read-modify-write sequences never
//! interleave.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::bulk::{SyncOutcome, SyncSettings, bulk_sync, local_today};
use super::reconcile::{Reconciled, reconcile};
use crate::Error;
use crate::cache::CacheStore;
use crate::model::MutationEvent;
use crate::remote::RemoteSource;

/// A requested change to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Sync if stale (page load).
    Sync,
    /// Sync regardless of freshness; fails when nobody is signed in.
    Refresh,
    /// Apply one observed mutation.
    Apply(MutationEvent),
    /// Drop the record and identity.
    Clear,
}

/// What a processed intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Synced(SyncOutcome),
    Reconciled(Reconciled),
    Cleared,
}

struct Envelope {
    intent: Intent,
    reply: Option<oneshot::Sender<Result<IntentOutcome, Error>>>,
}

/// Handle to the cache writer task. Cheap to clone.
///
/// The task stops once every handle is dropped and the queue is drained.
#[derive(Clone, Debug)]
pub struct SyncEngine {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("intent", &self.intent).finish()
    }
}

impl SyncEngine {
    /// Start the writer task on the current runtime.
    pub fn spawn(store: CacheStore, remote: Arc<dyn RemoteSource>, settings: SyncSettings) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker { store, remote, settings };
        let handle = tokio::spawn(worker.run(rx));
        (Self { tx }, handle)
    }

    /// Queue an intent and wait for its outcome.
    pub async fn submit(&self, intent: Intent) -> Result<IntentOutcome, Error> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { intent, reply: Some(reply) })
            .map_err(|_| Error::EngineClosed)?;
        rx.await.map_err(|_| Error::EngineClosed)?
    }

    /// Queue an intent without waiting. Failures are logged by the writer.
    pub fn dispatch(&self, intent: Intent) -> Result<(), Error> {
        self.tx.send(Envelope { intent, reply: None }).map_err(|_| Error::EngineClosed)
    }

    pub async fn sync(&self) -> Result<SyncOutcome, Error> {
        match self.submit(Intent::Sync).await? {
            IntentOutcome::Synced(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn refresh(&self) -> Result<SyncOutcome, Error> {
        match self.submit(Intent::Refresh).await? {
            IntentOutcome::Synced(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn apply(&self, event: MutationEvent) -> Result<Reconciled, Error> {
        match self.submit(Intent::Apply(event)).await? {
            IntentOutcome::Reconciled(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn clear(&self) -> Result<(), Error> {
        self.submit(Intent::Clear).await.map(|_| ())
    }
}

fn unexpected(outcome: IntentOutcome) -> Error {
    Error::InvalidInput(format!("unexpected intent outcome: {outcome:?}"))
}

struct Worker {
    store: CacheStore,
    remote: Arc<dyn RemoteSource>,
    settings: SyncSettings,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Envelope>) {
        tracing::debug!("sync engine started");

        while let Some(envelope) = rx.recv().await {
            let label = intent_label(&envelope.intent);
            let result = self.handle(envelope.intent).await;

            if let Err(err) = &result {
                tracing::warn!(intent = %label, error = %err, "cache intent failed");
            }

            if let Some(reply) = envelope.reply {
                // Receiver may have given up; the write already happened either way.
                let _ = reply.send(result);
            }
        }

        tracing::debug!("sync engine stopped");
    }

    async fn handle(&self, intent: Intent) -> Result<IntentOutcome, Error> {
        let now = Utc::now();
        match intent {
            Intent::Sync => {
                bulk_sync(&self.store, self.remote.as_ref(), &self.settings, now, false)
                    .await
                    .map(IntentOutcome::Synced)
            }
            Intent::Refresh => match bulk_sync(&self.store, self.remote.as_ref(), &self.settings, now, true).await? {
                SyncOutcome::SignedOut => Err(Error::MissingIdentity),
                outcome => Ok(IntentOutcome::Synced(outcome)),
            },
            Intent::Apply(event) => {
                let outcome = reconcile(&self.store, self.remote.as_ref(), &event, local_today(now)).await?;
                if let Reconciled::Skipped(reason) = &outcome {
                    tracing::debug!(event = %event, ?reason, "mutation event skipped");
                }
                Ok(IntentOutcome::Reconciled(outcome))
            }
            Intent::Clear => {
                self.store.remove().await?;
                self.store.clear_identity().await?;
                Ok(IntentOutcome::Cleared)
            }
        }
    }
}

fn intent_label(intent: &Intent) -> String {
    match intent {
        Intent::Sync => "sync".to_string(),
        Intent::Refresh => "refresh".to_string(),
        Intent::Apply(event) => format!("apply:{event}"),
        Intent::Clear => "clear".to_string(),
    }
}
