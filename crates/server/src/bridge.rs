//! Forwarding of tap mutation messages into the sync engine.

use postmirror_client::TapMessage;
use postmirror_core::SyncEngine;
use postmirror_core::sync::Intent;
use tokio::sync::broadcast::{self, error::RecvError};

/// Queue every mutation the tap announces as an engine intent.
///
/// Runs until the tap is dropped or the engine stops.
pub async fn forward_mutations(mut messages: broadcast::Receiver<TapMessage>, engine: SyncEngine) {
    loop {
        match messages.recv().await {
            Ok(message) => {
                let Some(event) = message.mutation_event() else {
                    continue;
                };
                tracing::debug!(event = %event, "forwarding mutation to engine");
                if engine.dispatch(Intent::Apply(event)).is_err() {
                    tracing::warn!("sync engine closed, mutation bridge stopping");
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "mutation bridge lagged, messages lost");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
