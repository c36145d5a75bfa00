use crate::storage::Storage;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::{JoinHandle, JoinSet},
};

/// Hands access-count increments to a background worker so redirects never
/// wait on the write.
///
/// Each increment runs under its own deadline, detached from the request that
/// queued it. Failures are logged here and nowhere else; they are not retried.
/// When every `AccessRecorder` handle is dropped the worker finishes the
/// increments already queued and exits.
#[derive(Clone, Debug)]
pub struct AccessRecorder {
    tx: mpsc::Sender<String>,
}

impl AccessRecorder {
    /// Start the worker on the current tokio runtime.
    ///
    /// `capacity` bounds the number of queued codes; beyond it new increments
    /// are dropped with a warning.
    pub fn spawn(
        store: Arc<dyn Storage>,
        deadline: Duration,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run(store, deadline, rx));
        (Self { tx }, worker)
    }

    /// Queue one access for `code`. Never blocks.
    pub fn record(&self, code: &str) {
        match self.tx.try_send(code.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(code)) => {
                tracing::warn!("Access queue full, dropping increment for '{}'", code);
            }
            Err(TrySendError::Closed(code)) => {
                tracing::warn!("Access recorder stopped, dropping increment for '{}'", code);
            }
        }
    }
}

async fn run(store: Arc<dyn Storage>, deadline: Duration, mut rx: mpsc::Receiver<String>) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(code) => {
                    in_flight.spawn(increment(store.clone(), code, deadline));
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join(joined);
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        log_join(joined);
    }
    tracing::debug!("Access recorder drained and stopped");
}

async fn increment(store: Arc<dyn Storage>, code: String, deadline: Duration) {
    match tokio::time::timeout(deadline, store.increment_access_count(&code)).await {
        Ok(Ok(true)) => tracing::trace!("Access count incremented for '{}'", code),
        Ok(Ok(false)) => tracing::warn!(
            "Access count: '{}' disappeared between redirect and increment",
            code
        ),
        Ok(Err(e)) => tracing::error!("Access count increment failed for '{}': {}", code, e),
        Err(_) => tracing::warn!(
            "Access count increment for '{}' timed out after {:?}",
            code,
            deadline
        ),
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Access count task panicked: {}", e);
    }
}
