//! Background task bookkeeping shared by the sweeper, the sampler, and
//! event listeners.
//!
//! Tasks watch a single shutdown flag and exit at their next await point
//! once it flips. Work already running (a sweep, a sample) completes first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub(crate) struct Background {
    shutdown: watch::Sender<bool>,
    stopped: AtomicBool,
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl Background {
    pub(crate) fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            stopped: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Receiver a task selects on; marks the current value as seen.
    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub(crate) fn track(&self, label: &'static str, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((label, handle));
    }

    /// Spawn `label` unless a live task with that label exists. The check
    /// and the spawn happen under one lock, so concurrent callers spawn once.
    /// Returns whether a task was spawned.
    pub(crate) fn spawn_once(
        &self,
        label: &'static str,
        spawn: impl FnOnce() -> JoinHandle<()>,
    ) -> bool {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.iter().any(|(l, h)| *l == label && !h.is_finished()) {
            return false;
        }
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((label, spawn()));
        true
    }

    /// Flip the shutdown flag. Returns false if it was already flipped.
    pub(crate) fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.shutdown.send_replace(true);
        true
    }

    pub(crate) fn running(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|(_, h)| !h.is_finished()).count()
    }

    /// Await every tracked task. Panicked tasks are logged, not propagated.
    pub(crate) async fn join_all(&self) {
        let drained: Vec<_> = {
            let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
            handles.drain(..).collect()
        };
        for (label, handle) in drained {
            if let Err(e) = handle.await {
                tracing::warn!(task = label, error = %e, "background task ended abnormally");
            }
        }
    }
}

/// Resolves once the shutdown flag is set (or its sender is gone).
pub(crate) async fn stopped(signal: &mut watch::Receiver<bool>) {
    while !*signal.borrow_and_update() {
        if signal.changed().await.is_err() {
            return;
        }
    }
}
