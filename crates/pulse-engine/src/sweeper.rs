//! Retention sweeper: periodic age-based eviction.
//!
//! Runs on a fixed interval and calls [`MetricRegistry::sweep`]. The task
//! only holds a `Weak` registry handle, so dropping the registry ends it just
//! like `stop()` does.

use std::sync::Weak;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::registry::MetricRegistry;
use crate::tasks;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub series_visited: usize,
    pub points_evicted: usize,
    pub failures: usize,
}

pub(crate) fn spawn(
    registry: Weak<MetricRegistry>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; sweep one full period later.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = tasks::stopped(&mut shutdown) => break,
            }

            let Some(registry) = registry.upgrade() else { break };
            let report = registry.sweep(SystemTime::now());
            tracing::debug!(
                visited = report.series_visited,
                evicted = report.points_evicted,
                failures = report.failures,
                "retention sweep finished"
            );
        }
        tracing::debug!("retention sweeper stopped");
    })
}
