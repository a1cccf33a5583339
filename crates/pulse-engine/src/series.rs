//! One named series: a bounded, lock-protected point buffer.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use pulse_core::error::{Result, TelemetryError};
use pulse_core::{MetricKind, MetricPoint, SeriesSnapshot, Tags};

pub(crate) struct SeriesCell {
    name: String,
    kind: MetricKind,
    /// Count cap; `None` for counters (age sweep only).
    cap: Option<usize>,
    created_seq: u64,
    points: Mutex<VecDeque<MetricPoint>>,
}

impl SeriesCell {
    pub(crate) fn new(name: &str, kind: MetricKind, cap: Option<usize>, created_seq: u64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            cap,
            created_seq,
            points: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> MetricKind {
        self.kind
    }

    pub(crate) fn created_seq(&self) -> u64 {
        self.created_seq
    }

    // Writers and readers keep going on a poisoned lock: every critical
    // section leaves the deque in a valid state.
    fn lock(&self) -> MutexGuard<'_, VecDeque<MetricPoint>> {
        self.points.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append, then drop the oldest points beyond the cap.
    /// Returns how many points were trimmed.
    pub(crate) fn push(&self, point: MetricPoint) -> usize {
        let mut points = self.lock();
        points.push_back(point);
        self.trim(&mut points)
    }

    /// Append a point stamped with the current time. The stamp is taken
    /// under the series lock, so insertion order is chronological order.
    /// Returns the stamp and how many points were trimmed.
    pub(crate) fn append_now(&self, value: f64, tags: Tags) -> (SystemTime, usize) {
        let mut points = self.lock();
        let now = SystemTime::now();
        points.push_back(MetricPoint::at(now, value, tags));
        (now, self.trim(&mut points))
    }

    fn trim(&self, points: &mut VecDeque<MetricPoint>) -> usize {
        let Some(cap) = self.cap else { return 0 };
        let excess = points.len().saturating_sub(cap);
        points.drain(..excess);
        excess
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn snapshot(&self) -> SeriesSnapshot {
        let points = self.lock();
        SeriesSnapshot {
            name: self.name.clone(),
            kind: self.kind,
            points: points.iter().cloned().collect(),
        }
    }

    /// Drop every point older than `cutoff`.
    ///
    /// A poisoned lock is reported as a sweep failure (and the poison
    /// cleared) so the next tick retries this series.
    pub(crate) fn evict_before(&self, cutoff: SystemTime) -> Result<usize> {
        let mut points = match self.points.lock() {
            Ok(points) => points,
            Err(_) => {
                self.points.clear_poison();
                return Err(TelemetryError::SweepFailure {
                    name: self.name.clone(),
                    reason: "series lock poisoned by a panicking writer".into(),
                });
            }
        };
        let before = points.len();
        points.retain(|p| !p.is_before(cutoff));
        Ok(before - points.len())
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.points.lock();
            panic!("poison series lock");
        }));
    }
}
