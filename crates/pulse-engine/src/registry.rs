//! MetricRegistry: the shared name -> series store.
//!
//! - `name -> Arc<SeriesCell>` in a sharded `DashMap`; the shard entry lock is
//!   only taken long enough to create a brand-new series.
//! - Each series carries its own `Mutex`, so writers to unrelated series never
//!   contend. Writers clone the series handle out of the map before locking it.
//! - Readers copy the handle list, then each series' points.
//!
//! A name is bound to the kind of its first observation for the registry's
//! lifetime; writing it as another kind is rejected with `KindMismatch`.
//! Series are never deleted: one emptied by the sweeper stays resident.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use serde::Serialize;

use pulse_core::error::{Result, TelemetryError};
use pulse_core::metric::{validate_name, validate_tags};
use pulse_core::{MetricKind, MetricPoint, SeriesSnapshot, Tags};

use crate::config::{LimitsSection, PulseConfig, RetentionSection, SamplerSection};
use crate::events::{self, EventBus, MetricEvent, MetricSubscriber};
use crate::sampler::{self, SysinfoProbe, SystemProbe};
use crate::series::SeriesCell;
use crate::sweeper::{self, SweepReport};
use crate::tasks::Background;

const SWEEPER_TASK: &str = "retention-sweeper";
const SAMPLER_TASK: &str = "system-sampler";
const LISTENER_TASK: &str = "metric-listener";

/// Aggregate counts, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_metrics: usize,
    pub total_points: usize,
    pub by_type: BTreeMap<MetricKind, usize>,
}

pub struct MetricRegistry {
    series: DashMap<String, Arc<SeriesCell>>,
    seq: AtomicU64,
    limits: LimitsSection,
    retention: RetentionSection,
    sampler: SamplerSection,
    events: EventBus,
    background: Background,
    pending_probe: Mutex<Option<Box<dyn SystemProbe>>>,
}

impl MetricRegistry {
    /// Build the registry. Background tasks start with [`MetricRegistry::start`].
    pub fn new(cfg: &PulseConfig) -> Arc<Self> {
        Arc::new(Self {
            series: DashMap::new(),
            seq: AtomicU64::new(1),
            limits: cfg.limits.clone(),
            retention: cfg.retention.clone(),
            sampler: cfg.sampler.clone(),
            events: EventBus::new(cfg.events.channel_capacity),
            background: Background::new(),
            pending_probe: Mutex::new(None),
        })
    }

    /// Registry with default config.
    pub fn with_defaults() -> Arc<Self> {
        Self::new(&PulseConfig::default())
    }

    // --------------------
    // Ingestion
    // --------------------

    /// Record a counter delta.
    pub fn increment(&self, name: &str, delta: f64, tags: &[(&str, &str)]) -> Result<()> {
        self.write(name, MetricKind::Counter, delta, Tags::from_pairs(tags))
    }

    /// `increment(name, 1, no tags)`.
    pub fn increment_one(&self, name: &str) -> Result<()> {
        self.increment(name, 1.0, &[])
    }

    /// Record a gauge sample (oldest samples beyond the cap are dropped).
    pub fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]) -> Result<()> {
        self.write(name, MetricKind::Gauge, value, Tags::from_pairs(tags))
    }

    /// Record a histogram sample (oldest samples beyond the cap are dropped).
    pub fn histogram(&self, name: &str, value: f64, tags: &[(&str, &str)]) -> Result<()> {
        self.write(name, MetricKind::Histogram, value, Tags::from_pairs(tags))
    }

    /// Record a caller-built point, keeping its timestamp.
    pub fn record(&self, name: &str, kind: MetricKind, point: MetricPoint) -> Result<()> {
        validate_name(name)?;
        validate_tags(&point.tags)?;
        let cell = self.resolve(name, kind)?;

        let event_tags = self.has_subscribers().then(|| point.tags.clone());
        let (value, timestamp) = (point.value, point.timestamp);
        let trimmed = cell.push(point);
        self.after_write(name, kind, value, timestamp, trimmed, event_tags);
        Ok(())
    }

    /// Common write path: validate, resolve-or-create, append stamped with
    /// the current time, trim, publish.
    pub(crate) fn write(&self, name: &str, kind: MetricKind, value: f64, tags: Tags) -> Result<()> {
        validate_name(name)?;
        validate_tags(&tags)?;
        let cell = self.resolve(name, kind)?;

        let event_tags = self.has_subscribers().then(|| tags.clone());
        let (timestamp, trimmed) = cell.append_now(value, tags);
        self.after_write(name, kind, value, timestamp, trimmed, event_tags);
        Ok(())
    }

    fn has_subscribers(&self) -> bool {
        self.events.subscriber_count() > 0
    }

    fn after_write(
        &self,
        name: &str,
        kind: MetricKind,
        value: f64,
        timestamp: SystemTime,
        trimmed: usize,
        event_tags: Option<Tags>,
    ) {
        if trimmed > 0 {
            tracing::trace!(metric = %name, %kind, trimmed, "series cap reached");
        }
        if let Some(tags) = event_tags {
            self.events.publish_with(|| MetricEvent {
                name: name.to_string(),
                kind,
                value,
                tags,
                timestamp,
            });
        }
    }

    /// Validate a name and that it is (or may become) a `kind` series,
    /// without creating anything.
    pub(crate) fn check_kind(&self, name: &str, kind: MetricKind) -> Result<()> {
        validate_name(name)?;
        match self.series.get(name) {
            Some(cell) => ensure_kind(cell.value(), kind),
            None => Ok(()),
        }
    }

    fn resolve(&self, name: &str, kind: MetricKind) -> Result<Arc<SeriesCell>> {
        if let Some(cell) = self.series.get(name) {
            let cell = Arc::clone(cell.value());
            ensure_kind(&cell, kind)?;
            return Ok(cell);
        }

        let cell = self
            .series
            .entry(name.to_string())
            .or_insert_with(|| {
                let seq = self.seq.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(metric = %name, %kind, "series created");
                Arc::new(SeriesCell::new(name, kind, self.cap_for(kind), seq))
            })
            .value()
            .clone();
        // Another producer may have created it first with a different kind.
        ensure_kind(&cell, kind)?;
        Ok(cell)
    }

    fn cap_for(&self, kind: MetricKind) -> Option<usize> {
        match kind {
            MetricKind::Counter => None,
            MetricKind::Gauge => Some(self.limits.gauge_max_points),
            MetricKind::Histogram => Some(self.limits.histogram_max_points),
        }
    }

    // --------------------
    // Query
    // --------------------

    /// Read-only lookup; never creates.
    pub fn get_metric(&self, name: &str) -> Option<SeriesSnapshot> {
        let cell = self.series.get(name).map(|r| Arc::clone(r.value()))?;
        Some(cell.snapshot())
    }

    /// Snapshot of every resident series, in creation order.
    pub fn get_all_metrics(&self) -> Vec<SeriesSnapshot> {
        self.cells().iter().map(|c| c.snapshot()).collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut by_type: BTreeMap<MetricKind, usize> =
            MetricKind::ALL.iter().map(|k| (*k, 0)).collect();
        let mut total_points = 0;
        let cells = self.cells();
        for cell in &cells {
            *by_type.entry(cell.kind()).or_insert(0) += 1;
            total_points += cell.len();
        }
        RegistryStats {
            total_metrics: cells.len(),
            total_points,
            by_type,
        }
    }

    /// Copy of the series handle list, ordered by creation.
    fn cells(&self) -> Vec<Arc<SeriesCell>> {
        let mut cells: Vec<Arc<SeriesCell>> =
            self.series.iter().map(|r| Arc::clone(r.value())).collect();
        cells.sort_by_key(|c| c.created_seq());
        cells
    }

    // --------------------
    // Retention
    // --------------------

    pub fn retention_window(&self) -> Duration {
        self.retention.window()
    }

    /// Evict every point older than `now - window`, one series at a time.
    /// Failures are logged per series and do not stop the sweep.
    pub fn sweep(&self, now: SystemTime) -> SweepReport {
        let cutoff = now.checked_sub(self.retention.window()).unwrap_or(SystemTime::UNIX_EPOCH);
        let mut report = SweepReport::default();
        for cell in self.cells() {
            report.series_visited += 1;
            match cell.evict_before(cutoff) {
                Ok(evicted) => report.points_evicted += evicted,
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(metric = %cell.name(), error = %e, "series sweep failed, skipping");
                }
            }
        }
        report
    }

    // --------------------
    // Events
    // --------------------

    pub fn subscribe(&self) -> MetricSubscriber {
        self.events.subscribe()
    }

    /// Events published since creation (only counted while subscribed).
    pub fn events_emitted(&self) -> u64 {
        self.events.emitted()
    }

    /// Run `handler` on every event in its own task until `stop()`.
    /// Handler errors are logged and never reach the writers.
    pub fn spawn_listener<F>(&self, label: impl Into<String>, handler: F) -> Result<()>
    where
        F: FnMut(&MetricEvent) -> Result<()> + Send + 'static,
    {
        ensure_runtime()?;
        if self.background.is_stopped() {
            return Err(TelemetryError::Internal("registry already stopped".into()));
        }
        let handle = events::spawn_listener(
            label.into(),
            self.events.subscribe(),
            self.background.shutdown_signal(),
            handler,
        );
        self.background.track(LISTENER_TASK, handle);
        Ok(())
    }

    // --------------------
    // Lifecycle
    // --------------------

    /// Spawn the retention sweeper and, when enabled, the system sampler.
    /// Needs a tokio runtime. A second call is a no-op.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        ensure_runtime()?;
        if self.background.is_stopped() {
            return Err(TelemetryError::Internal("registry already stopped".into()));
        }

        let swept = self.background.spawn_once(SWEEPER_TASK, || {
            sweeper::spawn(
                Arc::downgrade(self),
                self.retention.sweep_interval(),
                self.background.shutdown_signal(),
            )
        });
        if swept {
            tracing::info!(
                every_secs = self.retention.sweep_interval_secs,
                window_secs = self.retention.window_secs,
                "retention sweeper started"
            );
        }

        if self.sampler.enabled {
            let sampled = self.background.spawn_once(SAMPLER_TASK, || {
                let probe = self
                    .pending_probe
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take()
                    .unwrap_or_else(|| Box::new(SysinfoProbe::new()) as Box<dyn SystemProbe>);
                sampler::spawn(
                    Arc::downgrade(self),
                    probe,
                    self.sampler.interval(),
                    self.background.shutdown_signal(),
                )
            });
            if sampled {
                tracing::info!(every_secs = self.sampler.interval_secs, "system sampler started");
            }
        }
        Ok(())
    }

    /// Use `probe` instead of the sysinfo probe on the next `start()`.
    pub fn set_probe(&self, probe: Box<dyn SystemProbe>) {
        *self.pending_probe.lock().unwrap_or_else(PoisonError::into_inner) = Some(probe);
    }

    /// Signal every background task to exit. Idempotent.
    pub fn stop(&self) {
        if self.background.stop() {
            tracing::info!("metric registry stopping background tasks");
        }
    }

    /// `stop()` and wait for the background tasks to finish.
    pub async fn shutdown(&self) {
        self.stop();
        self.background.join_all().await;
    }

    /// Background tasks that have not finished yet.
    pub fn running_tasks(&self) -> usize {
        self.background.running()
    }
}

fn ensure_kind(cell: &SeriesCell, requested: MetricKind) -> Result<()> {
    if cell.kind() == requested {
        return Ok(());
    }
    Err(TelemetryError::KindMismatch {
        name: cell.name().to_string(),
        existing: cell.kind(),
        requested,
    })
}

fn ensure_runtime() -> Result<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| TelemetryError::Internal("background tasks need a tokio runtime".into()))
}
