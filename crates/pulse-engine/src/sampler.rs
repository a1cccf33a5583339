//! System sampler: a periodic producer of process resource gauges.
//!
//! Every interval it reads a [`SystemProbe`] and records:
//! - `system.memory.heap_used`  (MB, resident memory)
//! - `system.memory.heap_total` (MB, virtual memory)
//! - `system.cpu.usage`         (ms, accumulated CPU time)

use std::sync::Weak;
use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use pulse_core::error::Result;

use crate::registry::MetricRegistry;
use crate::tasks;

pub const HEAP_USED: &str = "system.memory.heap_used";
pub const HEAP_TOTAL: &str = "system.memory.heap_total";
pub const CPU_USAGE: &str = "system.cpu.usage";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One reading of the process' resource usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSample {
    pub heap_used_mb: f64,
    pub heap_total_mb: f64,
    pub cpu_usage_ms: f64,
}

/// Source of [`SystemSample`]s. `None` skips the tick.
pub trait SystemProbe: Send + 'static {
    fn sample(&mut self) -> Option<SystemSample>;
}

/// Probe backed by the `sysinfo` crate, reading this process.
pub struct SysinfoProbe {
    system: System,
    pid: Option<Pid>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, "cannot resolve own pid, system sampling disabled");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn sample(&mut self) -> Option<SystemSample> {
        let pid = self.pid?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let process = self.system.process(pid)?;
        Some(SystemSample {
            heap_used_mb: process.memory() as f64 / BYTES_PER_MB,
            heap_total_mb: process.virtual_memory() as f64 / BYTES_PER_MB,
            cpu_usage_ms: process.accumulated_cpu_time() as f64,
        })
    }
}

/// Write one sample as the three system gauges.
pub fn record_sample(registry: &MetricRegistry, sample: &SystemSample) -> Result<()> {
    registry.gauge(HEAP_USED, sample.heap_used_mb, &[])?;
    registry.gauge(HEAP_TOTAL, sample.heap_total_mb, &[])?;
    registry.gauge(CPU_USAGE, sample.cpu_usage_ms, &[])?;
    Ok(())
}

/// Take one sample from `probe` and record it. Returns whether a sample was taken.
pub fn sample_once(registry: &MetricRegistry, probe: &mut dyn SystemProbe) -> Result<bool> {
    let Some(sample) = probe.sample() else {
        tracing::debug!("system probe returned no sample");
        return Ok(false);
    };
    record_sample(registry, &sample)?;
    Ok(true)
}

pub(crate) fn spawn(
    registry: Weak<MetricRegistry>,
    mut probe: Box<dyn SystemProbe>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = tasks::stopped(&mut shutdown) => break,
            }

            let Some(registry) = registry.upgrade() else { break };
            if let Err(e) = sample_once(&registry, probe.as_mut()) {
                tracing::warn!(error = %e, "system sample not recorded");
            }
        }
        tracing::debug!("system sampler stopped");
    })
}
