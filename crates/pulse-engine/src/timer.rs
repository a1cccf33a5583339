//! Wall-clock timing helpers that feed histograms.
//!
//! [`TimerGuard`] records the elapsed milliseconds exactly once: when it is
//! observed explicitly or when it is dropped. Drop runs on every exit path,
//! including `?` returns, panics unwinding through the caller, and futures
//! dropped before completion.

use std::future::Future;
use std::time::{Duration, Instant};

use pulse_core::error::Result;
use pulse_core::metric::validate_tags;
use pulse_core::{MetricKind, Tags};

use crate::registry::MetricRegistry;

#[must_use = "the measurement is recorded when the guard is dropped"]
pub struct TimerGuard<'a> {
    registry: &'a MetricRegistry,
    name: String,
    tags: Tags,
    start: Instant,
    recorded: bool,
}

impl<'a> TimerGuard<'a> {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record now and return the recorded milliseconds.
    pub fn observe(mut self) -> f64 {
        self.finish()
    }

    fn finish(&mut self) -> f64 {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if self.recorded {
            return ms;
        }
        self.recorded = true;
        let tags = std::mem::take(&mut self.tags);
        if let Err(e) = self.registry.write(&self.name, MetricKind::Histogram, ms, tags) {
            tracing::warn!(metric = %self.name, error = %e, "timer measurement dropped");
        }
        ms
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.finish();
        }
    }
}

impl MetricRegistry {
    /// Start timing into histogram `name`. The name, the tag keys, and the
    /// kind binding are checked here, before any work runs.
    pub fn start_timer(&self, name: &str, tags: &[(&str, &str)]) -> Result<TimerGuard<'_>> {
        self.check_kind(name, MetricKind::Histogram)?;
        let tags = Tags::from_pairs(tags);
        validate_tags(&tags)?;
        Ok(TimerGuard {
            registry: self,
            name: name.to_string(),
            tags,
            start: Instant::now(),
            recorded: false,
        })
    }

    /// Run `work`, recording its duration in ms as a histogram point.
    ///
    /// `work`'s output (including an `Err`) is returned unchanged inside `Ok`;
    /// the outer `Err` only signals a rejected name, in which case `work`
    /// never runs.
    pub fn timer<T>(&self, name: &str, tags: &[(&str, &str)], work: impl FnOnce() -> T) -> Result<T> {
        let guard = self.start_timer(name, tags)?;
        let out = work();
        drop(guard);
        Ok(out)
    }

    /// Async counterpart of [`MetricRegistry::timer`].
    ///
    /// The clock starts and the name is checked here, at the call, not at
    /// the first poll; the measurement spans from this call to the
    /// settlement (or drop) of the returned future.
    pub fn timer_async<'a, F>(
        &'a self,
        name: &str,
        tags: &[(&str, &str)],
        work: F,
    ) -> Result<impl Future<Output = F::Output> + 'a>
    where
        F: Future + 'a,
    {
        let guard = self.start_timer(name, tags)?;
        Ok(async move {
            let out = work.await;
            drop(guard);
            out
        })
    }
}
