//! pulse engine library entry.
//!
//! This crate wires the series store, event bus, background tasks
//! (retention sweeper, system sampler), timing helpers, and the exposition
//! endpoints into one engine. It is consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod app_state;
pub mod config;
pub mod events;
pub mod export;
pub mod ops;
pub mod registry;
pub mod router;
pub mod sampler;
pub mod sweeper;
pub mod timer;

mod series;
mod tasks;

pub use events::{MetricEvent, MetricSubscriber};
pub use registry::{MetricRegistry, RegistryStats};
pub use sweeper::SweepReport;
pub use timer::TimerGuard;
