//! pulse core: runtime-free metric primitives, error types, and the text
//! exposition renderer.
//!
//! This crate defines the data model and wire contract shared by the engine
//! and by anything that consumes its snapshots. It intentionally carries no
//! runtime dependencies so snapshots can be rendered or inspected anywhere.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `TelemetryError`/`Result` so a
//! telemetry failure never takes its host process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod metric;

/// Shared result type.
pub use error::{ErrorCode, Result, TelemetryError};
pub use metric::{MetricKind, MetricPoint, SeriesSnapshot, Tags};
