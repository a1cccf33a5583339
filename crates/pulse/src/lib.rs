//! Top-level facade crate for pulse.
//!
//! Re-exports core types and the engine library so users can depend on a single crate.

pub mod core {
    pub use pulse_core::*;
}

pub mod engine {
    pub use pulse_engine::*;
}
