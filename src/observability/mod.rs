//! Logging and metrics for the decoder.
//!
//! The library only emits `tracing` events and `metrics` measurements; binaries
//! decide where they go.

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, LoggingConfig};
pub use metrics::DecoderMetrics;
