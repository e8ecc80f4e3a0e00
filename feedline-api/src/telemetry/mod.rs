//! Feedline Telemetry - Logging Infrastructure
//!
//! Installs the `tracing` subscriber the engine's spans and events flow
//! into. Library crates only emit; this module decides the output format.

pub mod tracer;

pub use tracer::{init_tracing, LogFormat, TelemetryConfig};
