//! Feedline API - Feed Assembly Layer
//!
//! Wires the query pipeline to storage collaborators and exposes the result
//! as a serializable [`FeedPage`]. Also owns the caller-facing error surface,
//! tracing initialization and the `feed-query` command-line runner.

pub mod assembler;
pub mod cli;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use assembler::{FeedAssembler, FeedPage, PostView, VersionView};
pub use cli::{CliArgs, CliError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
