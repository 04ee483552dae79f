pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;

// Domain data shapes shared across layers
pub mod domain;

// Application use cases and the adapters behind their ports
pub mod app;
pub mod infra;

pub use app::{run_dedup, DedupReport, DedupSettings};
pub use error::{DedupError, Result};
pub use pipeline::{deduplicate, normalize_address, normalize_name};
