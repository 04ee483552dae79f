// Observability: logging and metrics

pub mod logging;
pub mod metrics;

pub use logging::{file_appender, init_logging};
pub use metrics::{emit_counter, emit_gauge, emit_histogram, MetricName, MetricsRecorder};
