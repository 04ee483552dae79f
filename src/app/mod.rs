pub mod dedup_use_case;
pub mod ports;
pub mod report;

pub use dedup_use_case::{run_dedup, DedupSettings, DedupUseCase};
pub use report::DedupReport;
