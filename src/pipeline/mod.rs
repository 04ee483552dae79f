// Data cleaning pipeline over collected store tables

pub mod processing;

// Re-export the operations callers reach for most
pub use processing::dedup::deduplicate;
pub use processing::normalize::{normalize_address, normalize_name};
