// Pipeline processing: key normalization, diagnostics, and deduplication

pub mod dedup;
pub mod diagnostics;
pub mod normalize;
