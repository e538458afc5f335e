//! Address-space pattern search.

mod kmp;
mod regions;
mod scanner;
mod validity;

pub use kmp::{FailureTable, Matches};
pub use regions::RegionWalker;
pub use scanner::{
    DEFAULT_CHUNK_SIZE, PatternMatch, PatternScanner, ScanOptions, ScanReport, ScanStats,
};
pub use validity::{is_valid_candidate, truncate_at_nul};
