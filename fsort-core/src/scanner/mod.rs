//! Tree scanning for fsort
//!
//! Walks a directory tree once and buckets every file by category:
//! - Per-run [`ScanState`] (no shared globals)
//! - Reserved output folders are never descended
//! - Optional parallel scan with task-local states merged in walk order

mod state;
mod walk;

pub use state::{FileRecord, ScanState};
pub use walk::{ScanStats, TreeScanner};
