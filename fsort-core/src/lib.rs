//! fsort - sort a directory tree by file type
//!
//! Scans a folder recursively, classifies every file by extension, and moves
//! it into a category folder under the output root with a normalized name.
//! Archives are unpacked into their own folder instead of being moved.
//!
//! ```text
//! result/
//! ├── images/
//! ├── audio/
//! ├── video/
//! ├── documents/
//! ├── archives/
//! │   └── <archive stem>/   # unpacked contents
//! └── other/
//! ```

pub mod archive;
pub mod category;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod relocate;
pub mod report;
pub mod scanner;

pub use archive::ArchiveFormat;
pub use category::{classify, Category};
pub use config::{FolderNames, SortConfig, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR};
pub use error::{Result, SortError};
pub use normalize::{normalize, normalize_stem, split_ext};
pub use orchestrator::{sort_folder, DispatchPlan, Sorter};
pub use relocate::BatchOutcome;
pub use report::SortReport;
pub use scanner::{FileRecord, ScanState, ScanStats, TreeScanner};

/// fsort version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
