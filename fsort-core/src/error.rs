//! Error types for fsort operations

use std::path::PathBuf;
use thiserror::Error;

/// fsort Error types
#[derive(Error, Debug)]
pub enum SortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Unsupported archive format: {}", .0.display())]
    UnsupportedArchive(PathBuf),

    #[error("Corrupt archive {}: {reason}", path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker pool error: {0}")]
    Pool(String),
}

impl SortError {
    /// True for errors that mean the archive itself is unusable, as opposed
    /// to the filesystem around it failing.
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            SortError::UnsupportedArchive(_) | SortError::CorruptArchive { .. } | SortError::Zip(_)
        )
    }
}

/// Result type for fsort operations
pub type Result<T> = std::result::Result<T, SortError>;

impl From<serde_json::Error> for SortError {
    fn from(e: serde_json::Error) -> Self {
        SortError::Config(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for SortError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SortError::Pool(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SortError::NotADirectory(PathBuf::from("notes.txt"));
        assert_eq!(err.to_string(), "Not a directory: notes.txt");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SortError = io_err.into();
        assert!(matches!(err, SortError::Io(_)));
        assert!(!err.is_archive_error());
    }

    #[test]
    fn test_corrupt_archive_display() {
        let err = SortError::CorruptArchive {
            path: PathBuf::from("broken.zip"),
            reason: "invalid Zip archive".to_string(),
        };
        assert!(err.to_string().contains("broken.zip"));
        assert!(err.to_string().contains("invalid Zip archive"));
        assert!(err.is_archive_error());
    }

    #[test]
    fn test_unsupported_is_archive_error() {
        let err = SortError::UnsupportedArchive(PathBuf::from("x.rar"));
        assert!(err.is_archive_error());
    }

    #[test]
    fn test_config_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SortError = json_err.into();
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            SortError::NotADirectory("a".into()),
            SortError::UnsupportedArchive("a".into()),
            SortError::CorruptArchive { path: "a".into(), reason: "b".into() },
            SortError::Config("test".into()),
            SortError::Pool("test".into()),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
