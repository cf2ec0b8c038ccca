use crate::category::{classify, Category};
use crate::normalize::extension_of;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// A file found during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path as reached by the walk
    pub path: PathBuf,
    /// Folder containing the file
    pub folder: PathBuf,
    /// Inferred category
    pub category: Category,
    /// Extension as written, without the dot (empty when there is none)
    pub extension: String,
}

impl FileRecord {
    /// Build a record for a file path, classifying it by extension
    pub fn new(path: PathBuf) -> Self {
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let extension = path
            .file_name()
            .map(|name| extension_of(&name.to_string_lossy()).to_string())
            .unwrap_or_default();
        let category = classify(&extension);

        Self { path, folder, category, extension }
    }

    /// File name, lossily decoded
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// Classification state for one sorting run.
///
/// Buckets keep walk order. A path is only ever added once, so it lives in
/// exactly one bucket.
#[derive(Debug, Default, Clone)]
pub struct ScanState {
    buckets: [Vec<FileRecord>; Category::COUNT],
    paths: HashSet<PathBuf>,
    extensions: BTreeSet<String>,
    unknown: BTreeSet<String>,
    folders: Vec<PathBuf>,
    folder_set: HashSet<PathBuf>,
}

impl ScanState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and record a file. Returns false if the path was already recorded.
    pub fn add_file(&mut self, path: PathBuf) -> bool {
        if self.paths.contains(&path) {
            return false;
        }
        self.push_record(FileRecord::new(path));
        true
    }

    /// Record a discovered subfolder. Returns false if it was already recorded.
    pub fn add_folder(&mut self, path: PathBuf) -> bool {
        if !self.folder_set.insert(path.clone()) {
            return false;
        }
        self.folders.push(path);
        true
    }

    fn push_record(&mut self, record: FileRecord) {
        if !record.extension.is_empty() {
            let upper = record.extension.to_ascii_uppercase();
            if Category::from_extension(&upper).is_some() {
                self.extensions.insert(upper);
            } else {
                self.unknown.insert(upper);
            }
        }
        self.paths.insert(record.path.clone());
        self.buckets[record.category.index()].push(record);
    }

    /// Append another state after this one, keeping its order and skipping
    /// paths already present.
    pub fn merge(&mut self, other: ScanState) {
        let ScanState { buckets, folders, .. } = other;
        for bucket in buckets {
            for record in bucket {
                if !self.paths.contains(&record.path) {
                    self.push_record(record);
                }
            }
        }
        for folder in folders {
            self.add_folder(folder);
        }
    }

    /// Records in a category, in walk order
    pub fn bucket(&self, category: Category) -> &[FileRecord] {
        &self.buckets[category.index()]
    }

    /// Known extensions seen (upper-case)
    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    /// Extensions that did not match the table (upper-case)
    pub fn unknown_extensions(&self) -> &BTreeSet<String> {
        &self.unknown
    }

    /// Discovered subfolders, in walk order
    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Whether a path has been recorded
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Total number of recorded files
    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Nothing recorded: no files and no folders
    pub fn is_empty(&self) -> bool {
        self.file_count() == 0 && self.folders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_classification() {
        let record = FileRecord::new(PathBuf::from("/in/photos/cat.JPG"));
        assert_eq!(record.category, Category::Image);
        assert_eq!(record.extension, "JPG");
        assert_eq!(record.folder, PathBuf::from("/in/photos"));
        assert_eq!(record.file_name(), "cat.JPG");
    }

    #[test]
    fn test_no_extension_is_other_not_unknown() {
        let mut state = ScanState::new();
        state.add_file(PathBuf::from("/in/Makefile"));
        state.add_file(PathBuf::from("/in/.bashrc"));

        assert_eq!(state.bucket(Category::Other).len(), 2);
        assert!(state.unknown_extensions().is_empty());
        assert!(state.extensions().is_empty());
    }

    #[test]
    fn test_unknown_extension_recorded() {
        let mut state = ScanState::new();
        state.add_file(PathBuf::from("/in/setup.exe"));
        state.add_file(PathBuf::from("/in/song.mp3"));

        assert_eq!(state.bucket(Category::Other).len(), 1);
        assert_eq!(state.bucket(Category::Audio).len(), 1);
        assert!(state.unknown_extensions().contains("EXE"));
        assert!(state.extensions().contains("MP3"));
        assert!(!state.extensions().contains("EXE"));
    }

    #[test]
    fn test_no_double_add() {
        let mut state = ScanState::new();
        assert!(state.add_file(PathBuf::from("/in/a.txt")));
        assert!(!state.add_file(PathBuf::from("/in/a.txt")));
        assert_eq!(state.file_count(), 1);

        assert!(state.add_folder(PathBuf::from("/in/sub")));
        assert!(!state.add_folder(PathBuf::from("/in/sub")));
        assert_eq!(state.folders().len(), 1);
    }

    #[test]
    fn test_is_empty() {
        let mut state = ScanState::new();
        assert!(state.is_empty());

        state.add_folder(PathBuf::from("/in/sub"));
        assert!(!state.is_empty());
        assert_eq!(state.file_count(), 0);

        let mut files_only = ScanState::new();
        files_only.add_file(PathBuf::from("/in/a.txt"));
        assert!(!files_only.is_empty());
    }

    #[test]
    fn test_bucket_keeps_insertion_order() {
        let mut state = ScanState::new();
        for name in ["c.txt", "a.txt", "b.pdf"] {
            state.add_file(PathBuf::from("/in").join(name));
        }
        let names: Vec<_> = state
            .bucket(Category::Document)
            .iter()
            .map(|r| r.file_name().into_owned())
            .collect();
        assert_eq!(names, vec!["c.txt", "a.txt", "b.pdf"]);
    }

    #[test]
    fn test_merge_appends_and_dedups() {
        let mut left = ScanState::new();
        left.add_file(PathBuf::from("/in/a.png"));
        left.add_folder(PathBuf::from("/in/x"));

        let mut right = ScanState::new();
        right.add_file(PathBuf::from("/in/a.png"));
        right.add_file(PathBuf::from("/in/x/b.png"));
        right.add_file(PathBuf::from("/in/x/c.xyz"));
        right.add_folder(PathBuf::from("/in/x"));
        right.add_folder(PathBuf::from("/in/x/y"));

        left.merge(right);

        let images: Vec<_> = left.bucket(Category::Image).iter().map(|r| r.path.clone()).collect();
        assert_eq!(images, vec![PathBuf::from("/in/a.png"), PathBuf::from("/in/x/b.png")]);
        assert_eq!(left.folders(), &[PathBuf::from("/in/x"), PathBuf::from("/in/x/y")]);
        assert!(left.unknown_extensions().contains("XYZ"));
        assert_eq!(left.file_count(), 3);
    }
}
