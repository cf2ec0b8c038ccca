use crate::category::Category;
use crate::{Result, SortError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default number of concurrent sorting tasks
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default output directory name
pub const DEFAULT_OUTPUT_DIR: &str = "result";

/// Output folder name for each category.
///
/// These names double as the reserved folder names the scanner refuses to
/// descend into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderNames {
    pub images: String,
    pub audio: String,
    pub video: String,
    pub documents: String,
    pub archives: String,
    pub other: String,
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            images: Category::Image.default_folder().to_string(),
            audio: Category::Audio.default_folder().to_string(),
            video: Category::Video.default_folder().to_string(),
            documents: Category::Document.default_folder().to_string(),
            archives: Category::Archive.default_folder().to_string(),
            other: Category::Other.default_folder().to_string(),
        }
    }
}

impl FolderNames {
    /// Folder name for a category
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Image => &self.images,
            Category::Audio => &self.audio,
            Category::Video => &self.video,
            Category::Document => &self.documents,
            Category::Archive => &self.archives,
            Category::Other => &self.other,
        }
    }

    /// Remap a category to another folder name
    pub fn set(&mut self, category: Category, name: impl Into<String>) {
        let slot = match category {
            Category::Image => &mut self.images,
            Category::Audio => &mut self.audio,
            Category::Video => &mut self.video,
            Category::Document => &mut self.documents,
            Category::Archive => &mut self.archives,
            Category::Other => &mut self.other,
        };
        *slot = name.into();
    }

    /// Exact, case-sensitive match against any output folder name
    pub fn is_reserved(&self, name: &str) -> bool {
        Category::ALL.iter().any(|c| self.get(*c) == name)
    }
}

/// Configuration for a sorting run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Root of the output tree
    pub output_dir: PathBuf,
    /// Worker pool size
    pub concurrency: usize,
    /// Scan top-level subfolders in parallel
    pub parallel_scan: bool,
    /// Follow symbolic links while scanning
    pub follow_links: bool,
    /// Category folder names
    pub folder_names: FolderNames,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            parallel_scan: false,
            follow_links: false,
            folder_names: FolderNames::default(),
        }
    }
}

impl SortConfig {
    /// Create a new SortConfig with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: SortConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the worker pool size
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enable/disable parallel scanning
    pub fn with_parallel_scan(mut self, parallel: bool) -> Self {
        self.parallel_scan = parallel;
        self
    }

    /// Enable/disable following symlinks
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Remap a category's output folder
    pub fn with_folder_name(mut self, category: Category, name: impl Into<String>) -> Self {
        self.folder_names.set(category, name);
        self
    }

    /// Destination folder for a category
    pub fn target_dir(&self, category: Category) -> PathBuf {
        self.output_dir.join(self.folder_names.get(category))
    }

    /// Check the config before a run
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SortError::Config("concurrency must be at least 1".to_string()));
        }

        let mut seen = HashSet::new();
        for category in Category::ALL {
            let name = self.folder_names.get(category);
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(SortError::Config(format!(
                    "invalid folder name for {}: {:?}",
                    category, name
                )));
            }
            if !seen.insert(name) {
                return Err(SortError::Config(format!("duplicate folder name: {}", name)));
            }
        }

        Ok(())
    }
}
