use super::state::ScanState;
use crate::config::{FolderNames, SortConfig};
use crate::{Result, SortError};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Files recorded
    pub files: usize,
    /// Subfolders recorded
    pub folders: usize,
    /// Entries skipped because they could not be read
    pub skipped: usize,
    /// Symlinks and other non-regular entries left alone
    pub links: usize,
}

impl std::ops::AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.folders += other.folders;
        self.skipped += other.skipped;
        self.links += other.links;
    }
}

/// Recursive directory scanner.
///
/// Never descends into reserved output folders or into the output root itself.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    reserved: FolderNames,
    follow_links: bool,
    output_dir: Option<PathBuf>,
}

impl TreeScanner {
    /// Scanner with the given reserved folder names
    pub fn new(reserved: FolderNames) -> Self {
        Self {
            reserved,
            follow_links: false,
            output_dir: None,
        }
    }

    /// Scanner matching a sort configuration
    pub fn from_config(config: &SortConfig) -> Self {
        Self::new(config.folder_names.clone())
            .with_follow_links(config.follow_links)
            .with_output_dir(config.output_dir.clone())
    }

    /// Follow symbolic links (symlinks are skipped otherwise)
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Never descend into this directory, wherever it appears in the tree
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    /// Walk `root` depth-first in file-name order, recording into `state`.
    pub fn scan(&self, root: &Path, state: &mut ScanState) -> Result<ScanStats> {
        let excluded = self.prepare(root)?;
        let mut stats = ScanStats::default();
        self.walk_into(root, 1, excluded.as_deref(), state, &mut stats);

        tracing::info!(
            "Scanned {:?}: {} files, {} folders, {} skipped, {} links",
            root,
            stats.files,
            stats.folders,
            stats.skipped,
            stats.links
        );
        Ok(stats)
    }

    /// Like [`scan`](Self::scan), but each top-level entry is walked as its
    /// own task on the current rayon pool. The task-local states are merged
    /// in file-name order, so the result matches a serial scan.
    pub fn scan_parallel(&self, root: &Path, state: &mut ScanState) -> Result<ScanStats> {
        let excluded = self.prepare(root)?;
        let mut stats = ScanStats::default();

        let mut children: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(root)? {
            match entry {
                Ok(entry) => children.push(entry.path()),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", root, err);
                    stats.skipped += 1;
                }
            }
        }
        children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let partials: Vec<(ScanState, ScanStats)> = children
            .par_iter()
            .map(|child| {
                let mut local = ScanState::new();
                let mut local_stats = ScanStats::default();
                self.walk_into(child, 0, excluded.as_deref(), &mut local, &mut local_stats);
                (local, local_stats)
            })
            .collect();

        for (local, local_stats) in partials {
            state.merge(local);
            stats += local_stats;
        }

        tracing::info!(
            "Scanned {:?} in parallel: {} files, {} folders, {} skipped, {} links",
            root,
            stats.files,
            stats.folders,
            stats.skipped,
            stats.links
        );
        Ok(stats)
    }

    /// Check the root and resolve the output dir to a path in the walk's own
    /// path space, if it lies inside the root.
    fn prepare(&self, root: &Path) -> Result<Option<PathBuf>> {
        if !root.is_dir() {
            return Err(SortError::NotADirectory(root.to_path_buf()));
        }
        fs::read_dir(root)?;

        let Some(output) = &self.output_dir else {
            return Ok(None);
        };
        let (Ok(root_canon), Ok(output_canon)) = (root.canonicalize(), output.canonicalize()) else {
            return Ok(None);
        };
        Ok(output_canon
            .strip_prefix(&root_canon)
            .ok()
            .map(|rel| root.join(rel)))
    }

    fn walk_into(
        &self,
        start: &Path,
        min_depth: usize,
        excluded: Option<&Path>,
        state: &mut ScanState,
        stats: &mut ScanStats,
    ) {
        let walker = WalkDir::new(start)
            .min_depth(min_depth)
            .follow_links(self.follow_links)
            .follow_root_links(self.follow_links || min_depth > 0)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry, excluded));

        for entry in walker {
            match entry {
                Ok(entry) => self.visit(entry, state, stats),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    stats.skipped += 1;
                }
            }
        }
    }

    fn is_excluded(&self, entry: &DirEntry, excluded: Option<&Path>) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.reserved.is_reserved(&name) {
            tracing::debug!("Not descending into output folder {:?}", entry.path());
            return true;
        }
        excluded.is_some_and(|dir| entry.path() == dir)
    }

    fn visit(&self, entry: DirEntry, state: &mut ScanState, stats: &mut ScanStats) {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            if state.add_folder(entry.into_path()) {
                stats.folders += 1;
            }
        } else if file_type.is_file() {
            if state.add_file(entry.into_path()) {
                stats.files += 1;
            }
        } else {
            tracing::debug!("Skipping non-regular entry {:?}", entry.path());
            stats.links += 1;
        }
    }
}
