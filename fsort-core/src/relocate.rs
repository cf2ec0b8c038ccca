//! Moving files into category folders
//!
//! Destination names are reserved atomically (`create_new` for files,
//! `create_dir` for folders) before anything is moved, so concurrent tasks
//! writing into the same folder never overwrite each other. A taken name
//! gets a numeric suffix: `name.ext`, `name_1.ext`, `name_2.ext`, ...

use crate::normalize::{normalize, split_ext};
use crate::scanner::FileRecord;
use crate::Result;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Upper bound on suffixes tried before giving up on a name
pub const MAX_SUFFIX_ATTEMPTS: usize = 10_000;

/// Counters for one category batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Files moved or archives unpacked
    pub succeeded: usize,
    /// Items left at their original path
    pub failed: usize,
    /// Archives unpacked whose source could not be deleted afterwards
    pub not_deleted: usize,
}

impl std::ops::AddAssign for BatchOutcome {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.not_deleted += other.not_deleted;
    }
}

/// Move every record into `dest` under its normalized name.
///
/// A failure on one file is logged and counted; the rest of the batch
/// still runs.
pub fn relocate<'a, I>(records: I, dest: &Path) -> BatchOutcome
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let records: Vec<&FileRecord> = records.into_iter().collect();
    let mut outcome = BatchOutcome::default();
    if records.is_empty() {
        return outcome;
    }

    if let Err(err) = fs::create_dir_all(dest) {
        tracing::error!("Cannot create {:?}: {}", dest, err);
        outcome.failed = records.len();
        return outcome;
    }

    for record in records {
        let name = normalize(&record.file_name());
        match move_into(&record.path, dest, &name) {
            Ok(target) => {
                tracing::debug!("Moved {:?} -> {:?}", record.path, target);
                outcome.succeeded += 1;
            }
            Err(err) => {
                tracing::error!("Failed to move {:?}: {}", record.path, err);
                outcome.failed += 1;
            }
        }
    }

    tracing::info!(
        "{:?}: {} moved, {} failed",
        dest,
        outcome.succeeded,
        outcome.failed
    );
    outcome
}

/// Move `src` into `dest_dir` as `name` (or a suffixed variant).
/// Returns the final path. On error the source is left where it was.
pub fn move_into(src: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let target = reserve_file(dest_dir, name)?;
    if let Err(err) = transfer(src, &target) {
        let _ = fs::remove_file(&target);
        return Err(err.into());
    }
    Ok(target)
}

/// Claim a free file name in `dir` by creating an empty placeholder.
pub fn reserve_file(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let (stem, ext) = split_ext(name);
    for attempt in 0..MAX_SUFFIX_ATTEMPTS {
        let candidate = dir.join(suffixed(stem, ext, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(exhausted(dir, name))
}

/// Claim a free folder name in `dir` by creating it.
pub fn reserve_dir(dir: &Path, name: &str) -> io::Result<PathBuf> {
    for attempt in 0..MAX_SUFFIX_ATTEMPTS {
        let candidate = dir.join(suffixed(name, "", attempt));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(exhausted(dir, name))
}

fn suffixed(stem: &str, ext: &str, attempt: usize) -> String {
    if attempt == 0 {
        format!("{}{}", stem, ext)
    } else {
        format!("{}_{}{}", stem, attempt, ext)
    }
}

fn exhausted(dir: &Path, name: &str) -> io::Error {
    io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free name for {:?} in {:?}", name, dir),
    )
}

/// Rename `src` over the reserved `target`, falling back to copy + delete
/// across filesystems. Never leaves the file in both places.
fn transfer(src: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(src, target) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device(&err) => {
            fs::copy(src, target)?;
            if let Err(err) = fs::remove_file(src) {
                let _ = fs::remove_file(target);
                return Err(err);
            }
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    const EXDEV: i32 = if cfg!(windows) { 17 } else { 18 };
    err.raw_os_error() == Some(EXDEV)
}
