//! Archive unpacking
//!
//! Supported formats:
//! ```text
//! .zip            zip (entries escaping the target are rejected)
//! .tar            plain tar
//! .tar.gz         gzip-compressed tar
//! .gz             single gzip stream, decompressed to one file
//! ```
//!
//! Only files the classifier puts under archives reach this module. `.tgz`
//! is not one of them and is sorted into the other folder as a plain file.
//!
//! Each archive is unpacked into its own folder named after the normalized
//! stem. A failed unpack removes that folder and keeps the archive; a
//! successful one deletes the archive.

use crate::normalize::{archive_stem, normalize, normalize_stem};
use crate::relocate::{reserve_dir, BatchOutcome};
use crate::scanner::FileRecord;
use crate::{Result, SortError};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// Folder name used when an archive stem normalizes to nothing
const FALLBACK_FOLDER: &str = "archive";

/// Archive container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    Gzip,
}

impl ArchiveFormat {
    /// Detect the format from the file name
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".tar.gz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".gz") {
            Some(ArchiveFormat::Gzip)
        } else {
            None
        }
    }
}

/// Unpack every archive record into its own folder under `dest`.
pub fn unpack<'a, I>(records: I, dest: &Path) -> BatchOutcome
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    unpack_with(records, dest, |path| fs::remove_file(path))
}

/// [`unpack`] with the source deletion step supplied by the caller.
fn unpack_with<'a, I, D>(records: I, dest: &Path, delete: D) -> BatchOutcome
where
    I: IntoIterator<Item = &'a FileRecord>,
    D: Fn(&Path) -> io::Result<()>,
{
    let mut outcome = BatchOutcome::default();

    for record in records {
        let folder = match prepare_folder(record, dest) {
            Ok(folder) => folder,
            Err(err) => {
                tracing::error!("Cannot prepare folder for {:?}: {}", record.path, err);
                outcome.failed += 1;
                continue;
            }
        };

        match extract(&record.path, &folder) {
            Ok(()) => {
                tracing::debug!("Unpacked {:?} -> {:?}", record.path, folder);
                outcome.succeeded += 1;
                if let Err(err) = delete(&record.path) {
                    tracing::error!("Unpacked {:?} but could not delete it: {}", record.path, err);
                    outcome.not_deleted += 1;
                }
            }
            Err(err) => {
                tracing::error!("Failed to unpack {:?}: {}", record.path, err);
                outcome.failed += 1;
                if let Err(err) = fs::remove_dir_all(&folder) {
                    tracing::error!("Could not remove {:?}: {}", folder, err);
                }
            }
        }
    }

    if outcome != BatchOutcome::default() {
        tracing::info!(
            "{:?}: {} unpacked, {} failed",
            dest,
            outcome.succeeded,
            outcome.failed
        );
    }
    outcome
}

fn prepare_folder(record: &FileRecord, dest: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dest)?;
    let mut name = normalize_stem(&record.file_name());
    if name.is_empty() {
        name = FALLBACK_FOLDER.to_string();
    }
    reserve_dir(dest, &name)
}

/// Extract `archive` into the existing folder `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let format = ArchiveFormat::detect(archive)
        .ok_or_else(|| SortError::UnsupportedArchive(archive.to_path_buf()))?;

    // tar reads an empty stream as an empty archive
    if fs::metadata(archive)?.len() == 0 {
        return Err(SortError::CorruptArchive {
            path: archive.to_path_buf(),
            reason: "empty file".to_string(),
        });
    }

    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::Tar => extract_tar(File::open(archive)?, archive, dest),
        ArchiveFormat::TarGz => extract_tar(GzDecoder::new(File::open(archive)?), archive, dest),
        ArchiveFormat::Gzip => extract_gzip(archive, dest),
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file).map_err(|e| zip_error(archive, e))?;
    zip.extract(dest).map_err(|e| zip_error(archive, e))
}

fn extract_tar<R: Read>(reader: R, archive: &Path, dest: &Path) -> Result<()> {
    let mut tar = tar::Archive::new(reader);
    tar.unpack(dest).map_err(|e| stream_error(archive, e))
}

fn extract_gzip(archive: &Path, dest: &Path) -> Result<()> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let inner = normalize(archive_stem(&name));
    let inner = if inner.is_empty() { FALLBACK_FOLDER.to_string() } else { inner };

    let mut decoder = GzDecoder::new(File::open(archive)?);
    let mut out = File::create(dest.join(inner))?;
    io::copy(&mut decoder, &mut out).map_err(|e| stream_error(archive, e))?;
    Ok(())
}

fn zip_error(archive: &Path, err: ZipError) -> SortError {
    match err {
        ZipError::Io(e) => SortError::Io(e),
        ZipError::InvalidArchive(_) => SortError::CorruptArchive {
            path: archive.to_path_buf(),
            reason: err.to_string(),
        },
        ZipError::UnsupportedArchive(_) => SortError::UnsupportedArchive(archive.to_path_buf()),
        other => SortError::Zip(other),
    }
}

/// Decoder and tar errors arrive as `io::Error`; anything that is not a
/// plain filesystem failure means the data itself is bad.
fn stream_error(archive: &Path, err: io::Error) -> SortError {
    match err.kind() {
        ErrorKind::NotFound
        | ErrorKind::PermissionDenied
        | ErrorKind::AlreadyExists
        | ErrorKind::Interrupted
        | ErrorKind::OutOfMemory => SortError::Io(err),
        _ => SortError::CorruptArchive {
            path: archive.to_path_buf(),
            reason: err.to_string(),
        },
    }
}
