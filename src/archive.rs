//! Tarball extraction.
//!
//! Repository tarballs wrap every entry in a generated top-level directory
//! (`<owner>-<repo>-<sha>/`). [`extract_archive`] strips that directory so
//! the destination holds the repository root directly.
//!
//! The destination is removed before extraction starts. A failure part-way
//! leaves whatever was written so far.

use crate::error::{DepsError, DepsResult};
use flate2::read::GzDecoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub dirs: usize,
    pub skipped: usize,
}

impl ExtractStats {
    /// Nothing was written under the destination.
    pub fn is_empty(&self) -> bool {
        self.files == 0 && self.dirs == 0
    }
}

/// Extract a gzip-compressed tar stream into `dest`, replacing its contents.
pub fn extract_archive<R: Read>(stream: R, dest: &Path) -> DepsResult<ExtractStats> {
    match fs::remove_dir_all(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(DepsError::storage(dest, e)),
    }
    fs::create_dir_all(dest).map_err(|e| DepsError::storage(dest, e))?;

    let mut archive = tar::Archive::new(GzDecoder::new(stream));
    let entries = archive.entries().map_err(format_error)?;

    let mut wrapper: Option<String> = None;
    let mut stats = ExtractStats::default();

    for entry in entries {
        let mut entry = entry.map_err(format_error)?;
        let kind = entry.header().entry_type();
        if matches!(kind, EntryType::XGlobalHeader | EntryType::XHeader) {
            stats.skipped += 1;
            continue;
        }

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if wrapper.is_none() {
            wrapper = detect_wrapper(&name);
        }
        let Some(prefix) = wrapper.as_deref() else {
            tracing::debug!(%name, "skipping entry before wrapper directory");
            stats.skipped += 1;
            continue;
        };
        let Some(relative) = name.strip_prefix(prefix) else {
            if name == prefix.trim_end_matches('/') {
                continue;
            }
            tracing::debug!(%name, "skipping entry outside wrapper directory");
            stats.skipped += 1;
            continue;
        };
        let relative = relative.trim_end_matches('/');
        if relative.is_empty() {
            continue;
        }

        let target = dest.join(safe_relative(relative)?);
        let mode = entry.header().mode().map_err(format_error)?;

        match kind {
            EntryType::Directory => {
                create_dir(&target, mode)?;
                stats.dirs += 1;
            }
            EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| DepsError::storage(parent, e))?;
                }
                let mut file = create_file(&target, mode)?;
                copy_entry(&mut entry, &mut file, &target)?;
                stats.files += 1;
            }
            other => {
                tracing::debug!(%name, kind = ?other, "skipping unsupported entry type");
                stats.skipped += 1;
            }
        }
    }

    tracing::debug!(
        dest = %dest.display(),
        files = stats.files,
        dirs = stats.dirs,
        skipped = stats.skipped,
        "archive extracted"
    );
    Ok(stats)
}

/// `owner-repo-sha/...` → `Some("owner-repo-sha/")`.
fn detect_wrapper(name: &str) -> Option<String> {
    let (first, _) = name.split_once('/')?;
    first.contains('-').then(|| format!("{first}/"))
}

fn safe_relative(relative: &str) -> DepsResult<PathBuf> {
    let path = Path::new(relative);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(DepsError::ArchiveFormat(format!(
                    "entry escapes destination: {relative}"
                )));
            }
        }
    }
    Ok(clean)
}

fn copy_entry(entry: &mut impl Read, file: &mut File, target: &Path) -> DepsResult<()> {
    let mut buffer = [0u8; 8192];
    loop {
        let n = entry.read(&mut buffer).map_err(format_error)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| DepsError::storage(target, e))?;
    }
    Ok(())
}

fn format_error(e: io::Error) -> DepsError {
    DepsError::ArchiveFormat(e.to_string())
}

/// The mode is set explicitly as well: a file entry listed earlier may have
/// created the directory already.
#[cfg(unix)]
fn create_dir(path: &Path, mode: u32) -> DepsResult<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode & 0o7777)
        .create(path)
        .and_then(|_| fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)))
        .map_err(|e| DepsError::storage(path, e))
}

#[cfg(not(unix))]
fn create_dir(path: &Path, _mode: u32) -> DepsResult<()> {
    fs::create_dir_all(path).map_err(|e| DepsError::storage(path, e))
}

#[cfg(unix)]
fn create_file(path: &Path, mode: u32) -> DepsResult<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode & 0o7777)
        .open(path)
        .map_err(|e| DepsError::storage(path, e))
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: u32) -> DepsResult<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| DepsError::storage(path, e))
}
