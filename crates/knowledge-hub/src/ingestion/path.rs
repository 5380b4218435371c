//! Input path classification and collection naming

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What an input path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Invalid,
}

/// Classify a path by filesystem type
pub fn classify(path: &Path) -> PathKind {
    if path.is_file() {
        PathKind::File
    } else if path.is_dir() {
        PathKind::Directory
    } else {
        PathKind::Invalid
    }
}

/// Replace every run of two or more dots and every space with `_`
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' => out.push('_'),
            '.' if chars.peek() == Some(&'.') => {
                while chars.peek() == Some(&'.') {
                    chars.next();
                }
                out.push('_');
            }
            other => out.push(other),
        }
    }
    out
}

/// Derive the collection name for an input path.
///
/// Files use their name without extension, directories their own name.
/// Paths such as `.` or `dir/..` are canonicalized first. A filesystem
/// root has no name and yields an empty string.
pub fn collection_name_for(path: &Path) -> String {
    let resolved = match path.file_name() {
        Some(_) => path.to_path_buf(),
        None => path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
    };
    let segment = match classify(&resolved) {
        PathKind::File => resolved.file_stem(),
        _ => resolved.file_name(),
    };
    sanitize(&segment.map(|s| s.to_string_lossy()).unwrap_or_default())
}

/// Lowercased extension of a path, empty when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// File name without extension
pub fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files found under a directory, split by loader support
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub supported: Vec<PathBuf>,
    pub unsupported: Vec<PathBuf>,
}

/// Walk a directory recursively, partitioning regular files by whether
/// `is_supported` accepts their lowercased extension. Both lists are sorted.
pub fn scan_directory(directory: &Path, is_supported: impl Fn(&str) -> bool) -> DirectoryScan {
    let mut scan = DirectoryScan::default();

    for entry in WalkDir::new(directory)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", directory.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
    {
        let path = entry.into_path();
        if is_supported(&extension_of(&path)) {
            scan.supported.push(path);
        } else {
            scan.unsupported.push(path);
        }
    }

    scan.supported.sort();
    scan.unsupported.sort();
    scan
}

/// Recursively list the files under `directory` with a supported extension
pub fn enumerate_files(directory: &Path, is_supported: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    scan_directory(directory, is_supported).supported
}
