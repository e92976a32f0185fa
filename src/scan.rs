//! Source directory scanning.
//!
//! Lists the photos in a single flat directory. Subdirectories are not
//! descended into; hidden files (leading `.`) and files whose extension is
//! not in [`SourceFormat::ALL`] are ignored without comment.
//!
//! The result is sorted by file name, byte-wise, which is the order the
//! manifest and both interactive workflows use.
//!
//! An entry that cannot be stat'ed, such as a dangling symlink, is logged
//! and skipped. Only a failure to list the directory itself is an error.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("source directory not found: {0}")]
    NotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to list directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Input formats the pipeline recognizes, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Heic,
    Dng,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 5] = [
        SourceFormat::Jpeg,
        SourceFormat::Png,
        SourceFormat::WebP,
        SourceFormat::Heic,
        SourceFormat::Dng,
    ];

    /// Lowercase extensions for this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SourceFormat::Jpeg => &["jpg", "jpeg"],
            SourceFormat::Png => &["png"],
            SourceFormat::WebP => &["webp"],
            SourceFormat::Heic => &["heic"],
            SourceFormat::Dng => &["dng"],
        }
    }

    /// Case-insensitive lookup.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A recognized photo in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name including extension, as found on disk.
    pub file_name: String,
    /// File name without its final extension.
    pub stem: String,
    /// Final extension as found on disk, without the dot (`"JPG"` stays `"JPG"`).
    pub extension: String,
    pub format: SourceFormat,
}

impl SourceFile {
    /// Build from a path, returning `None` for unrecognized or unnamed files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let format = SourceFormat::from_path(path)?;
        Some(Self {
            path: path.to_path_buf(),
            file_name: path.file_name()?.to_string_lossy().into_owned(),
            stem: path.file_stem()?.to_string_lossy().into_owned(),
            extension: path.extension()?.to_string_lossy().into_owned(),
            format,
        })
    }
}

/// List recognized photos directly inside `dir`, sorted by file name.
pub fn scan_sources(dir: &Path) -> Result<Vec<SourceFile>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself failed to list.
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() || is_hidden(entry.file_name()) {
            continue;
        }
        match SourceFile::from_path(entry.path()) {
            Some(source) => sources.push(source),
            None => tracing::trace!("ignoring {}", entry.path().display()),
        }
    }
    Ok(sources)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
