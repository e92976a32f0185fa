//! Caption writing.
//!
//! A caption is stored twice, identically: in `ImageDescription` (IFD0) and in
//! `UserComment` (Exif IFD), so that whichever tag a reader prefers, it finds
//! the same text.
//!
//! | exiftool | Format | Path |
//! |---|---|---|
//! | installed | any | `exiftool -overwrite_original -ImageDescription=… -UserComment=…` |
//! | missing | JPEG, PNG, WebP | in-process via `little_exif` |
//! | missing | HEIC, DNG | [`MetadataWriteError::Unsupported`] |
//!
//! Whether exiftool is installed is decided once, by
//! [`ExifToolCapability::detect`], not per file.

use crate::metadata::tags::{USER_COMMENT_ASCII, USER_COMMENT_UNICODE};
use crate::scan::SourceFormat;
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataWriteError {
    #[error("exiftool failed ({status}): {stderr}")]
    ToolFailed { status: String, stderr: String },
    #[error("cannot write captions into {0} files without exiftool (install exiftool)")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("EXIF write failed: {0}")]
    Exif(String),
}

/// Where captions go. The ingest workflow only sees this trait.
pub trait CaptionSink {
    fn write_caption(&self, path: &Path, caption: &str) -> Result<(), MetadataWriteError>;
}

/// A runnable exiftool binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifTool {
    program: PathBuf,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `program -ver`; `Some` when it starts and exits successfully.
    pub fn probe(program: impl Into<PathBuf>) -> Option<Self> {
        let tool = Self::new(program);
        let output = Command::new(&tool.program).arg("-ver").output().ok()?;
        if !output.status.success() {
            return None;
        }
        tracing::debug!(
            "found {} version {}",
            tool.program.display(),
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Some(tool)
    }

    fn write_caption(&self, path: &Path, caption: &str) -> Result<(), MetadataWriteError> {
        let output = Command::new(&self.program)
            .args(caption_args(path, caption))
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(MetadataWriteError::ToolFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// exiftool arguments that set both caption tags in place.
pub fn caption_args(path: &Path, caption: &str) -> Vec<OsString> {
    vec![
        "-overwrite_original".into(),
        format!("-ImageDescription={caption}").into(),
        format!("-UserComment={caption}").into(),
        path.as_os_str().to_owned(),
    ]
}

/// Whether exiftool can be used, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExifToolCapability {
    Available(ExifTool),
    Unavailable,
}

impl ExifToolCapability {
    /// Look for `exiftool` on `PATH`.
    pub fn detect() -> Self {
        Self::detect_program("exiftool")
    }

    pub fn detect_program(program: &str) -> Self {
        match ExifTool::probe(program) {
            Some(tool) => ExifToolCapability::Available(tool),
            None => ExifToolCapability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ExifToolCapability::Available(_))
    }
}

/// The production [`CaptionSink`].
#[derive(Debug, Clone)]
pub struct CaptionWriter {
    capability: ExifToolCapability,
}

impl CaptionWriter {
    pub fn new(capability: ExifToolCapability) -> Self {
        Self { capability }
    }
}

impl CaptionSink for CaptionWriter {
    fn write_caption(&self, path: &Path, caption: &str) -> Result<(), MetadataWriteError> {
        match &self.capability {
            ExifToolCapability::Available(tool) => tool.write_caption(path, caption),
            ExifToolCapability::Unavailable => match SourceFormat::from_path(path) {
                Some(SourceFormat::Jpeg | SourceFormat::Png | SourceFormat::WebP) => {
                    write_with_little_exif(path, caption)
                }
                _ => Err(MetadataWriteError::Unsupported(
                    path.extension()
                        .map(|e| e.to_string_lossy().to_uppercase())
                        .unwrap_or_else(|| "extensionless".to_string()),
                )),
            },
        }
    }
}

/// UserComment payload: ASCII when possible, otherwise UTF-16LE behind a BOM.
pub fn user_comment_payload(caption: &str) -> Vec<u8> {
    if caption.is_ascii() {
        let mut payload = USER_COMMENT_ASCII.to_vec();
        payload.extend_from_slice(caption.as_bytes());
        payload
    } else {
        let mut payload = USER_COMMENT_UNICODE.to_vec();
        payload.extend_from_slice(&[0xFF, 0xFE]);
        payload.extend(caption.encode_utf16().flat_map(u16::to_le_bytes));
        payload
    }
}

/// Rewrite the EXIF block in place with `little_exif`.
///
/// little_exif can panic on files it does not fully understand, and writing
/// into a file without an existing EXIF block is unreliable, so both cases
/// are reported as errors instead.
fn write_with_little_exif(path: &Path, caption: &str) -> Result<(), MetadataWriteError> {
    if !has_exif_block(path)? {
        return Err(MetadataWriteError::Exif(format!(
            "{} has no EXIF block to update",
            path.display()
        )));
    }
    let loaded = panic::catch_unwind(|| Metadata::new_from_path(path))
        .map_err(|_| MetadataWriteError::Exif(format!("could not parse {}", path.display())))?;
    let mut metadata = loaded.map_err(|e| {
        MetadataWriteError::Exif(format!("no readable EXIF in {}: {e}", path.display()))
    })?;

    metadata.set_tag(ExifTag::ImageDescription(caption.to_string()));
    metadata.set_tag(ExifTag::UserComment(user_comment_payload(caption)));

    panic::catch_unwind(AssertUnwindSafe(|| metadata.write_to_file(path)))
        .map_err(|_| MetadataWriteError::Exif(format!("could not write {}", path.display())))?
        .map_err(|e| MetadataWriteError::Exif(format!("{}: {e}", path.display())))
}

fn has_exif_block(path: &Path) -> Result<bool, MetadataWriteError> {
    let mut reader = BufReader::new(File::open(path)?);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(_) => Ok(true),
        Err(exif::Error::NotFound(_)) => Ok(false),
        Err(exif::Error::Io(e)) => Err(e.into()),
        Err(e) => Err(MetadataWriteError::Exif(format!("{}: {e}", path.display()))),
    }
}
