//! Interactive caption backfill.
//!
//! Walks the source directory in sorted order, shows each photo's capture date
//! and position, and asks the operator for a caption. Photos that already carry
//! a caption are passed over without a prompt, so an interrupted session can be
//! rerun and picks up where it stopped.
//!
//! ```text
//! [3/12] IMG_0042.HEIC
//!   Date: 2023:06:14 18:22:05
//!   GPS:  36.461667, 25.375833
//!   Enter New Caption (Press Enter to keep/skip): Sunset at Oia
//!   ✓ Saved caption to EXIF
//! ```
//!
//! The terminal is reached only through [`Prompt`]; progress is reported
//! through a callback so the caller decides how to print it. A callback rather
//! than a channel keeps the report lines ordered with respect to the prompt.

use crate::imaging::ImageBackend;
use crate::interact::Prompt;
use crate::metadata::{GeoCoordinate, PhotoMetadata};
use crate::scan::{ScanError, SourceFile, scan_sources};
use crate::writer::CaptionSink;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Question asked for every photo without a caption.
pub const CAPTION_QUESTION: &str = "  Enter New Caption (Press Enter to keep/skip): ";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("failed to read operator input: {0}")]
    Prompt(#[from] std::io::Error),
}

/// What happened to one photo.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Already captioned; the existing caption is carried for display.
    SkippedHasCaption(String),
    /// Operator pressed Enter.
    Kept,
    Captioned(String),
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestEntry {
    /// 1-based position in the sorted file list.
    pub index: usize,
    pub file_name: String,
    pub outcome: IngestOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    Started {
        total: usize,
    },
    /// Emitted before the prompt for a photo.
    Showing {
        index: usize,
        total: usize,
        file_name: String,
        capture_date: Option<String>,
        coordinate: Option<GeoCoordinate>,
        read_error: Option<String>,
    },
    Finished(IngestEntry),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub total: usize,
    pub entries: Vec<IngestEntry>,
    /// Operator input ended before every photo was seen.
    pub stopped_early: bool,
}

impl IngestReport {
    fn count(&self, pred: impl Fn(&IngestOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }

    pub fn captioned(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Captioned(_)))
    }

    pub fn already_captioned(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::SkippedHasCaption(_)))
    }

    pub fn kept(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Kept))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::WriteFailed(_)))
    }
}

/// Run the caption workflow over `source_dir`.
///
/// Errors only for a missing or unreadable directory, or when operator input
/// itself fails. Metadata and write failures are per-file outcomes.
pub fn ingest(
    backend: &impl ImageBackend,
    sink: &impl CaptionSink,
    prompt: &mut impl Prompt,
    source_dir: &Path,
    mut on_event: impl FnMut(&IngestEvent),
) -> Result<IngestReport, IngestError> {
    if !source_dir.exists() {
        return Err(IngestError::SourceNotFound(source_dir.to_path_buf()));
    }
    let sources = scan_sources(source_dir)?;
    let total = sources.len();
    on_event(&IngestEvent::Started { total });

    let mut report = IngestReport {
        total,
        ..IngestReport::default()
    };

    for (i, source) in sources.iter().enumerate() {
        let index = i + 1;
        let (metadata, read_error) = read_photo_metadata(backend, source);

        on_event(&IngestEvent::Showing {
            index,
            total,
            file_name: source.file_name.clone(),
            capture_date: metadata.capture_date.clone(),
            coordinate: metadata.coordinate,
            read_error,
        });

        let outcome = match metadata.caption {
            Some(existing) => {
                tracing::debug!("{}: already captioned", source.file_name);
                IngestOutcome::SkippedHasCaption(existing)
            }
            None => match prompt.ask(CAPTION_QUESTION)? {
                Some(answer) => apply_answer(sink, source, answer.trim()),
                None => {
                    tracing::info!("input closed, stopping at {}", source.file_name);
                    report.stopped_early = true;
                    break;
                }
            },
        };

        let entry = IngestEntry {
            index,
            file_name: source.file_name.clone(),
            outcome,
        };
        on_event(&IngestEvent::Finished(entry.clone()));
        report.entries.push(entry);
    }

    tracing::info!(
        "ingest: {} captioned, {} already captioned, {} kept, {} failed",
        report.captioned(),
        report.already_captioned(),
        report.kept(),
        report.failed()
    );
    Ok(report)
}

/// Unreadable metadata still lets the operator tag the file.
fn read_photo_metadata(
    backend: &impl ImageBackend,
    source: &SourceFile,
) -> (PhotoMetadata, Option<String>) {
    match backend.read_exif(&source.path) {
        Ok(container) => (PhotoMetadata::from_container(container.as_ref()), None),
        Err(e) => {
            tracing::warn!("{}: could not read metadata: {e}", source.file_name);
            (PhotoMetadata::default(), Some(e.to_string()))
        }
    }
}

fn apply_answer(sink: &impl CaptionSink, source: &SourceFile, caption: &str) -> IngestOutcome {
    if caption.is_empty() {
        return IngestOutcome::Kept;
    }
    match sink.write_caption(&source.path, caption) {
        Ok(()) => IngestOutcome::Captioned(caption.to_string()),
        Err(e) => {
            tracing::warn!("{}: caption not saved: {e}", source.file_name);
            IngestOutcome::WriteFailed(e.to_string())
        }
    }
}
