//! Batch processing: source photos to map-ready images and `data.json`.
//!
//! For every recognized file in the source directory, in sorted file-name
//! order:
//!
//! 1. Decode the header. Unreadable files are reported as failed.
//! 2. Read EXIF and extract position, date and caption.
//! 3. Files without a position are skipped; they never reach the manifest.
//! 4. Render `{stem}_thumb.jpg` and `{stem}_large.jpg` from one decode.
//! 5. Record a [`PhotoRecord`] pointing at both images.
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── data.json                # Manifest, sorted by source file name
//! └── photos/
//!     ├── IMG_0001_thumb.jpg   # fits 300x300, quality 80
//!     └── IMG_0001_large.jpg   # fits 1600x1600, quality 85
//! ```
//!
//! Rerunning over the same input overwrites the same files with the same
//! content and writes an identical manifest.
//!
//! ## Parallel Processing
//!
//! Files are processed on the rayon pool. Results are collected through an
//! indexed parallel iterator, so manifest order is the sorted input order no
//! matter which worker finishes first. Progress events are sent as each file
//! completes and may therefore arrive out of order.

use crate::config::{AtlasConfig, ManifestConfig};
use crate::imaging::{
    BackendError, GeneratedVariant, ImageBackend, RustBackend, VariantKind, VariantSet,
    create_variants, get_dimensions,
};
use crate::metadata::PhotoMetadata;
use crate::scan::{ScanError, SourceFile, scan_sources};
use crate::types::{Manifest, PhotoRecord};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Directory under the public root that receives the rendered images.
pub const PHOTOS_DIR: &str = "photos";
/// Manifest file name under the public root.
pub const MANIFEST_FILE: &str = "data.json";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Configuration for image processing
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessConfig {
    pub variants: VariantSet,
    pub manifest: ManifestConfig,
}

impl ProcessConfig {
    pub fn from_config(config: &AtlasConfig) -> Self {
        Self {
            variants: config.variants(),
            manifest: config.manifest.clone(),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_config(&AtlasConfig::default())
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Processed {
        record: PhotoRecord,
        variants: Vec<GeneratedVariant>,
    },
    SkippedNoGps,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// 1-based position in the sorted input.
    pub index: usize,
    pub file_name: String,
    pub outcome: ProcessOutcome,
}

/// Progress events, sent while processing runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Started { total: usize },
    File(FileReport),
}

/// Result of a processing run.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    /// One entry per recognized source file, in sorted order.
    pub files: Vec<FileReport>,
    pub manifest: Manifest,
}

impl ProcessReport {
    fn count(&self, pred: impl Fn(&ProcessOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn processed(&self) -> usize {
        self.manifest.len()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ProcessOutcome::SkippedNoGps))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ProcessOutcome::Failed(_)))
    }
}

/// Process `source_dir` into `public_dir/photos` and `public_dir/data.json`.
pub fn process(
    source_dir: &Path,
    public_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, source_dir, public_dir, config, progress)
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    source_dir: &Path,
    public_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let report = process_directory(
        backend,
        source_dir,
        &public_dir.join(PHOTOS_DIR),
        config,
        progress,
    )?;
    write_manifest(&public_dir.join(MANIFEST_FILE), &report.manifest)?;
    Ok(report)
}

/// Render every geotagged photo in `source_dir` into `output_dir`.
///
/// Only a missing source directory (or one that cannot be listed) is an
/// error; per-file problems are reported in [`ProcessReport::files`].
pub fn process_directory(
    backend: &impl ImageBackend,
    source_dir: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    if !source_dir.is_dir() {
        return Err(ProcessError::SourceNotFound(source_dir.to_path_buf()));
    }
    let sources = scan_sources(source_dir)?;
    std::fs::create_dir_all(output_dir)?;

    if let Some(tx) = &progress {
        tx.send(ProcessEvent::Started {
            total: sources.len(),
        })
        .ok();
    }

    let files: Vec<FileReport> = sources
        .par_iter()
        .enumerate()
        .map_with(progress, |progress, (i, source)| {
            let report = FileReport {
                index: i + 1,
                file_name: source.file_name.clone(),
                outcome: process_file(backend, source, output_dir, config),
            };
            if let Some(tx) = progress {
                tx.send(ProcessEvent::File(report.clone())).ok();
            }
            report
        })
        .collect();

    let manifest: Manifest = files
        .iter()
        .filter_map(|f| match &f.outcome {
            ProcessOutcome::Processed { record, .. } => Some(record.clone()),
            _ => None,
        })
        .collect();

    let report = ProcessReport { files, manifest };
    tracing::info!(
        "processed {} photos ({} without GPS, {} failed)",
        report.processed(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

fn process_file(
    backend: &impl ImageBackend,
    source: &SourceFile,
    output_dir: &Path,
    config: &ProcessConfig,
) -> ProcessOutcome {
    match try_process_file(backend, source, output_dir, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("{}: {e}", source.file_name);
            ProcessOutcome::Failed(e.to_string())
        }
    }
}

fn try_process_file(
    backend: &impl ImageBackend,
    source: &SourceFile,
    output_dir: &Path,
    config: &ProcessConfig,
) -> Result<ProcessOutcome, BackendError> {
    get_dimensions(backend, &source.path)?;

    let container = backend.read_exif(&source.path).unwrap_or_else(|e| {
        tracing::debug!("{}: treating unreadable EXIF as absent: {e}", source.file_name);
        None
    });
    let metadata = PhotoMetadata::from_container(container.as_ref());
    let Some(coordinate) = metadata.coordinate else {
        tracing::debug!("{}: no GPS position, skipping", source.file_name);
        return Ok(ProcessOutcome::SkippedNoGps);
    };

    let variants = create_variants(
        backend,
        &source.path,
        output_dir,
        &source.stem,
        &config.variants,
    )?;
    let url = |kind: VariantKind| config.manifest.url_for(&kind.file_name(&source.stem));

    let record = PhotoRecord {
        id: source.stem.clone(),
        lat: coordinate.latitude,
        lng: coordinate.longitude,
        thumb: url(VariantKind::Thumbnail),
        large: url(VariantKind::Large),
        original_name: source.file_name.clone(),
        caption: metadata.caption.unwrap_or_default(),
    };
    Ok(ProcessOutcome::Processed { record, variants })
}

/// Write the manifest as 2-space indented JSON.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so readers never see a truncated manifest.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), ProcessError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
