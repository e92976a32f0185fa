//! Interactive renaming of camera files to `region-landmark` names.
//!
//! Only JPEG and PNG files are offered. Each one is previewed inline, then the
//! operator types a name, presses Enter to skip, or `q` to quit. Names are
//! normalized by [`sanitize`] and the original extension is kept as-is.
//! Existing files are never overwritten.

use crate::interact::{Preview, Prompt};
use crate::scan::{ScanError, SourceFile, SourceFormat, scan_sources};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RENAME_QUESTION: &str = "\nregion-landmark (ENTER skip, q quit): ";

const QUIT: &str = "q";

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("directory not found: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("failed to read operator input: {0}")]
    Prompt(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenameOutcome {
    /// New file name.
    Renamed(String),
    Skipped,
    /// A file with the requested name already exists.
    TargetExists(String),
    /// The answer sanitized to something that is not a plain file name.
    InvalidName(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameEntry {
    pub index: usize,
    pub file_name: String,
    pub outcome: RenameOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenameEvent {
    /// Emitted before the preview is drawn.
    Showing {
        index: usize,
        total: usize,
        file_name: String,
    },
    Finished(RenameEntry),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameReport {
    pub total: usize,
    pub entries: Vec<RenameEntry>,
    /// The operator quit or input ended before the last file.
    pub stopped_early: bool,
}

impl RenameReport {
    pub fn renamed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, RenameOutcome::Renamed(_)))
            .count()
    }
}

/// Trim, lowercase, and turn spaces into dashes.
///
/// ```
/// assert_eq!(travel_atlas::rename::sanitize("  Kyoto Fushimi Inari "), "kyoto-fushimi-inari");
/// ```
pub fn sanitize(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn is_renamable(source: &SourceFile) -> bool {
    matches!(source.format, SourceFormat::Jpeg | SourceFormat::Png)
}

/// Run the rename session over `dir`.
pub fn rename_interactive(
    dir: &Path,
    prompt: &mut impl Prompt,
    preview: &mut impl Preview,
    mut on_event: impl FnMut(&RenameEvent),
) -> Result<RenameReport, RenameError> {
    if !dir.exists() {
        return Err(RenameError::NotFound(dir.to_path_buf()));
    }
    let photos: Vec<SourceFile> = scan_sources(dir)?
        .into_iter()
        .filter(is_renamable)
        .collect();

    let mut report = RenameReport {
        total: photos.len(),
        ..RenameReport::default()
    };

    for (i, photo) in photos.iter().enumerate() {
        let index = i + 1;
        on_event(&RenameEvent::Showing {
            index,
            total: report.total,
            file_name: photo.file_name.clone(),
        });
        if let Err(e) = preview.show(&photo.path) {
            tracing::warn!("{}: preview failed: {e}", photo.file_name);
        }

        let answer = match prompt.ask(RENAME_QUESTION)? {
            Some(answer) => answer.trim().to_string(),
            None => {
                report.stopped_early = true;
                break;
            }
        };
        if answer == QUIT {
            report.stopped_early = true;
            break;
        }

        let outcome = if answer.is_empty() {
            RenameOutcome::Skipped
        } else {
            rename_one(photo, &answer)
        };
        let entry = RenameEntry {
            index,
            file_name: photo.file_name.clone(),
            outcome,
        };
        on_event(&RenameEvent::Finished(entry.clone()));
        report.entries.push(entry);
    }

    tracing::info!("renamed {} of {} files", report.renamed(), report.total);
    Ok(report)
}

fn rename_one(photo: &SourceFile, answer: &str) -> RenameOutcome {
    let name = sanitize(answer);
    if !is_plain_name(&name) {
        tracing::warn!("{}: refusing name {name:?}", photo.file_name);
        return RenameOutcome::InvalidName(name);
    }

    let target_name = format!("{name}.{}", photo.extension);
    let target = photo.path.with_file_name(&target_name);
    if target.exists() {
        tracing::warn!("{}: {target_name} already exists", photo.file_name);
        return RenameOutcome::TargetExists(target_name);
    }

    match std::fs::rename(&photo.path, &target) {
        Ok(()) => {
            tracing::debug!("{} -> {target_name}", photo.file_name);
            RenameOutcome::Renamed(target_name)
        }
        Err(e) => {
            tracing::warn!("{}: rename failed: {e}", photo.file_name);
            RenameOutcome::Failed(e.to_string())
        }
    }
}
