//! CLI output formatting for every command.
//!
//! Each photo is shown by its positional index and file name, with details on
//! indented lines underneath. Processing runs in parallel, so the index is
//! what ties a line back to its place in the sorted input.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! Processing 3 photos
//! 002 IMG_0002.jpg
//!     skipped: no GPS
//! 001 IMG_0001.jpg
//!     Position: 48.858333, 2.294444
//!     Caption: Eiffel Tower at dusk
//!     thumb: 300x225
//!     large: 1600x1200
//! 003 IMG_0003.heic
//!     failed: Decode failed: ...
//!
//! Wrote 1 photo to public/data.json (1 without GPS, 1 failed)
//! ```
//!
//! ## Ingest
//!
//! ```text
//! --- Photo Ingest Workflow ---
//! ✓ exiftool detected (Full support)
//!
//! [1/3] IMG_0001.jpg
//!   Date: 2023:06:14 18:22:05
//!   GPS:  48.858333, 2.294444
//!   Enter New Caption (Press Enter to keep/skip): Eiffel Tower
//!   ✓ Saved caption to EXIF
//! ```
//!
//! ## Rename
//!
//! ```text
//! 📷 Current file: IMG_0001.jpg
//!
//! region-landmark (ENTER skip, q quit): paris-eiffel
//! ✅ Renamed → paris-eiffel.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has `format_*` functions (returning `Vec<String>`) for
//! testability and `print_*` wrappers that write to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::ingest::{IngestEvent, IngestOutcome, IngestReport};
use crate::process::{ProcessEvent, ProcessOutcome, ProcessReport};
use crate::rename::{RenameEvent, RenameOutcome, RenameReport};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_caption(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { total } => {
            vec![format!("Processing {}", plural(*total, "photo"))]
        }
        ProcessEvent::File(report) => {
            let mut lines = vec![format!(
                "{} {}",
                format_index(report.index),
                report.file_name
            )];
            match &report.outcome {
                ProcessOutcome::Processed { record, variants } => {
                    lines.push(format!(
                        "{}Position: {:.6}, {:.6}",
                        indent(1),
                        record.lat,
                        record.lng
                    ));
                    if !record.caption.is_empty() {
                        lines.push(format!(
                            "{}Caption: {}",
                            indent(1),
                            truncate_caption(&record.caption, 60)
                        ));
                    }
                    for variant in variants {
                        lines.push(format!(
                            "{}{}: {}x{}",
                            indent(1),
                            variant.kind.suffix(),
                            variant.width,
                            variant.height
                        ));
                    }
                }
                ProcessOutcome::SkippedNoGps => {
                    lines.push(format!("{}skipped: no GPS", indent(1)));
                }
                ProcessOutcome::Failed(reason) => {
                    lines.push(format!("{}failed: {}", indent(1), reason));
                }
            }
            lines
        }
    }
}

/// Closing line for a process run.
pub fn format_process_summary(report: &ProcessReport, manifest_path: &Path) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "Wrote {} to {} ({} without GPS, {} failed)",
            plural(report.processed(), "photo"),
            manifest_path.display(),
            report.skipped(),
            report.failed()
        ),
    ]
}

pub fn print_process_summary(report: &ProcessReport, manifest_path: &Path) {
    print_lines(format_process_summary(report, manifest_path));
}

// ============================================================================
// Ingest
// ============================================================================

/// Banner shown before the first photo, stating how captions will be saved.
pub fn format_ingest_header(exiftool_available: bool) -> Vec<String> {
    let capability = if exiftool_available {
        "✓ exiftool detected (Full support)".to_string()
    } else {
        "! exiftool not found. JPEG, PNG and WebP captions are written directly; \
         HEIC and DNG writing will be skipped. Install exiftool for full support."
            .to_string()
    };
    vec!["--- Photo Ingest Workflow ---".to_string(), capability]
}

pub fn format_ingest_event(event: &IngestEvent) -> Vec<String> {
    match event {
        IngestEvent::Started { total } => {
            vec![format!("Found {}", plural(*total, "photo"))]
        }
        IngestEvent::Showing {
            index,
            total,
            file_name,
            capture_date,
            coordinate,
            read_error,
        } => {
            let mut lines = vec![String::new(), format!("[{index}/{total}] {file_name}")];
            if let Some(e) = read_error {
                lines.push(format!("  [Error] Reading metadata: {e}"));
            }
            lines.push(format!(
                "  Date: {}",
                capture_date.as_deref().unwrap_or("Unknown")
            ));
            lines.push(format!(
                "  GPS:  {}",
                coordinate
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "Unknown".to_string())
            ));
            lines
        }
        IngestEvent::Finished(entry) => match &entry.outcome {
            IngestOutcome::SkippedHasCaption(caption) => vec![format!(
                "  Caption: {} (already set, skipping)",
                truncate_caption(caption, 60)
            )],
            IngestOutcome::Kept => Vec::new(),
            IngestOutcome::Captioned(_) => vec!["  ✓ Saved caption to EXIF".to_string()],
            IngestOutcome::WriteFailed(reason) => {
                vec![format!("  ✗ Failed to save: {reason}")]
            }
        },
    }
}

pub fn format_ingest_summary(report: &IngestReport) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Captioned {}, {} already captioned, {} left as is, {} failed",
            plural(report.captioned(), "photo"),
            report.already_captioned(),
            report.kept(),
            report.failed()
        ),
    ];
    if report.stopped_early {
        lines.push(format!(
            "Stopped after {} of {}",
            report.entries.len(),
            plural(report.total, "photo")
        ));
    }
    lines
}

pub fn print_ingest_header(exiftool_available: bool) {
    print_lines(format_ingest_header(exiftool_available));
}

pub fn print_ingest_event(event: &IngestEvent) {
    print_lines(format_ingest_event(event));
}

pub fn print_ingest_summary(report: &IngestReport) {
    print_lines(format_ingest_summary(report));
}

// ============================================================================
// Rename
// ============================================================================

pub fn format_rename_event(event: &RenameEvent) -> Vec<String> {
    match event {
        RenameEvent::Showing { file_name, .. } => {
            vec![
                String::new(),
                format!("📷 Current file: {file_name}"),
                String::new(),
            ]
        }
        RenameEvent::Finished(entry) => match &entry.outcome {
            RenameOutcome::Renamed(name) => vec![format!("✅ Renamed \u{2192} {name}")],
            RenameOutcome::Skipped => Vec::new(),
            RenameOutcome::TargetExists(name) => {
                vec![format!("⚠️ File exists, skipping ({name})")]
            }
            RenameOutcome::InvalidName(name) => {
                vec![format!("⚠️ Not a plain file name, skipping ({name})")]
            }
            RenameOutcome::Failed(reason) => vec![format!("⚠️ Rename failed: {reason}")],
        },
    }
}

pub fn format_rename_summary(report: &RenameReport) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "Renamed {} of {}",
            report.renamed(),
            plural(report.total, "photo")
        ),
    ]
}

pub fn print_rename_event(event: &RenameEvent) {
    print_lines(format_rename_event(event));
}

pub fn print_rename_summary(report: &RenameReport) {
    print_lines(format_rename_summary(report));
}
