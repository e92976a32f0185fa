//! Parameter types for image operations.
//!
//! These structs describe *what* to render, not *how*. They sit between
//! [`operations`](super::operations), which decides which variants a photo
//! gets, and the [`backend`](super::backend), which does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100). Clamped on construction.
//! - [`VariantKind`]: thumbnail or large, and the file suffix each one uses.
//! - [`VariantParams`]: one output file, its bounding box and quality.
//! - [`RenderParams`]: one source file plus every variant rendered from it.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Which derived image a variant is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Thumbnail,
    Large,
}

impl VariantKind {
    /// Suffix appended to the source stem: `{stem}_{suffix}.jpg`.
    pub fn suffix(self) -> &'static str {
        match self {
            VariantKind::Thumbnail => "thumb",
            VariantKind::Large => "large",
        }
    }

    pub fn file_name(self, stem: &str) -> String {
        format!("{stem}_{}.jpg", self.suffix())
    }
}

/// One output of a render: a JPEG bounded to `max_edge` on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantParams {
    pub kind: VariantKind,
    pub output: PathBuf,
    pub max_edge: u32,
    pub quality: Quality,
}

/// Render every variant from a single decode of `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    pub variants: Vec<VariantParams>,
}
