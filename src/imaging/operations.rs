//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{Quality, RenderParams, VariantKind, VariantParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Bounding box and quality for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantConfig {
    pub max_edge: u32,
    pub quality: Quality,
}

/// The thumbnail/large pair every processed photo gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSet {
    pub thumbnail: VariantConfig,
    pub large: VariantConfig,
}

impl Default for VariantSet {
    fn default() -> Self {
        Self {
            thumbnail: VariantConfig {
                max_edge: 300,
                quality: Quality::new(80),
            },
            large: VariantConfig {
                max_edge: 1600,
                quality: Quality::new(85),
            },
        }
    }
}

/// A written variant: its output file name and final dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub kind: VariantKind,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// Plan a render without executing it.
///
/// Useful for testing parameter generation.
fn plan_variants(
    source: &Path,
    output_dir: &Path,
    stem: &str,
    variants: &VariantSet,
) -> RenderParams {
    let variant = |kind: VariantKind, config: &VariantConfig| VariantParams {
        kind,
        output: output_dir.join(kind.file_name(stem)),
        max_edge: config.max_edge,
        quality: config.quality,
    };

    RenderParams {
        source: source.to_path_buf(),
        variants: vec![
            variant(VariantKind::Thumbnail, &variants.thumbnail),
            variant(VariantKind::Large, &variants.large),
        ],
    }
}

/// Write `{stem}_thumb.jpg` and `{stem}_large.jpg` into `output_dir`.
///
/// Both come from one decode of `source`; the large image is never used as
/// the input for the thumbnail. Existing files are overwritten.
pub fn create_variants(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    stem: &str,
    variants: &VariantSet,
) -> Result<Vec<GeneratedVariant>> {
    let params = plan_variants(source, output_dir, stem, variants);
    let dims = backend.render(&params)?;
    if dims.len() != params.variants.len() {
        return Err(BackendError::Encode(format!(
            "backend returned {} results for {} variants",
            dims.len(),
            params.variants.len()
        )));
    }

    Ok(params
        .variants
        .iter()
        .zip(dims)
        .map(|(variant, Dimensions { width, height })| GeneratedVariant {
            kind: variant.kind,
            file_name: variant.kind.file_name(stem),
            width,
            height,
        })
        .collect())
}
