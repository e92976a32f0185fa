//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image` header decode |
//! | **EXIF** | `kamadak-exif` → [`ExifContainer`](crate::metadata::ExifContainer) |
//! | **Render → JPEG** | Lanczos3 resize + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_within;
pub use operations::{
    GeneratedVariant, VariantConfig, VariantSet, create_variants, get_dimensions,
};
pub use params::{Quality, RenderParams, VariantKind, VariantParams};
pub use rust_backend::RustBackend;
