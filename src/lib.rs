//! # Travel Atlas
//!
//! Turns a folder of travel photos into the data behind a photo map: resized
//! images plus a `data.json` manifest listing every photo that has a GPS
//! position. Two interactive helpers prepare the folder first.
//!
//! # Workflow
//!
//! ```text
//! 1. Rename    IMG_0001.jpg  →  santorini-oia.jpg   (optional, with inline preview)
//! 2. Ingest    photos/       →  captions in EXIF    (asks only for photos without one)
//! 3. Process   photos/       →  public/             (thumb + large JPEG, data.json)
//! ```
//!
//! Every step can be rerun. Ingest never prompts for a photo that already has
//! a caption, and process rewrites the same outputs from the same inputs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | EXIF container model; GPS, capture date and caption extraction with encoding repair |
//! | [`imaging`] | `ImageBackend` trait, `image`-based backend, resize math |
//! | [`scan`] | Flat, sorted listing of recognized source files |
//! | [`process`] | Parallel batch pipeline and atomic manifest write |
//! | [`ingest`] | Interactive caption backfill |
//! | [`writer`] | Caption writing via exiftool or in-process fallback |
//! | [`rename`] | Interactive `region-landmark` renaming |
//! | [`interact`] | Prompt and inline-preview traits with terminal implementations |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | `PhotoRecord`, the manifest entry |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Positions Gate Publication
//!
//! A photo without a usable GPS position cannot be placed on the map, so it is
//! skipped, even when it has a caption. A position needs all four GPS fields;
//! partial or out-of-range data counts as absent.
//!
//! ## Caption Recovery
//!
//! Cameras and editors disagree on how text goes into EXIF. `ImageDescription`
//! is often UTF-8 stored in an ASCII field, sometimes double-encoded;
//! `UserComment` carries an 8-byte character-code prefix. The
//! [`metadata`] module tries each source in turn and repairs what it can
//! rather than failing the photo.
//!
//! ## Imaging
//!
//! Decoding, resizing and JPEG encoding use the `image` crate; EXIF comes from
//! `kamadak-exif`. HEIC is decoded through `libheif-rs` when the default
//! `heic` feature is enabled. The only external program ever run is
//! `exiftool`, and only when it is installed, for writing captions into
//! formats the in-process writer does not handle.

pub mod config;
pub mod imaging;
pub mod ingest;
pub mod interact;
pub mod metadata;
pub mod output;
pub mod process;
pub mod rename;
pub mod scan;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
