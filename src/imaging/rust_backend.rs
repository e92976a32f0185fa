//! Image processing backend built on the `image` crate.
//!
//! Everything except HEIC is pure Rust and statically linked. HEIC goes
//! through `libheif-rs` when the `heic` feature is enabled (the default),
//! which links the system libheif.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | EXIF | `kamadak-exif` `Reader::read_from_container` (JPEG, TIFF/DNG, PNG, WebP, HEIF) |
//! | Decode (JPEG, PNG, TIFF/DNG, WebP) | `image` crate (pure Rust decoders) |
//! | Identify / decode (HEIC) | `libheif_rs::HeifContext`, primary image as interleaved RGB |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Without the `heic` feature, HEIC files fail at identify with a decode
//! error. Their EXIF is still readable either way.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_within;
use super::params::{RenderParams, VariantParams};
use crate::metadata::ExifContainer;
use crate::scan::SourceFormat;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Pure Rust backend using the `image` and `kamadak-exif` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open an image, sniffing the format from its magic bytes.
///
/// DNG has no extension mapping in `image`, but its TIFF header sniffs fine.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

fn is_heic(path: &Path) -> bool {
    SourceFormat::from_path(path) == Some(SourceFormat::Heic)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    if is_heic(path) {
        return heif::decode(path);
    }
    open_reader(path)?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

#[cfg(feature = "heic")]
mod heif {
    use super::{BackendError, Dimensions};
    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, ImageHandle, LibHeif, RgbChroma};
    use std::path::Path;

    fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
        BackendError::Decode(format!("{}: {}", path.display(), e))
    }

    fn with_primary<T>(
        path: &Path,
        f: impl FnOnce(&ImageHandle) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        // libheif reports a missing file as a generic input error.
        std::fs::metadata(path)?;
        let name = path
            .to_str()
            .ok_or_else(|| decode_error(path, "path is not valid UTF-8"))?;
        let ctx = HeifContext::read_from_file(name).map_err(|e| decode_error(path, e))?;
        let handle = ctx.primary_image_handle().map_err(|e| decode_error(path, e))?;
        f(&handle)
    }

    pub(super) fn identify(path: &Path) -> Result<Dimensions, BackendError> {
        with_primary(path, |handle| {
            Ok(Dimensions {
                width: handle.width(),
                height: handle.height(),
            })
        })
    }

    /// Decode the primary image to 8-bit RGB.
    ///
    /// Rows in the decoded plane may be padded, so they are copied one at a
    /// time using the plane stride.
    pub(super) fn decode(path: &Path) -> Result<DynamicImage, BackendError> {
        with_primary(path, |handle| {
            let image = LibHeif::new()
                .decode(handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
                .map_err(|e| decode_error(path, e))?;
            let planes = image.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| decode_error(path, "no interleaved RGB plane"))?;

            let row_len = plane.width as usize * 3;
            if plane.stride < row_len.max(1) {
                return Err(decode_error(path, "stride shorter than a pixel row"));
            }
            let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
            for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
                let row = row
                    .get(..row_len)
                    .ok_or_else(|| decode_error(path, "truncated pixel row"))?;
                pixels.extend_from_slice(row);
            }
            RgbImage::from_raw(plane.width, plane.height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| decode_error(path, "pixel buffer does not match dimensions"))
        })
    }
}

#[cfg(not(feature = "heic"))]
mod heif {
    use super::{BackendError, Dimensions};
    use image::DynamicImage;
    use std::path::Path;

    fn unsupported(path: &Path) -> BackendError {
        BackendError::Decode(format!(
            "{}: HEIC support not compiled in (enable the `heic` feature)",
            path.display()
        ))
    }

    pub(super) fn identify(path: &Path) -> Result<Dimensions, BackendError> {
        std::fs::metadata(path)?;
        Err(unsupported(path))
    }

    pub(super) fn decode(path: &Path) -> Result<DynamicImage, BackendError> {
        std::fs::metadata(path)?;
        Err(unsupported(path))
    }
}

/// Reduce to a color type the JPEG encoder accepts.
///
/// Alpha is dropped, palettes were already expanded by the decoder, and
/// 16-bit or float images are narrowed to 8-bit RGB.
fn jpeg_compatible(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img,
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

/// Resize (never enlarging) and encode one variant as JPEG.
fn write_variant(img: &DynamicImage, variant: &VariantParams) -> Result<Dimensions, BackendError> {
    let (width, height) = fit_within((img.width(), img.height()), variant.max_edge);
    let sized = if (width, height) == (img.width(), img.height()) {
        img.clone()
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };
    let sized = jpeg_compatible(sized);

    let writer = BufWriter::new(File::create(&variant.output)?);
    let encoder = JpegEncoder::new_with_quality(writer, variant.quality.value() as u8);
    sized.write_with_encoder(encoder).map_err(|e| {
        BackendError::Encode(format!("{}: {}", variant.output.display(), e))
    })?;

    Ok(Dimensions { width, height })
}

fn remove_partial(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => tracing::debug!("removed {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove {}: {}", output.display(), e),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if is_heic(path) {
            return heif::identify(path);
        }
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(Dimensions { width, height })
    }

    fn read_exif(&self, path: &Path) -> Result<Option<ExifContainer>, BackendError> {
        let mut reader = BufReader::new(File::open(path)?);
        match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Ok(Some(ExifContainer::from_exif(&exif))),
            Err(exif::Error::NotFound(_)) => Ok(None),
            Err(exif::Error::Io(e)) => Err(BackendError::Io(e)),
            Err(e) => Err(BackendError::Metadata(format!("{}: {}", path.display(), e))),
        }
    }

    /// Variants are all-or-nothing: if one fails, the ones already written
    /// are removed.
    fn render(&self, params: &RenderParams) -> Result<Vec<Dimensions>, BackendError> {
        let img = load_image(&params.source)?;
        let mut written = Vec::with_capacity(params.variants.len());
        for variant in &params.variants {
            match write_variant(&img, variant) {
                Ok(dims) => written.push((dims, &variant.output)),
                Err(e) => {
                    remove_partial(&variant.output);
                    for (_, output) in &written {
                        remove_partial(output);
                    }
                    return Err(e);
                }
            }
        }
        Ok(written.into_iter().map(|(dims, _)| dims).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Quality, VariantKind};
    use crate::metadata::{extract_capture_date, extract_caption, extract_coordinate, tags};
    use crate::test_helpers::{ExifFixture, write_jpeg, write_jpeg_with_exif, write_png_rgba};

    fn variant(output: &Path, kind: VariantKind, max_edge: u32) -> VariantParams {
        VariantParams {
            kind,
            output: output.to_path_buf(),
            max_edge,
            quality: Quality::new(80),
        }
    }

    // =========================================================================
    // identify
    // =========================================================================

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_sniffs_format_regardless_of_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mislabeled.dng");
        write_jpeg(&path, 64, 32);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (64, 32));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn identify_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("garbage.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(RustBackend::new().identify(&path).is_err());
    }

    // =========================================================================
    // read_exif
    // =========================================================================

    #[test]
    fn read_exif_without_block_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        write_jpeg(&path, 32, 32);

        assert_eq!(RustBackend::new().read_exif(&path).unwrap(), None);
    }

    #[test]
    fn read_exif_nonexistent_is_io_error() {
        let result = RustBackend::new().read_exif(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn read_exif_finds_gps_and_description() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("geo.jpg");
        let fixture = ExifFixture::new()
            .description("Eiffel Tower")
            .gps((48, 51, 30), 'N', (2, 17, 40), 'E');
        write_jpeg_with_exif(&path, 40, 30, &fixture);

        let container = RustBackend::new().read_exif(&path).unwrap().unwrap();
        assert!(container.ifd(tags::GPS_IFD).is_some());

        let coord = extract_coordinate(&container).unwrap();
        assert!((coord.latitude - (48.0 + 51.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-9);
        assert!((coord.longitude - (2.0 + 17.0 / 60.0 + 40.0 / 3600.0)).abs() < 1e-9);
        assert_eq!(extract_caption(&container).as_deref(), Some("Eiffel Tower"));
    }

    #[test]
    fn read_exif_user_comment_lands_in_exif_ifd() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("comment.jpg");
        let fixture = ExifFixture::new().user_comment(b"ASCII\0\0\0Paris trip");
        write_jpeg_with_exif(&path, 40, 30, &fixture);

        let container = RustBackend::new().read_exif(&path).unwrap().unwrap();
        assert_eq!(extract_caption(&container).as_deref(), Some("Paris trip"));
    }

    #[test]
    fn read_exif_date_time_original_lands_in_exif_ifd() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("dated.jpg");
        let fixture = ExifFixture::new()
            .date_time("2024:01:02 10:00:00")
            .date_time_original("2023:06:15 14:30:00");
        write_jpeg_with_exif(&path, 40, 30, &fixture);

        let container = RustBackend::new().read_exif(&path).unwrap().unwrap();
        assert!(container.get(tags::DATE_TIME_ORIGINAL).is_none());
        assert!(
            container
                .ifd(tags::EXIF_IFD)
                .and_then(|ifd| ifd.get(tags::DATE_TIME_ORIGINAL))
                .is_some()
        );
        assert!(container.get(tags::DATE_TIME).is_some());
        assert_eq!(
            extract_capture_date(&container).as_deref(),
            Some("2023:06:15 14:30:00")
        );
    }

    #[test]
    fn read_exif_falls_back_to_ifd0_date_time() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("modified.jpg");
        let fixture = ExifFixture::new().date_time("2024:01:02 10:00:00");
        write_jpeg_with_exif(&path, 40, 30, &fixture);

        let container = RustBackend::new().read_exif(&path).unwrap().unwrap();
        assert!(container.ifd(tags::EXIF_IFD).is_none());
        assert_eq!(
            extract_capture_date(&container).as_deref(),
            Some("2024:01:02 10:00:00")
        );
    }

    #[test]
    fn read_exif_latitude_only_has_no_coordinate() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("half.jpg");
        let fixture = ExifFixture::new().latitude_only((48, 51, 30), 'N');
        write_jpeg_with_exif(&path, 40, 30, &fixture);

        let container = RustBackend::new().read_exif(&path).unwrap().unwrap();
        let gps = container.ifd(tags::GPS_IFD).unwrap();
        assert!(gps.get(tags::GPS_LATITUDE).is_some());
        assert!(gps.get(tags::GPS_LONGITUDE).is_none());
        assert_eq!(extract_coordinate(&container), None);
    }

    // =========================================================================
    // render
    // =========================================================================

    #[test]
    fn render_writes_bounded_variants_from_one_decode() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_jpeg(&source, 800, 600);
        let thumb = tmp.path().join("source_thumb.jpg");
        let large = tmp.path().join("source_large.jpg");

        let dims = RustBackend::new()
            .render(&RenderParams {
                source,
                variants: vec![
                    variant(&thumb, VariantKind::Thumbnail, 300),
                    variant(&large, VariantKind::Large, 1600),
                ],
            })
            .unwrap();

        assert_eq!(
            dims,
            vec![
                Dimensions {
                    width: 300,
                    height: 225
                },
                Dimensions {
                    width: 800,
                    height: 600
                },
            ]
        );
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (300, 225));
        assert_eq!(image::image_dimensions(&large).unwrap(), (800, 600));
    }

    #[test]
    fn render_portrait_is_bounded_by_height() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("tall.jpg");
        write_jpeg(&source, 300, 900);
        let thumb = tmp.path().join("tall_thumb.jpg");

        RustBackend::new()
            .render(&RenderParams {
                source,
                variants: vec![variant(&thumb, VariantKind::Thumbnail, 300)],
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&thumb).unwrap(), (100, 300));
    }

    #[test]
    fn render_converts_alpha_png_to_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        write_png_rgba(&source, 400, 200);
        let thumb = tmp.path().join("alpha_thumb.jpg");

        RustBackend::new()
            .render(&RenderParams {
                source,
                variants: vec![variant(&thumb, VariantKind::Thumbnail, 300)],
            })
            .unwrap();

        let bytes = std::fs::read(&thumb).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "output should be a JPEG");
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (300, 150));
    }

    #[test]
    fn render_overwrites_existing_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_jpeg(&source, 100, 100);
        let thumb = tmp.path().join("source_thumb.jpg");
        std::fs::write(&thumb, b"stale").unwrap();

        RustBackend::new()
            .render(&RenderParams {
                source,
                variants: vec![variant(&thumb, VariantKind::Thumbnail, 300)],
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&thumb).unwrap(), (100, 100));
    }

    #[test]
    fn render_undecodable_source_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.jpg");
        std::fs::write(&source, b"\xFF\xD8\xFF\xE0 truncated").unwrap();
        let thumb = tmp.path().join("broken_thumb.jpg");

        let result = RustBackend::new().render(&RenderParams {
            source,
            variants: vec![variant(&thumb, VariantKind::Thumbnail, 300)],
        });
        assert!(result.is_err());
        assert!(!thumb.exists());
    }

    #[test]
    fn render_failure_removes_earlier_variants() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_jpeg(&source, 400, 300);
        let thumb = tmp.path().join("source_thumb.jpg");
        let large = tmp.path().join("missing-dir").join("source_large.jpg");

        let result = RustBackend::new().render(&RenderParams {
            source,
            variants: vec![
                variant(&thumb, VariantKind::Thumbnail, 300),
                variant(&large, VariantKind::Large, 1600),
            ],
        });

        assert!(matches!(result, Err(BackendError::Io(_))));
        assert!(!thumb.exists());
        assert!(!large.exists());
    }

    // =========================================================================
    // HEIC
    // =========================================================================

    #[test]
    fn identify_missing_heic_is_io_error() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/IMG_0001.HEIC"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn corrupt_heic_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.heic");
        std::fs::write(&source, b"\0\0\0\x18ftypheic not really").unwrap();
        let thumb = tmp.path().join("broken_thumb.jpg");

        let backend = RustBackend::new();
        assert!(matches!(backend.identify(&source), Err(BackendError::Decode(_))));
        let result = backend.render(&RenderParams {
            source,
            variants: vec![variant(&thumb, VariantKind::Thumbnail, 300)],
        });
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert!(!thumb.exists());
    }

    /// Encode a small HEIC with libheif, or `None` when the linked libheif
    /// has no HEVC encoder.
    #[cfg(feature = "heic")]
    fn write_heic(path: &Path, width: u32, height: u32) -> Option<()> {
        use libheif_rs::{Channel, ColorSpace, CompressionFormat, HeifContext, Image, LibHeif, RgbChroma};

        let lib_heif = LibHeif::new();
        let mut encoder = lib_heif.encoder_for_format(CompressionFormat::Hevc).ok()?;
        let mut image = Image::new(width, height, ColorSpace::Rgb(RgbChroma::Rgb)).unwrap();
        image.create_plane(Channel::Interleaved, width, height, 8).unwrap();
        {
            let planes = image.planes_mut();
            let plane = planes.interleaved.unwrap();
            for (y, row) in plane.data.chunks_mut(plane.stride).enumerate() {
                for x in 0..width as usize {
                    row[x * 3] = (x % 256) as u8;
                    row[x * 3 + 1] = (y % 256) as u8;
                    row[x * 3 + 2] = 128;
                }
            }
        }
        let mut ctx = HeifContext::new().unwrap();
        ctx.encode_image(&image, &mut encoder, None).unwrap();
        ctx.write_to_file(path.to_str().unwrap()).unwrap();
        Some(())
    }

    #[cfg(feature = "heic")]
    #[test]
    fn heic_identify_and_render() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("IMG_0001.HEIC");
        if write_heic(&source, 640, 480).is_none() {
            eprintln!("libheif has no HEVC encoder, skipping");
            return;
        }
        let thumb = tmp.path().join("IMG_0001_thumb.jpg");

        let backend = RustBackend::new();
        let dims = backend.identify(&source).unwrap();
        assert_eq!((dims.width, dims.height), (640, 480));

        let rendered = backend
            .render(&RenderParams {
                source,
                variants: vec![variant(&thumb, VariantKind::Thumbnail, 300)],
            })
            .unwrap();
        assert_eq!(
            rendered,
            vec![Dimensions {
                width: 300,
                height: 225
            }]
        );
        let bytes = std::fs::read(&thumb).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (300, 225));
    }

    #[cfg(not(feature = "heic"))]
    #[test]
    fn heic_without_feature_names_the_feature() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("IMG_0001.heic");
        std::fs::write(&source, b"x").unwrap();

        match RustBackend::new().identify(&source) {
            Err(BackendError::Decode(message)) => assert!(message.contains("heic")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
