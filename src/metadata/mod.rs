//! Photo metadata extraction: GPS position, capture date, caption.
//!
//! Everything here is a pure function of an [`ExifContainer`]. Reading the
//! container out of a file is the imaging backend's job
//! ([`ImageBackend::read_exif`](crate::imaging::ImageBackend::read_exif)).
//!
//! ## Coordinate
//!
//! Needs all four GPS fields: latitude DMS triple, latitude ref, longitude
//! DMS triple, longitude ref. Each triple becomes
//! `degrees + minutes/60 + seconds/3600`, negated when the ref is `S` or `W`.
//! The negation does not check which axis the ref belongs to; a latitude
//! tagged `W` comes out negative just like one tagged `S`.
//!
//! ## Capture date
//!
//! `DateTimeOriginal` (top level, then the Exif IFD), falling back to
//! `DateTime`. The string is passed through as written by the camera.
//!
//! ## Caption
//!
//! Two tiers, first non-blank wins:
//!
//! ```text
//! 1. ImageDescription (IFD0)   bytes → UTF-8 (lossy)   text → mojibake repair
//! 2. UserComment (Exif IFD)    bytes → by 8-byte prefix text → mojibake repair
//! ```
//!
//! A tier that fails to decode is skipped, never reported: see [`DecodeError`].

mod container;
pub mod tags;
mod text;

pub use container::{ExifContainer, TagValue};
pub use text::{
    DecodeError, decode_user_comment, decode_utf8_ignoring_errors, decode_utf16, repair_mojibake,
};

use serde::Serialize;
use std::fmt;

/// A position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Returns `None` when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// GPS reference letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Parse the first non-blank character of a ref value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let first = value
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .chars()
            .next()?;
        match first.to_ascii_uppercase() {
            'N' => Some(Hemisphere::North),
            'S' => Some(Hemisphere::South),
            'E' => Some(Hemisphere::East),
            'W' => Some(Hemisphere::West),
            _ => None,
        }
    }

    fn from_tag(value: &TagValue) -> Option<Self> {
        match value {
            TagValue::Text(text) => Self::parse(text),
            TagValue::Bytes(bytes) => Self::parse(&decode_utf8_ignoring_errors(bytes)),
            _ => None,
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }
}

/// Convert a degrees/minutes/seconds triple to signed decimal degrees.
pub fn dms_to_decimal(dms: [f64; 3], hemisphere: Hemisphere) -> f64 {
    let [degrees, minutes, seconds] = dms;
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    if hemisphere.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Extract the GPS position, if all four GPS fields are present and sane.
pub fn extract_coordinate(container: &ExifContainer) -> Option<GeoCoordinate> {
    let gps = container.ifd(tags::GPS_IFD)?;
    let latitude = gps_axis(gps, tags::GPS_LATITUDE, tags::GPS_LATITUDE_REF)?;
    let longitude = gps_axis(gps, tags::GPS_LONGITUDE, tags::GPS_LONGITUDE_REF)?;
    GeoCoordinate::new(latitude, longitude)
}

fn gps_axis(gps: &ExifContainer, value_tag: u16, ref_tag: u16) -> Option<f64> {
    let TagValue::Rational3(dms) = gps.get(value_tag)? else {
        return None;
    };
    let hemisphere = Hemisphere::from_tag(gps.get(ref_tag)?)?;
    Some(dms_to_decimal(*dms, hemisphere))
}

/// Extract the capture timestamp as written by the camera.
pub fn extract_capture_date(container: &ExifContainer) -> Option<String> {
    let exif_ifd = container.ifd(tags::EXIF_IFD);
    [
        container.get(tags::DATE_TIME_ORIGINAL),
        exif_ifd.and_then(|ifd| ifd.get(tags::DATE_TIME_ORIGINAL)),
        container.get(tags::DATE_TIME),
    ]
    .into_iter()
    .flatten()
    .find_map(|value| match value {
        TagValue::Text(text) => text::clean(text).ok(),
        TagValue::Bytes(bytes) => text::clean(&decode_utf8_ignoring_errors(bytes)).ok(),
        _ => None,
    })
}

/// Extract the caption, trying ImageDescription then UserComment.
pub fn extract_caption(container: &ExifContainer) -> Option<String> {
    match caption_from_description(container) {
        Ok(caption) => return Some(caption),
        Err(e) => tracing::trace!("ImageDescription yielded no caption: {e}"),
    }
    match caption_from_user_comment(container) {
        Ok(caption) => Some(caption),
        Err(e) => {
            tracing::trace!("UserComment yielded no caption: {e}");
            None
        }
    }
}

fn caption_from_description(container: &ExifContainer) -> Result<String, DecodeError> {
    let tag = tags::IMAGE_DESCRIPTION;
    match container.get(tag) {
        None => Err(DecodeError::MissingTag(tag)),
        Some(TagValue::Bytes(bytes)) => text::clean(&decode_utf8_ignoring_errors(bytes)),
        Some(TagValue::Text(value)) => text::clean(&repair_mojibake(value)),
        Some(other) => Err(DecodeError::UnexpectedType {
            tag,
            kind: other.kind(),
        }),
    }
}

fn caption_from_user_comment(container: &ExifContainer) -> Result<String, DecodeError> {
    let tag = tags::USER_COMMENT;
    let value = container
        .ifd(tags::EXIF_IFD)
        .and_then(|ifd| ifd.get(tag))
        .ok_or(DecodeError::MissingTag(tag))?;
    match value {
        TagValue::Bytes(bytes) => text::clean(&decode_user_comment(bytes)?),
        TagValue::Text(value) => text::clean(&repair_mojibake(value)),
        other => Err(DecodeError::UnexpectedType {
            tag,
            kind: other.kind(),
        }),
    }
}

/// Run all three extractors over a container.
pub fn read_metadata(container: &ExifContainer) -> PhotoMetadata {
    PhotoMetadata {
        coordinate: extract_coordinate(container),
        capture_date: extract_capture_date(container),
        caption: extract_caption(container),
    }
}

/// The three extractor outputs for one photo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub coordinate: Option<GeoCoordinate>,
    pub capture_date: Option<String>,
    pub caption: Option<String>,
}

impl PhotoMetadata {
    /// Run every extractor. A missing container yields all-absent metadata.
    pub fn from_container(container: Option<&ExifContainer>) -> Self {
        container.map(read_metadata).unwrap_or_default()
    }
}
