//! Typed view over a decoded EXIF block.
//!
//! kamadak-exif hands back a flat list of fields, each carrying its IFD
//! context and a loosely typed [`exif::Value`]. The extractor wants something
//! closer to how the TIFF structure actually nests: a top-level mapping from
//! tag ID to value, with the Exif and GPS sub-IFDs hanging off their pointer
//! tags. [`ExifContainer`] is that shape, and [`TagValue`] narrows the dozen
//! EXIF value types down to the four kinds the decode rules care about.

use std::collections::BTreeMap;

use super::tags;

/// One EXIF field value, reduced to the kinds the extractor distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// UNDEFINED or BYTE payloads (UserComment, XP* tags, raw blobs).
    Bytes(Vec<u8>),
    /// ASCII payloads, decoded one byte per char (Latin-1).
    ///
    /// Writers routinely put UTF-8 into ASCII fields, so a `Text` value may
    /// hold mojibake that [`repair_mojibake`](super::text::repair_mojibake)
    /// undoes.
    Text(String),
    /// Any numeric payload that is not a degrees/minutes/seconds triple.
    Numeric(Vec<f64>),
    /// Exactly three rationals, as used by GPS latitude/longitude.
    Rational3([f64; 3]),
}

impl TagValue {
    pub fn text(value: impl Into<String>) -> Self {
        TagValue::Text(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        TagValue::Bytes(value.into())
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TagValue::Bytes(_) => "bytes",
            TagValue::Text(_) => "text",
            TagValue::Numeric(_) => "numeric",
            TagValue::Rational3(_) => "rational triple",
        }
    }

    /// Convert a kamadak-exif value.
    pub fn from_exif_value(value: &exif::Value) -> Self {
        use exif::Value;

        match value {
            Value::Ascii(parts) => {
                let first = parts.first().map(Vec::as_slice).unwrap_or_default();
                TagValue::Text(latin1_to_string(first))
            }
            Value::Byte(bytes) => TagValue::Bytes(bytes.clone()),
            Value::Undefined(bytes, _) => TagValue::Bytes(bytes.clone()),
            Value::Rational(values) if values.len() == 3 => TagValue::Rational3([
                values[0].to_f64(),
                values[1].to_f64(),
                values[2].to_f64(),
            ]),
            Value::Rational(values) => {
                TagValue::Numeric(values.iter().map(|r| r.to_f64()).collect())
            }
            Value::SRational(values) => {
                TagValue::Numeric(values.iter().map(|r| r.to_f64()).collect())
            }
            Value::Short(values) => TagValue::Numeric(values.iter().map(|&v| v.into()).collect()),
            Value::Long(values) => TagValue::Numeric(values.iter().map(|&v| v.into()).collect()),
            Value::SByte(values) => TagValue::Numeric(values.iter().map(|&v| v.into()).collect()),
            Value::SShort(values) => TagValue::Numeric(values.iter().map(|&v| v.into()).collect()),
            Value::SLong(values) => TagValue::Numeric(values.iter().map(|&v| v.into()).collect()),
            Value::Float(values) => TagValue::Numeric(values.iter().map(|&v| v.into()).collect()),
            Value::Double(values) => TagValue::Numeric(values.clone()),
            _ => TagValue::Numeric(Vec::new()),
        }
    }
}

/// Decode bytes as ISO-8859-1: every byte maps to the code point of the same value.
pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// EXIF fields of one image, with the Exif and GPS sub-IFDs nested under
/// their pointer tags.
///
/// Only the primary image (IFD0 and its children) is kept; thumbnail IFD1
/// fields are dropped when converting from kamadak-exif.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifContainer {
    fields: BTreeMap<u16, TagValue>,
    ifds: BTreeMap<u16, ExifContainer>,
}

impl ExifContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a field.
    pub fn with(mut self, tag: u16, value: TagValue) -> Self {
        self.insert(tag, value);
        self
    }

    /// Builder-style insert of a nested IFD under its pointer tag.
    pub fn with_ifd(mut self, pointer: u16, ifd: ExifContainer) -> Self {
        self.ifds.insert(pointer, ifd);
        self
    }

    pub fn insert(&mut self, tag: u16, value: TagValue) {
        self.fields.insert(tag, value);
    }

    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.fields.get(&tag)
    }

    /// Nested IFD addressed by its pointer tag ([`tags::EXIF_IFD`] or [`tags::GPS_IFD`]).
    pub fn ifd(&self, pointer: u16) -> Option<&ExifContainer> {
        self.ifds.get(&pointer)
    }

    /// Build a container from a parsed kamadak-exif block.
    pub fn from_exif(exif: &exif::Exif) -> Self {
        let mut root = ExifContainer::new();

        for field in exif.fields() {
            if field.ifd_num != exif::In::PRIMARY {
                continue;
            }
            let value = TagValue::from_exif_value(&field.value);
            let number = field.tag.number();
            match field.tag.context() {
                exif::Context::Tiff => root.insert(number, value),
                exif::Context::Exif => root
                    .ifds
                    .entry(tags::EXIF_IFD)
                    .or_default()
                    .insert(number, value),
                exif::Context::Gps => root
                    .ifds
                    .entry(tags::GPS_IFD)
                    .or_default()
                    .insert(number, value),
                _ => {}
            }
        }

        root
    }
}
