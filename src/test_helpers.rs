//! Shared test utilities.
//!
//! Synthetic images are encoded with the `image` crate. EXIF blocks are built
//! by hand as little-endian TIFF structures so tests control exactly which tags
//! exist and how they are typed, then spliced into a JPEG as an APP1 segment.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let fixture = ExifFixture::new()
//!     .description("Eiffel Tower")
//!     .gps((48, 51, 30), 'N', (2, 17, 40), 'E');
//! write_jpeg_with_exif(&tmp.path().join("paris.jpg"), 64, 48, &fixture);
//! ```

use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use std::collections::VecDeque;
use std::io;
use std::path::Path;

use crate::interact::Prompt;
use crate::metadata::tags;

// =========================================================================
// Image files
// =========================================================================

/// Encode a gradient JPEG of the given size into memory.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Write a JPEG without any EXIF block.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

/// Write a JPEG whose APP1 segment holds the fixture's EXIF block.
pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, fixture: &ExifFixture) {
    std::fs::write(path, fixture.splice_into_jpeg(&jpeg_bytes(width, height))).unwrap();
}

/// Write a semi-transparent RGBA PNG.
pub fn write_png_rgba(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, _| image::Rgba([200, 40, 40, (x % 256) as u8]));
    img.save(path).unwrap();
}

// =========================================================================
// EXIF fixture builder
// =========================================================================

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_UNDEFINED: u16 = 7;

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, bytes: &[u8]) -> Self {
        let mut data = bytes.to_vec();
        data.push(0);
        Self {
            tag,
            kind: TYPE_ASCII,
            count: data.len() as u32,
            data,
        }
    }

    fn undefined(tag: u16, bytes: &[u8]) -> Self {
        Self {
            tag,
            kind: TYPE_UNDEFINED,
            count: bytes.len() as u32,
            data: bytes.to_vec(),
        }
    }

    fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
        let data = values
            .iter()
            .flat_map(|&(num, den)| num.to_le_bytes().into_iter().chain(den.to_le_bytes()))
            .collect();
        Self {
            tag,
            kind: TYPE_RATIONAL,
            count: values.len() as u32,
            data,
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            kind: TYPE_LONG,
            count: 1,
            data: value.to_le_bytes().to_vec(),
        }
    }

    /// Bytes this entry occupies in the data area after its IFD.
    fn external_len(&self) -> usize {
        if self.data.len() <= 4 {
            0
        } else {
            self.data.len() + self.data.len() % 2
        }
    }
}

fn ifd_len(entries: &[Entry]) -> usize {
    2 + 12 * entries.len() + 4 + entries.iter().map(Entry::external_len).sum::<usize>()
}

/// Append an IFD that starts at byte `offset` of the TIFF block.
fn write_ifd(out: &mut Vec<u8>, offset: usize, entries: &mut [Entry]) {
    assert_eq!(out.len(), offset, "IFD must be written at its offset");
    entries.sort_by_key(|e| e.tag);

    let mut data_offset = offset + 2 + 12 * entries.len() + 4;
    let mut data_area = Vec::new();

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries.iter() {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.kind.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.data.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..entry.data.len()].copy_from_slice(&entry.data);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&(data_offset as u32).to_le_bytes());
            data_area.extend_from_slice(&entry.data);
            if entry.data.len() % 2 == 1 {
                data_area.push(0);
            }
            data_offset += entry.external_len();
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data_area);
}

/// Builder for a minimal EXIF block with IFD0, Exif and GPS IFDs.
#[derive(Default)]
pub struct ExifFixture {
    description: Option<Vec<u8>>,
    date_time: Option<String>,
    date_time_original: Option<String>,
    user_comment: Option<Vec<u8>>,
    latitude: Option<((u32, u32, u32), char)>,
    longitude: Option<((u32, u32, u32), char)>,
}

impl ExifFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// ImageDescription, written as raw UTF-8 into an ASCII field the way
    /// most editors do.
    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.as_bytes().to_vec());
        self
    }

    pub fn date_time(mut self, value: &str) -> Self {
        self.date_time = Some(value.to_string());
        self
    }

    pub fn date_time_original(mut self, value: &str) -> Self {
        self.date_time_original = Some(value.to_string());
        self
    }

    /// UserComment payload including its 8-byte character code.
    pub fn user_comment(mut self, payload: &[u8]) -> Self {
        self.user_comment = Some(payload.to_vec());
        self
    }

    /// Whole-number DMS triples with their reference letters.
    pub fn gps(
        mut self,
        latitude: (u32, u32, u32),
        lat_ref: char,
        longitude: (u32, u32, u32),
        lng_ref: char,
    ) -> Self {
        self.latitude = Some((latitude, lat_ref));
        self.longitude = Some((longitude, lng_ref));
        self
    }

    /// Only the latitude half of a GPS block.
    pub fn latitude_only(mut self, latitude: (u32, u32, u32), lat_ref: char) -> Self {
        self.latitude = Some((latitude, lat_ref));
        self
    }

    /// Serialize as a little-endian TIFF block.
    pub fn to_tiff(&self) -> Vec<u8> {
        let mut exif_entries = Vec::new();
        if let Some(date) = &self.date_time_original {
            exif_entries.push(Entry::ascii(tags::DATE_TIME_ORIGINAL, date.as_bytes()));
        }
        if let Some(comment) = &self.user_comment {
            exif_entries.push(Entry::undefined(tags::USER_COMMENT, comment));
        }

        let mut gps_entries = Vec::new();
        let dms = |(d, m, s): (u32, u32, u32)| [(d, 1), (m, 1), (s, 1)];
        if let Some((value, reference)) = self.latitude {
            gps_entries.push(Entry::ascii(tags::GPS_LATITUDE_REF, reference.to_string().as_bytes()));
            gps_entries.push(Entry::rationals(tags::GPS_LATITUDE, &dms(value)));
        }
        if let Some((value, reference)) = self.longitude {
            gps_entries.push(Entry::ascii(tags::GPS_LONGITUDE_REF, reference.to_string().as_bytes()));
            gps_entries.push(Entry::rationals(tags::GPS_LONGITUDE, &dms(value)));
        }

        let mut ifd0 = Vec::new();
        if let Some(description) = &self.description {
            ifd0.push(Entry::ascii(tags::IMAGE_DESCRIPTION, description));
        }
        if let Some(date) = &self.date_time {
            ifd0.push(Entry::ascii(tags::DATE_TIME, date.as_bytes()));
        }
        // Pointer values are patched once the IFD0 size is known.
        if !exif_entries.is_empty() {
            ifd0.push(Entry::long(tags::EXIF_IFD, 0));
        }
        if !gps_entries.is_empty() {
            ifd0.push(Entry::long(tags::GPS_IFD, 0));
        }

        let ifd0_offset = 8;
        let exif_offset = ifd0_offset + ifd_len(&ifd0);
        let gps_offset = exif_offset
            + if exif_entries.is_empty() {
                0
            } else {
                ifd_len(&exif_entries)
            };
        for entry in &mut ifd0 {
            match entry.tag {
                tags::EXIF_IFD => entry.data = (exif_offset as u32).to_le_bytes().to_vec(),
                tags::GPS_IFD => entry.data = (gps_offset as u32).to_le_bytes().to_vec(),
                _ => {}
            }
        }

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&(ifd0_offset as u32).to_le_bytes());
        write_ifd(&mut tiff, ifd0_offset, &mut ifd0);
        if !exif_entries.is_empty() {
            write_ifd(&mut tiff, exif_offset, &mut exif_entries);
        }
        if !gps_entries.is_empty() {
            write_ifd(&mut tiff, gps_offset, &mut gps_entries);
        }
        tiff
    }

    /// Insert an `Exif\0\0` APP1 segment right after the SOI marker.
    pub fn splice_into_jpeg(&self, jpeg: &[u8]) -> Vec<u8> {
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
        let tiff = self.to_tiff();
        let segment_len = (2 + 6 + tiff.len()) as u16;

        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }
}

// =========================================================================
// Scripted operator
// =========================================================================

/// A [`Prompt`] that replays canned answers and records every question.
///
/// `None` in the script, or running out of answers, reads as end of input.
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| Some(a.to_string())).collect(),
            questions: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiff_header_is_little_endian() {
        let tiff = ExifFixture::new().description("x").to_tiff();
        assert_eq!(&tiff[..4], b"II\x2A\x00");
        assert_eq!(u32::from_le_bytes(tiff[4..8].try_into().unwrap()), 8);
    }

    #[test]
    fn empty_fixture_has_empty_ifd0() {
        let tiff = ExifFixture::new().to_tiff();
        // header + entry count + next-IFD offset
        assert_eq!(tiff.len(), 8 + 2 + 4);
    }

    #[test]
    fn splice_keeps_jpeg_decodable() {
        let jpeg = ExifFixture::new()
            .description("hello")
            .splice_into_jpeg(&jpeg_bytes(16, 8));
        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (16, 8));
    }

    #[test]
    fn scripted_prompt_runs_out_as_end_of_input() {
        let mut prompt = ScriptedPrompt::new(&["first"]);
        assert_eq!(prompt.ask("q1").unwrap().as_deref(), Some("first"));
        assert_eq!(prompt.ask("q2").unwrap(), None);
        assert_eq!(prompt.questions, vec!["q1", "q2"]);
    }
}
