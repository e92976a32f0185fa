//! Text recovery for caption fields.
//!
//! Captions reach us in three shapes, each with its own failure mode:
//!
//! - **ASCII fields holding UTF-8.** Most editors write UTF-8 into
//!   `ImageDescription` even though the type says ASCII. Read back one byte per
//!   char, "Café" turns into "CafÃ©". [`repair_mojibake`] reverses that.
//! - **Raw byte payloads.** Decoded as UTF-8, dropping invalid sequences.
//! - **UserComment blocks.** An 8-byte character-code prefix selects the
//!   encoding of the remainder ([`decode_user_comment`]).

use super::tags::{USER_COMMENT_ASCII, USER_COMMENT_UNICODE};
use thiserror::Error;

/// Why a caption tier produced no text.
///
/// None of these reach the caller of [`extract_caption`](super::extract_caption);
/// they only drive the fallback to the next tier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("tag 0x{0:04X} not present")]
    MissingTag(u16),
    #[error("tag 0x{tag:04X} holds {kind}, expected text or bytes")]
    UnexpectedType { tag: u16, kind: &'static str },
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid UTF-16 sequence")]
    Utf16,
    #[error("UTF-16 payload has odd length {0}")]
    OddUtf16Length(usize),
    #[error("decoded text is blank")]
    Blank,
}

/// Undo a Latin-1 decode of UTF-8 bytes.
///
/// If every char fits in one byte and the resulting bytes are valid UTF-8,
/// returns the re-decoded string. Otherwise returns the input unchanged, so
/// plain ASCII and genuine Latin-1 text pass through.
pub fn repair_mojibake(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let bytes: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(c).ok()).collect();
    match bytes.map(String::from_utf8) {
        Some(Ok(repaired)) => repaired,
        _ => text.to_string(),
    }
}

/// Decode UTF-8, silently dropping invalid byte sequences.
pub fn decode_utf8_ignoring_errors(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Decode UTF-16, honoring a byte-order mark and defaulting to little endian.
pub fn decode_utf16(bytes: &[u8]) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddUtf16Length(bytes.len()));
    }
    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        _ => (false, bytes),
    };
    let units = body.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(pair)
        } else {
            u16::from_le_bytes(pair)
        }
    });
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| DecodeError::Utf16)
}

/// Decode a UserComment payload according to its 8-byte character code.
///
/// - `ASCII\0\0\0` → strict UTF-8 of the remainder
/// - `UNICODE\0` → UTF-16 of the remainder
/// - anything else → UTF-8 of the remainder, ignoring errors
///
/// Payloads shorter than the prefix are decoded whole, ignoring errors.
pub fn decode_user_comment(bytes: &[u8]) -> Result<String, DecodeError> {
    if bytes.len() < 8 {
        return Ok(decode_utf8_ignoring_errors(bytes));
    }
    let (prefix, rest) = bytes.split_at(8);
    if prefix == USER_COMMENT_ASCII {
        Ok(String::from_utf8(rest.to_vec())?)
    } else if prefix == USER_COMMENT_UNICODE {
        decode_utf16(rest)
    } else {
        Ok(decode_utf8_ignoring_errors(rest))
    }
}

/// Trim whitespace and the NUL padding EXIF writers leave behind; reject blanks.
pub fn clean(text: &str) -> Result<String, DecodeError> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if trimmed.is_empty() {
        Err(DecodeError::Blank)
    } else {
        Ok(trimmed.to_string())
    }
}
