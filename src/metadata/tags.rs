//! TIFF/EXIF tag IDs the extractor reads.
//!
//! The numbers are fixed by the EXIF 2.3 standard. GPS tags live in the GPS
//! IFD and reuse small numbers, so they only mean anything inside that IFD.

// IFD0
pub const IMAGE_DESCRIPTION: u16 = 0x010E;
pub const DATE_TIME: u16 = 0x0132;
pub const EXIF_IFD: u16 = 0x8769;
pub const GPS_IFD: u16 = 0x8825;

// Exif IFD
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const USER_COMMENT: u16 = 0x9286;

// GPS IFD
pub const GPS_LATITUDE_REF: u16 = 0x0001;
pub const GPS_LATITUDE: u16 = 0x0002;
pub const GPS_LONGITUDE_REF: u16 = 0x0003;
pub const GPS_LONGITUDE: u16 = 0x0004;

/// 8-byte character code prefixes of a UserComment payload.
pub const USER_COMMENT_ASCII: &[u8; 8] = b"ASCII\0\0\0";
pub const USER_COMMENT_UNICODE: &[u8; 8] = b"UNICODE\0";
