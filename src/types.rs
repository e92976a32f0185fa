//! Types shared between the pipeline and its consumers.
//!
//! [`PhotoRecord`] is the unit of `data.json`, the manifest the map web app
//! loads. Field names and order are part of that contract.

use serde::{Deserialize, Serialize};

/// One geotagged photo in the manifest.
///
/// Serialized with exactly these keys, in this order:
/// `id, lat, lng, thumb, large, originalName, caption`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Source file stem.
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// URL of the thumbnail, e.g. `/photos/IMG_0001_thumb.jpg`.
    pub thumb: String,
    /// URL of the large image.
    pub large: String,
    /// Source file name including extension.
    #[serde(rename = "originalName")]
    pub original_name: String,
    /// Empty when the photo has no caption.
    pub caption: String,
}

/// The full `data.json` document.
pub type Manifest = Vec<PhotoRecord>;
