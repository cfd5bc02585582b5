//! The fixed rendition grid.
//!
//! The transformation pipeline writes every source image as three sizes times two
//! formats into the output bucket, under `{size}/{base}.{format}`. The grid is a
//! process-wide constant and is never configurable per request.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Target resolution of a rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum RenditionSize {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

/// Encoding of a rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RenditionFormat {
    Webp,
    Jpg,
}

/// All sizes, largest first.
pub const RENDITION_SIZES: [RenditionSize; 3] =
    [RenditionSize::P1080, RenditionSize::P720, RenditionSize::P480];

/// All formats, in the order entries are reported for a size.
pub const RENDITION_FORMATS: [RenditionFormat; 2] = [RenditionFormat::Webp, RenditionFormat::Jpg];

impl RenditionSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenditionSize::P1080 => "1080p",
            RenditionSize::P720 => "720p",
            RenditionSize::P480 => "480p",
        }
    }

    /// Pixel dimensions (width, height) the pipeline resizes to.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            RenditionSize::P1080 => (1920, 1080),
            RenditionSize::P720 => (1280, 720),
            RenditionSize::P480 => (854, 480),
        }
    }
}

impl RenditionFormat {
    /// File extension used in the rendition key.
    pub fn extension(&self) -> &'static str {
        match self {
            RenditionFormat::Webp => "webp",
            RenditionFormat::Jpg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            RenditionFormat::Webp => "image/webp",
            RenditionFormat::Jpg => "image/jpeg",
        }
    }
}

impl Display for RenditionSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Display for RenditionFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// Every (size, format) cell of the grid, sizes outermost.
pub fn rendition_grid() -> impl Iterator<Item = (RenditionSize, RenditionFormat)> {
    RENDITION_SIZES
        .into_iter()
        .flat_map(|size| RENDITION_FORMATS.into_iter().map(move |format| (size, format)))
}

/// Source key truncated at its first `.`.
///
/// A key without any `.` is returned unchanged.
pub fn base_name(source_key: &str) -> &str {
    match source_key.find('.') {
        Some(idx) => &source_key[..idx],
        None => source_key,
    }
}

/// Output-bucket key of one rendition: `{size}/{base}.{format}`.
pub fn rendition_key(base: &str, size: RenditionSize, format: RenditionFormat) -> String {
    format!("{}/{}.{}", size.as_str(), base, format.extension())
}

/// Media type guessed from a key's extension, `application/octet-stream` otherwise.
pub fn content_type_for_key(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "webp" => "image/webp",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
