use crate::renditions::{RenditionFormat, RenditionSize, RENDITION_SIZES};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One rendition that exists in storage, with a time-limited read URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactEntry {
    pub format: RenditionFormat,
    /// Signed read URL
    pub url: String,
}

/// Renditions found per size.
///
/// One field per size so every size is always present on the wire, as an empty
/// list when nothing has been produced yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RenditionsBySize {
    #[serde(rename = "1080p", default)]
    pub p1080: Vec<ArtifactEntry>,
    #[serde(rename = "720p", default)]
    pub p720: Vec<ArtifactEntry>,
    #[serde(rename = "480p", default)]
    pub p480: Vec<ArtifactEntry>,
}

impl RenditionsBySize {
    pub fn get(&self, size: RenditionSize) -> &[ArtifactEntry] {
        match size {
            RenditionSize::P1080 => &self.p1080,
            RenditionSize::P720 => &self.p720,
            RenditionSize::P480 => &self.p480,
        }
    }

    pub fn get_mut(&mut self, size: RenditionSize) -> &mut Vec<ArtifactEntry> {
        match size {
            RenditionSize::P1080 => &mut self.p1080,
            RenditionSize::P720 => &mut self.p720,
            RenditionSize::P480 => &mut self.p480,
        }
    }

    /// Sizes with their entries, largest first.
    pub fn iter(&self) -> impl Iterator<Item = (RenditionSize, &[ArtifactEntry])> + '_ {
        RENDITION_SIZES.into_iter().map(move |size| (size, self.get(size)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, entries)| entries.is_empty())
    }
}

/// Everything currently available for one source key.
///
/// Built fresh for every discovery request and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiscoveryResult {
    /// Signed read URL of the uploaded original, `null` while it is not visible
    pub original: Option<String>,
    #[serde(flatten)]
    pub by_size: RenditionsBySize,
}

impl DiscoveryResult {
    /// True once the original or at least one rendition is available.
    pub fn is_ready(&self) -> bool {
        self.original.is_some() || !self.by_size.is_empty()
    }

    /// The (size, format) cells present, in grid order.
    pub fn available(&self) -> Vec<(RenditionSize, RenditionFormat)> {
        self.by_size
            .iter()
            .flat_map(|(size, entries)| entries.iter().map(move |e| (size, e.format)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_result_serializes_every_size() {
        let value = serde_json::to_value(DiscoveryResult::default()).unwrap();
        assert_eq!(
            value,
            json!({ "original": null, "1080p": [], "720p": [], "480p": [] })
        );
    }

    #[test]
    fn deserializes_wire_shape() {
        let result: DiscoveryResult = serde_json::from_value(json!({
            "original": "https://example.test/cat.png?sig=1",
            "1080p": [{ "format": "webp", "url": "https://example.test/1080p/cat.webp" }],
            "720p": [],
            "480p": []
        }))
        .unwrap();

        assert!(result.is_ready());
        assert_eq!(result.by_size.p1080.len(), 1);
        assert_eq!(
            result.available(),
            vec![(RenditionSize::P1080, RenditionFormat::Webp)]
        );
    }

    #[test]
    fn readiness() {
        let mut result = DiscoveryResult::default();
        assert!(!result.is_ready());

        result.by_size.get_mut(RenditionSize::P480).push(ArtifactEntry {
            format: RenditionFormat::Jpg,
            url: "u".to_string(),
        });
        assert!(result.is_ready());

        let original_only = DiscoveryResult {
            original: Some("u".to_string()),
            ..Default::default()
        };
        assert!(original_only.is_ready());
    }
}
