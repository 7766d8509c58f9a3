//! Shared types used across the resolvers and the markup builder.
//!
//! Request-side types deserialize from the JSON accepted by the `batch`
//! command, so they carry serde derives even though the engine itself never
//! serializes them.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Output dimensions of an image rendition.
///
/// Produced by the [`DimensionResolver`](crate::dimensions::DimensionResolver),
/// either entirely from static filter configuration or entirely from a
/// natural-size probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A size with a zero edge carries no usable layout information.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Outcome of path resolution: the path markup should point at, and whether
/// it was substituted for the caller's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub path: String,
    pub is_fallback: bool,
}

impl ResolvedImage {
    pub fn original(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_fallback: false,
        }
    }

    pub fn substitute(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_fallback: true,
        }
    }
}

/// One `<source>` of a `<picture>` element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SourceSpec {
    pub path: String,
    /// Srcset filters; the first one also provides the source's width/height.
    pub filters: Vec<String>,
    pub media: Option<String>,
    pub sizes: Option<String>,
}

impl SourceSpec {
    pub fn new(path: impl Into<String>, filters: &[&str]) -> Self {
        Self {
            path: path.into(),
            filters: filters.iter().map(|f| f.to_string()).collect(),
            media: None,
            sizes: None,
        }
    }

    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    pub fn sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }
}

/// Ordered `<source>` list for a picture.
///
/// Browsers pick the first source whose media query matches, so the order
/// callers supply is kept exactly. Deserializes from a map of
/// `path → [filters]` or `path → { filters, media, sizes }`, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PictureSources(pub Vec<SourceSpec>);

impl PictureSources {
    pub fn iter(&self) -> impl Iterator<Item = &SourceSpec> {
        self.0.iter()
    }
}

impl From<Vec<SourceSpec>> for PictureSources {
    fn from(sources: Vec<SourceSpec>) -> Self {
        Self(sources)
    }
}

/// Per-path payload of a source map entry.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceDataset {
    Filters(Vec<String>),
    Full {
        filters: Vec<String>,
        #[serde(default)]
        media: Option<String>,
        #[serde(default)]
        sizes: Option<String>,
    },
}

impl<'de> Deserialize<'de> for PictureSources {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SourcesVisitor;

        impl<'de> Visitor<'de> for SourcesVisitor {
            type Value = PictureSources;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of source paths to filter lists or source objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut sources = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((path, dataset)) = map.next_entry::<String, SourceDataset>()? {
                    sources.push(match dataset {
                        SourceDataset::Filters(filters) => SourceSpec {
                            path,
                            filters,
                            media: None,
                            sizes: None,
                        },
                        SourceDataset::Full {
                            filters,
                            media,
                            sizes,
                        } => SourceSpec {
                            path,
                            filters,
                            media,
                            sizes,
                        },
                    });
                }
                Ok(PictureSources(sources))
            }
        }

        deserializer.deserialize_map(SourcesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_zero_edge_is_empty() {
        assert!(ImageSize::new(0, 10).is_empty());
        assert!(ImageSize::new(10, 0).is_empty());
        assert!(!ImageSize::new(1, 1).is_empty());
    }

    #[test]
    fn image_size_display() {
        assert_eq!(ImageSize::new(320, 180).to_string(), "320x180");
    }

    #[test]
    fn picture_sources_keep_document_order() {
        let json = r#"{
            "z/wide.jpg": {"filters": ["hero_xl"], "media": "(min-width: 1200px)"},
            "a/narrow.jpg": ["hero_small", "hero_small_2x"]
        }"#;
        let sources: PictureSources = serde_json::from_str(json).unwrap();
        let paths: Vec<&str> = sources.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["z/wide.jpg", "a/narrow.jpg"]);
        assert_eq!(sources.0[0].media.as_deref(), Some("(min-width: 1200px)"));
        assert_eq!(sources.0[1].filters, vec!["hero_small", "hero_small_2x"]);
        assert_eq!(sources.0[1].media, None);
    }

    #[test]
    fn source_spec_builder() {
        let s = SourceSpec::new("a.jpg", &["f1"]).media("(orientation: portrait)").sizes("50vw");
        assert_eq!(s.media.as_deref(), Some("(orientation: portrait)"));
        assert_eq!(s.sizes.as_deref(), Some("50vw"));
    }
}
