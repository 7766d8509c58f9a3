//! Filter registry: named image transformations and their size semantics.
//!
//! Each filter is exactly one transformation kind. Three kinds pin the output
//! box regardless of the source image, so their dimensions are known from
//! configuration alone. Relative resizes depend on the source's natural size
//! and can only be resolved after probing it. Filters that do not change the
//! size at all (format conversion, metadata stripping) are `original` and
//! report the natural size unchanged.
//!
//! | Kind | Config | Output |
//! |---|---|---|
//! | thumbnail | `thumbnail = { size = [w, h] }` | `w×h` |
//! | fixed | `fixed = { width = w, height = h }` | `w×h` |
//! | crop | `crop = { size = [w, h], start = [x, y] }` | `w×h` |
//! | relative resize | `relative_resize = { widen = w }` (or `heighten`, `increase`, `scale`) | derived from natural size |
//! | original | `original = {}` | natural size |

use crate::imaging::calculations::{heighten, increase, scale, widen};
use crate::types::ImageSize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A filter name was referenced that the registry does not know.
///
/// This is a configuration error: templates and config disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown image filter \"{0}\"")]
pub struct UnknownFilterError(pub String);

/// The transformation a filter applies, as far as output size is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Thumbnail {
        size: [u32; 2],
    },
    Fixed {
        width: u32,
        height: u32,
    },
    Crop {
        size: [u32; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<[u32; 2]>,
    },
    RelativeResize(RelativeResize),
    /// No size-defining transformation.
    Original {},
}

/// Aspect-preserving resize relative to the source's natural size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeResize {
    /// Scale so the width equals the given value.
    Widen(u32),
    /// Scale so the height equals the given value.
    Heighten(u32),
    /// Grow the larger edge by the given number of pixels.
    Increase(u32),
    /// Multiply both edges by the given factor.
    Scale(f64),
}

impl RelativeResize {
    /// Apply the resize to a natural size. `None` when the result has no area.
    pub fn apply(self, natural: ImageSize) -> Option<ImageSize> {
        if natural.is_empty() {
            return None;
        }
        let size = match self {
            RelativeResize::Widen(w) => widen(natural, w),
            RelativeResize::Heighten(h) => heighten(natural, h),
            RelativeResize::Increase(px) => increase(natural, px)?,
            RelativeResize::Scale(factor) => scale(natural, factor),
        };
        (!size.is_empty()).then_some(size)
    }
}

impl FilterKind {
    /// Output size known from configuration alone, without touching the image.
    pub fn static_size(&self) -> Option<ImageSize> {
        match self {
            FilterKind::Thumbnail { size: [w, h] } => Some(ImageSize::new(*w, *h)),
            FilterKind::Fixed { width, height } => Some(ImageSize::new(*width, *height)),
            FilterKind::Crop { size: [w, h], .. } => Some(ImageSize::new(*w, *h)),
            FilterKind::RelativeResize(_) | FilterKind::Original {} => None,
        }
    }

    /// Whether resolving this filter's size needs the source's natural size.
    pub fn needs_probe(&self) -> bool {
        matches!(self, FilterKind::RelativeResize(_) | FilterKind::Original {})
    }

    /// Output size for a source of the given natural size.
    pub fn size_from_natural(&self, natural: ImageSize) -> Option<ImageSize> {
        match self {
            FilterKind::RelativeResize(op) => op.apply(natural),
            FilterKind::Original {} => (!natural.is_empty()).then_some(natural),
            static_kind => static_kind.static_size(),
        }
    }

    /// Check configured values. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            FilterKind::Thumbnail { size: [w, h] } | FilterKind::Crop { size: [w, h], .. } => {
                if *w == 0 || *h == 0 {
                    return Err("size values must be non-zero".into());
                }
            }
            FilterKind::Fixed { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err("width and height must be non-zero".into());
                }
            }
            FilterKind::RelativeResize(op) => match op {
                RelativeResize::Widen(0)
                | RelativeResize::Heighten(0)
                | RelativeResize::Increase(0) => {
                    return Err("relative_resize amount must be positive".into());
                }
                RelativeResize::Scale(f) if !f.is_finite() || *f <= 0.0 => {
                    return Err("relative_resize scale must be a positive number".into());
                }
                _ => {}
            },
            FilterKind::Original {} => {}
        }
        Ok(())
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Thumbnail { size: [w, h] } => write!(f, "thumbnail {w}x{h}"),
            FilterKind::Fixed { width, height } => write!(f, "fixed {width}x{height}"),
            FilterKind::Crop { size: [w, h], .. } => write!(f, "crop {w}x{h}"),
            FilterKind::RelativeResize(op) => match op {
                RelativeResize::Widen(w) => write!(f, "relative_resize widen {w}"),
                RelativeResize::Heighten(h) => write!(f, "relative_resize heighten {h}"),
                RelativeResize::Increase(px) => write!(f, "relative_resize increase {px}"),
                RelativeResize::Scale(s) => write!(f, "relative_resize scale {s}"),
            },
            FilterKind::Original {} => write!(f, "original"),
        }
    }
}

/// A named filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    pub name: String,
    pub kind: FilterKind,
}

/// Read-only lookup table of filters, built once at startup.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterDescriptor>,
}

impl FilterRegistry {
    /// Build the registry. There is no way to add filters afterwards.
    pub fn register(filters: impl IntoIterator<Item = (String, FilterKind)>) -> Self {
        let filters = filters
            .into_iter()
            .map(|(name, kind)| (name.clone(), FilterDescriptor { name, kind }))
            .collect();
        Self { filters }
    }

    pub fn lookup(&self, name: &str) -> Result<&FilterDescriptor, UnknownFilterError> {
        self.filters
            .get(name)
            .ok_or_else(|| UnknownFilterError(name.to_string()))
    }

    /// All filters, sorted by name.
    pub fn descriptors(&self) -> Vec<&FilterDescriptor> {
        let mut all: Vec<&FilterDescriptor> = self.filters.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
