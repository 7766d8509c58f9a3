//! Parallel rendering of many fragments with one shared engine.
//!
//! Input is a JSON array of items; output keeps the input order, one
//! outcome per item. Items fail independently: a bad filter in one item
//! does not stop the others.
//!
//! ```json
//! [
//!   { "shape": "img", "image": { "path": "cat.jpg", "filter": "thumb" } },
//!   { "shape": "figure", "lazy": true,
//!     "image": { "path": "cat.jpg", "filter": "hero_xl", "placeholder_filter": "tiny" },
//!     "figure": { "caption": "A cat" } },
//!   { "shape": "picture",
//!     "image": { "path": "cat.jpg", "filter": "thumb" },
//!     "picture": { "sources": { "wide.jpg": { "filters": ["hero_xl"], "media": "(min-width: 1200px)" } } } },
//!   { "shape": "srcset", "image": { "path": "cat.jpg", "srcset_filters": ["thumb", "hero_xl"] } }
//! ]
//! ```
//!
//! Parallelism comes from the global rayon pool; the CLI sizes it from
//! `[processing] max_processes`. All workers share the engine's cache, so a
//! source referenced by many items is probed once.

use crate::engine::{Engine, FigureOptions, ImageRequest, PictureOptions, RenderError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Img,
    Figure,
    Picture,
    Srcset,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchItem {
    pub shape: Shape,
    /// Only meaningful for figures and pictures.
    #[serde(default)]
    pub lazy: bool,
    pub image: ImageRequest,
    #[serde(default)]
    pub figure: FigureOptions,
    #[serde(default)]
    pub picture: PictureOptions,
}

/// Result of one item, serialized as `{"html": …}` or `{"error": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Html { html: String },
    Error { error: String },
}

impl From<Result<String, RenderError>> for BatchOutcome {
    fn from(result: Result<String, RenderError>) -> Self {
        match result {
            Ok(html) => BatchOutcome::Html { html },
            Err(e) => BatchOutcome::Error {
                error: e.to_string(),
            },
        }
    }
}

pub fn parse_batch(json: &str) -> Result<Vec<BatchItem>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Render one item.
pub fn render_item(engine: &Engine, item: &BatchItem) -> Result<String, RenderError> {
    let image = &item.image;
    match (item.shape, item.lazy) {
        (Shape::Img, _) => engine.render_img(image),
        (Shape::Figure, false) => engine.render_figure(image, &item.figure),
        (Shape::Figure, true) => engine.render_figure_lazy(image, &item.figure),
        (Shape::Picture, false) => engine.render_picture(image, &item.picture),
        (Shape::Picture, true) => engine.render_picture_lazy(image, &item.picture),
        (Shape::Srcset, _) => engine.render_srcset(image.path.as_deref(), image.srcset_filters.as_slice()),
    }
}

/// Render every item in parallel, keeping input order.
pub fn render_batch(engine: &Engine, items: &[BatchItem]) -> Vec<BatchOutcome> {
    items
        .par_iter()
        .map(|item| render_item(engine, item).into())
        .collect()
}
