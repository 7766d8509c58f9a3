//! Shared test utilities for the respimg test suite.
//!
//! Builds engines over the recording mocks in
//! [`imaging::backend::tests`](crate::imaging::backend::tests) with a fixed
//! filter set and a fixed library of "source images".
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let engine = engine();
//! let html = engine.render_img(&ImageRequest::new("cat.jpg", "thumb")).unwrap();
//! ```
//!
//! # Fixtures
//!
//! | Path | Natural size | Notes |
//! |---|---|---|
//! | `cat.jpg` | 100x50 | |
//! | `wide.jpg` | 2000x1000 | |
//! | `corrupt.jpg` | none | loadable, but the size probe fails |
//! | `images/{2560,1280,640,320}.png` | 16:9 at that width | stock fallback assets |
//! | `images/default.png` | 800x600 | |
//!
//! Any other path is not loadable.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::filters::{FilterKind, RelativeResize};
use crate::imaging::backend::tests::{MockDataAccess, MockImageAccess, MockUrlResolver};
use crate::markup::SequentialIdGenerator;
use crate::types::ImageSize;

// =========================================================================
// Fixtures
// =========================================================================

const LOADABLE: &[&str] = &[
    "cat.jpg",
    "wide.jpg",
    "corrupt.jpg",
    "images/2560.png",
    "images/1280.png",
    "images/640.png",
    "images/320.png",
    "images/default.png",
];

/// Filters every engine built here knows.
///
/// | Name | Kind |
/// |---|---|
/// | `thumb` | thumbnail 320x180 |
/// | `tiny` | thumbnail 32x18 |
/// | `square` | fixed 100x100 |
/// | `banner` | crop 1200x400 |
/// | `double` | scale 2 |
/// | `hero_xl` | widen 1280 |
pub fn test_filters() -> Vec<(String, FilterKind)> {
    vec![
        ("thumb".into(), FilterKind::Thumbnail { size: [320, 180] }),
        ("tiny".into(), FilterKind::Thumbnail { size: [32, 18] }),
        (
            "square".into(),
            FilterKind::Fixed {
                width: 100,
                height: 100,
            },
        ),
        (
            "banner".into(),
            FilterKind::Crop {
                size: [1200, 400],
                start: None,
            },
        ),
        (
            "double".into(),
            FilterKind::RelativeResize(RelativeResize::Scale(2.0)),
        ),
        (
            "hero_xl".into(),
            FilterKind::RelativeResize(RelativeResize::Widen(1280)),
        ),
    ]
}

/// Image access knowing the natural sizes of the fixture library.
pub fn mock_images() -> MockImageAccess {
    MockImageAccess::with_sizes(&[
        ("cat.jpg", ImageSize::new(100, 50)),
        ("wide.jpg", ImageSize::new(2000, 1000)),
        ("images/2560.png", ImageSize::new(2560, 1440)),
        ("images/1280.png", ImageSize::new(1280, 720)),
        ("images/640.png", ImageSize::new(640, 360)),
        ("images/320.png", ImageSize::new(320, 180)),
        ("images/default.png", ImageSize::new(800, 600)),
    ])
}

// =========================================================================
// Engines
// =========================================================================

/// Engine with stock config plus the test filters.
pub fn engine() -> Engine {
    engine_with(EngineConfig::default(), Arc::new(mock_images()))
}

/// Engine with `config` (test filters added) over the given image access.
///
/// Ids are sequential (`alt-1`, `alt-2`, …) so markup is predictable.
pub fn engine_with(config: EngineConfig, images: Arc<MockImageAccess>) -> Engine {
    engine_with_urls(config, images, Arc::new(MockUrlResolver::default()))
}

/// Like [`engine_with`], keeping a handle on the URL resolver.
pub fn engine_with_urls(
    mut config: EngineConfig,
    images: Arc<MockImageAccess>,
    urls: Arc<MockUrlResolver>,
) -> Engine {
    config.filters.extend(test_filters());
    Engine::new(
        &config,
        Arc::new(MockDataAccess::with_paths(LOADABLE)),
        images,
        urls,
    )
    .with_id_generator(Arc::new(SequentialIdGenerator::default()))
}
