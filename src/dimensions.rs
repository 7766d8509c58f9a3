//! Output dimensions of a filtered rendition.
//!
//! Thumbnail, fixed and crop filters pin their output box, so their size
//! comes straight from configuration and no image is ever opened. Relative
//! resizes and `original` filters need the source's natural size: the source is located through
//! [`DataAccess`], its header read through [`ImageAccess`], and the filter's
//! rule applied to the result.
//!
//! Width and height always come from the same origin. A probe that fails,
//! or reports a zero-sized image, yields `None` and the markup omits both
//! attributes rather than guessing one of them.

use crate::cache::MemoCache;
use crate::filters::{FilterRegistry, UnknownFilterError};
use crate::imaging::{DataAccess, ImageAccess};
use crate::types::ImageSize;
use std::sync::Arc;
use tracing::debug;

pub struct DimensionResolver {
    registry: Arc<FilterRegistry>,
    data: Arc<dyn DataAccess>,
    images: Arc<dyn ImageAccess>,
    cache: Arc<MemoCache>,
}

impl DimensionResolver {
    pub fn new(
        registry: Arc<FilterRegistry>,
        data: Arc<dyn DataAccess>,
        images: Arc<dyn ImageAccess>,
        cache: Arc<MemoCache>,
    ) -> Self {
        Self {
            registry,
            data,
            images,
            cache,
        }
    }

    /// Size of `path` rendered through `filter`.
    ///
    /// Only an unknown filter is an error. Results, including `None`, are
    /// memoized per `(path, filter)`, so the natural size of a source is
    /// probed at most once per filter for the life of the cache.
    pub fn resolve(&self, path: &str, filter: &str) -> Result<Option<ImageSize>, UnknownFilterError> {
        let descriptor = self.registry.lookup(filter)?;
        let kind = &descriptor.kind;
        let size = self.cache.dimensions(path, filter, || {
            if !kind.needs_probe() {
                return kind.static_size();
            }
            let natural = self.natural_size(path, filter)?;
            kind.size_from_natural(natural)
        });
        Ok(size)
    }

    /// Width alone, as used by `w` descriptors in a srcset.
    pub fn width(&self, path: &str, filter: &str) -> Result<Option<u32>, UnknownFilterError> {
        Ok(self.resolve(path, filter)?.map(|size| size.width))
    }

    fn natural_size(&self, path: &str, filter: &str) -> Option<ImageSize> {
        let probed = self
            .data
            .find(filter, path)
            .and_then(|binary| self.images.open(&binary));
        match probed {
            Ok(size) if !size.is_empty() => Some(size),
            Ok(size) => {
                debug!(path, filter, %size, "source reports an empty natural size");
                None
            }
            Err(error) => {
                debug!(path, filter, %error, "natural size probe failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterKind, RelativeResize};
    use crate::imaging::backend::tests::{MockDataAccess, MockImageAccess};

    fn registry() -> Arc<FilterRegistry> {
        Arc::new(FilterRegistry::register([
            ("thumb".to_string(), FilterKind::Thumbnail { size: [320, 180] }),
            (
                "avatar".to_string(),
                FilterKind::Fixed {
                    width: 96,
                    height: 96,
                },
            ),
            (
                "banner".to_string(),
                FilterKind::Crop {
                    size: [1200, 400],
                    start: None,
                },
            ),
            (
                "double".to_string(),
                FilterKind::RelativeResize(RelativeResize::Scale(2.0)),
            ),
            (
                "hero_xl".to_string(),
                FilterKind::RelativeResize(RelativeResize::Widen(1280)),
            ),
            (
                "grow".to_string(),
                FilterKind::RelativeResize(RelativeResize::Increase(u32::MAX)),
            ),
            ("webp".to_string(), FilterKind::Original {}),
        ]))
    }

    fn resolver(data: MockDataAccess, images: Arc<MockImageAccess>) -> DimensionResolver {
        DimensionResolver::new(
            registry(),
            Arc::new(data),
            images,
            Arc::new(MemoCache::default()),
        )
    }

    #[test]
    fn static_kinds_never_probe() {
        let images = Arc::new(MockImageAccess::forbidden());
        let r = resolver(MockDataAccess::with_paths(&["a.jpg"]), images);

        assert_eq!(r.resolve("a.jpg", "thumb").unwrap(), Some(ImageSize::new(320, 180)));
        assert_eq!(r.resolve("a.jpg", "avatar").unwrap(), Some(ImageSize::new(96, 96)));
        assert_eq!(r.resolve("a.jpg", "banner").unwrap(), Some(ImageSize::new(1200, 400)));
        // Static sizes do not even need a loadable source
        assert_eq!(r.resolve("missing.jpg", "thumb").unwrap(), Some(ImageSize::new(320, 180)));
    }

    #[test]
    fn scale_doubles_natural_size() {
        let images = Arc::new(MockImageAccess::with_sizes(&[("a.jpg", ImageSize::new(100, 50))]));
        let r = resolver(MockDataAccess::with_paths(&["a.jpg"]), images);
        assert_eq!(r.resolve("a.jpg", "double").unwrap(), Some(ImageSize::new(200, 100)));
    }

    #[test]
    fn repeated_resolves_probe_once() {
        let images = Arc::new(MockImageAccess::with_sizes(&[("a.jpg", ImageSize::new(2000, 1000))]));
        let r = resolver(MockDataAccess::with_paths(&["a.jpg"]), Arc::clone(&images));

        let first = r.resolve("a.jpg", "hero_xl").unwrap();
        let second = r.resolve("a.jpg", "hero_xl").unwrap();
        assert_eq!(first, Some(ImageSize::new(1280, 640)));
        assert_eq!(first, second);
        assert_eq!(images.probe_count(), 1);
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let images = Arc::new(MockImageAccess::forbidden());
        let r = resolver(MockDataAccess::default(), images);
        assert_eq!(
            r.resolve("a.jpg", "nope").unwrap_err(),
            UnknownFilterError("nope".into())
        );
    }

    #[test]
    fn unloadable_source_yields_none() {
        let images = Arc::new(MockImageAccess::default());
        let r = resolver(MockDataAccess::default(), Arc::clone(&images));
        assert_eq!(r.resolve("gone.jpg", "double").unwrap(), None);
        // The data store refused, so the image reader was never reached
        assert_eq!(images.probe_count(), 0);
    }

    #[test]
    fn failed_probe_yields_none_and_is_memoized() {
        // Loadable but not a readable image
        let images = Arc::new(MockImageAccess::default());
        let r = resolver(MockDataAccess::with_paths(&["corrupt.jpg"]), Arc::clone(&images));
        assert_eq!(r.resolve("corrupt.jpg", "double").unwrap(), None);
        assert_eq!(r.resolve("corrupt.jpg", "double").unwrap(), None);
        assert_eq!(images.probe_count(), 1);
    }

    #[test]
    fn zero_natural_size_yields_none() {
        let images = Arc::new(MockImageAccess::with_sizes(&[("empty.png", ImageSize::new(0, 0))]));
        let r = resolver(MockDataAccess::with_paths(&["empty.png"]), images);
        assert_eq!(r.resolve("empty.png", "double").unwrap(), None);
    }

    #[test]
    fn original_filter_reports_natural_size() {
        let images = Arc::new(MockImageAccess::with_sizes(&[("a.jpg", ImageSize::new(640, 480))]));
        let r = resolver(MockDataAccess::with_paths(&["a.jpg"]), Arc::clone(&images));
        assert_eq!(r.resolve("a.jpg", "webp").unwrap(), Some(ImageSize::new(640, 480)));
        assert_eq!(r.resolve("gone.jpg", "webp").unwrap(), None);
        assert_eq!(images.probe_count(), 1);
    }

    #[test]
    fn oversized_increase_degrades_to_none() {
        let images = Arc::new(MockImageAccess::with_sizes(&[("a.jpg", ImageSize::new(100, 50))]));
        let r = resolver(MockDataAccess::with_paths(&["a.jpg"]), images);
        assert_eq!(r.resolve("a.jpg", "grow").unwrap(), None);
    }

    #[test]
    fn width_helper() {
        let images = Arc::new(MockImageAccess::with_sizes(&[("a.jpg", ImageSize::new(100, 50))]));
        let r = resolver(MockDataAccess::with_paths(&["a.jpg"]), images);
        assert_eq!(r.width("a.jpg", "thumb").unwrap(), Some(320));
        assert_eq!(r.width("a.jpg", "double").unwrap(), Some(200));
    }
}
