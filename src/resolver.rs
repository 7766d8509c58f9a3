//! Source path resolution with fallback and default-image substitution.
//!
//! Pages routinely reference images that are missing: an empty CMS field,
//! a deleted upload, a path from stale content. Instead of rendering a broken
//! `<img>`, the resolver substitutes a placeholder:
//!
//! 1. A non-empty, loadable path is used unchanged.
//! 2. Otherwise, with fallback enabled, the fallback asset for the filter's
//!    size tier (see [`crate::naming`]).
//! 3. Otherwise, with the default image enabled, the default image.
//! 4. Otherwise [`EmptyPathError`].
//!
//! The substitute is a logical source path like any other: the engine runs
//! it back through the URL and dimension resolvers.

use crate::cache::MemoCache;
use crate::config::{DefaultImageConfig, FallbackConfig};
use crate::imaging::DataAccess;
use crate::naming::size_tier;
use crate::types::ResolvedImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// No usable image path and nothing configured to substitute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("image path is empty or not loadable, and neither fallback nor default image is enabled")]
pub struct EmptyPathError;

pub struct PathResolver {
    data: Arc<dyn DataAccess>,
    cache: Arc<MemoCache>,
    fallback: FallbackConfig,
    default_image: DefaultImageConfig,
}

impl PathResolver {
    pub fn new(
        data: Arc<dyn DataAccess>,
        cache: Arc<MemoCache>,
        fallback: FallbackConfig,
        default_image: DefaultImageConfig,
    ) -> Self {
        Self {
            data,
            cache,
            fallback,
            default_image,
        }
    }

    /// Choose the path markup for `filter` should reference.
    ///
    /// Blank paths count as empty. Loadability is memoized per
    /// `(path, filter)`.
    pub fn resolve_path(
        &self,
        path: Option<&str>,
        filter: &str,
    ) -> Result<ResolvedImage, EmptyPathError> {
        let requested = path.map(str::trim).filter(|p| !p.is_empty());

        if let Some(p) = requested
            && self.is_loadable(p, filter)
        {
            return Ok(ResolvedImage::original(p));
        }

        if self.fallback.enabled {
            let tier = size_tier(filter, &self.fallback);
            let asset = self.fallback.asset_for(tier);
            debug!(requested = ?requested, filter, ?tier, asset, "substituting fallback image");
            return Ok(ResolvedImage::substitute(asset));
        }

        if self.default_image.enabled
            && let Some(default_path) = self.default_image.path.as_deref().filter(|p| !p.is_empty())
        {
            debug!(requested = ?requested, filter, default_path, "substituting default image");
            return Ok(ResolvedImage::substitute(default_path));
        }

        Err(EmptyPathError)
    }

    fn is_loadable(&self, path: &str, filter: &str) -> bool {
        self.cache.loadable(path, filter, || match self.data.find(filter, path) {
            Ok(_) => true,
            Err(error) => {
                debug!(path, filter, %error, "source not loadable");
                false
            }
        })
    }
}
