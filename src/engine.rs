//! Render entry points.
//!
//! [`Engine`] ties the resolvers to the markup builder. Every entry point
//! runs the same pipeline:
//!
//! ```text
//! importance check → filter check → path resolution → URLs, srcset, size → markup
//! ```
//!
//! Caller errors surface before any lookup: an invalid importance or an
//! unknown filter fails the call without touching storage. Once the inputs
//! are valid, missing images degrade instead of failing (fallback or default
//! substitution, omitted dimensions, skipped srcset candidates), and only a
//! path with nothing to substitute is an error.
//!
//! ## Shapes
//!
//! | Entry point | Output |
//! |---|---|
//! | [`render_img`](Engine::render_img) | `<img>` |
//! | [`render_figure`](Engine::render_figure) | `<figure>` with eager `<img>` and optional `<figcaption>` |
//! | [`render_figure_lazy`](Engine::render_figure_lazy) | `<figure>` with lazy `<img>`, the eager `<img>` in `<noscript>`, optional `<figcaption>` |
//! | [`render_picture`](Engine::render_picture) | `<picture>` with `<source>`s then eager `<img>` |
//! | [`render_picture_lazy`](Engine::render_picture_lazy) | `<picture>` with lazy `<source>`s then lazy `<img>` |
//! | [`render_srcset`](Engine::render_srcset) | bare `srcset` value |
//!
//! When the request carries an HTML alt, one id is drawn per call and the
//! visually hidden description `<div>` follows the outermost element.

use crate::cache::MemoCache;
use crate::config::{EngineConfig, LazyLoadConfig};
use crate::dimensions::DimensionResolver;
use crate::filters::{FilterRegistry, UnknownFilterError};
use crate::imaging::{DataAccess, FileSystemLoader, ImageAccess, RustBackend, UrlResolver};
use crate::markup::{
    self, DataAttributes, IdGenerator, ImgParts, Importance, InvalidImportanceError, LoadingMode,
    RandomIdGenerator,
};
use crate::resolver::{EmptyPathError, PathResolver};
use crate::types::{ImageSize, PictureSources, SourceSpec};
use crate::urls::PrefixUrlResolver;
use maud::{Markup, html};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// `sizes` of figure images when the caller gives none.
pub const DEFAULT_SIZES: &str = "100vw";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    UnknownFilter(#[from] UnknownFilterError),
    #[error(transparent)]
    EmptyPath(#[from] EmptyPathError),
    #[error(transparent)]
    InvalidImportance(#[from] InvalidImportanceError),
}

/// The image itself: shared by every shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageRequest {
    /// Logical source path. Empty or absent triggers substitution.
    pub path: Option<String>,
    /// Filter for `src` and for `width`/`height`.
    pub filter: String,
    /// Filter for the low-quality `src` of lazy images.
    pub placeholder_filter: Option<String>,
    pub srcset_filters: Vec<String>,
    pub alt: String,
    pub class: String,
    pub sizes: Option<String>,
    /// `low` or `high`; anything else is rejected.
    pub importance: Option<String>,
    pub data: DataAttributes,
    /// Long description rendered as a hidden, referenced `<div>`.
    pub html_alt: Option<String>,
}

impl ImageRequest {
    pub fn new(path: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            filter: filter.into(),
            ..Self::default()
        }
    }

    pub fn srcset(mut self, filters: &[&str]) -> Self {
        self.srcset_filters = filters.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn placeholder(mut self, filter: impl Into<String>) -> Self {
        self.placeholder_filter = Some(filter.into());
        self
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn importance(mut self, importance: impl Into<String>) -> Self {
        self.importance = Some(importance.into());
        self
    }

    pub fn data(mut self, name: &str, value: impl Into<String>) -> Self {
        self.data.insert(name, value);
        self
    }

    pub fn html_alt(mut self, text: impl Into<String>) -> Self {
        self.html_alt = Some(text.into());
        self
    }
}

/// Decorations of the `<figure>` wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FigureOptions {
    pub class: String,
    pub data: DataAttributes,
    pub caption: Option<String>,
    pub caption_class: String,
}

/// Decorations and sources of the `<picture>` wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PictureOptions {
    pub class: String,
    pub data: DataAttributes,
    pub sources: PictureSources,
}

/// Everything resolved for the primary image of a request.
struct Resolved {
    importance: Option<Importance>,
    src: String,
    placeholder_src: Option<String>,
    srcset: Option<String>,
    size: Option<ImageSize>,
    description_id: Option<String>,
}

impl Resolved {
    fn parts<'a>(&'a self, request: &'a ImageRequest, sizes: Option<&'a str>) -> ImgParts<'a> {
        ImgParts {
            alt: &request.alt,
            described_by: self.description_id.as_deref(),
            class: &request.class,
            src: &self.src,
            srcset: self.srcset.as_deref(),
            sizes,
            size: self.size,
            importance: self.importance,
            data: &request.data,
        }
    }

    /// Placeholder URL, or the real URL when no placeholder filter was given.
    fn placeholder(&self) -> &str {
        self.placeholder_src.as_deref().unwrap_or(&self.src)
    }
}

pub struct Engine {
    registry: Arc<FilterRegistry>,
    cache: Arc<MemoCache>,
    paths: PathResolver,
    dimensions: DimensionResolver,
    urls: Arc<dyn UrlResolver>,
    ids: Arc<dyn IdGenerator>,
    lazy: LazyLoadConfig,
}

impl Engine {
    /// Build an engine over host-provided collaborators.
    pub fn new(
        config: &EngineConfig,
        data: Arc<dyn DataAccess>,
        images: Arc<dyn ImageAccess>,
        urls: Arc<dyn UrlResolver>,
    ) -> Self {
        let registry = Arc::new(config.filter_registry());
        let cache = Arc::new(MemoCache::new(config.cache.max_entries));
        let paths = PathResolver::new(
            Arc::clone(&data),
            Arc::clone(&cache),
            config.fallback.clone(),
            config.default_image.clone(),
        );
        let dimensions =
            DimensionResolver::new(Arc::clone(&registry), data, images, Arc::clone(&cache));
        Self {
            registry,
            cache,
            paths,
            dimensions,
            urls,
            ids: Arc::new(RandomIdGenerator::default()),
            lazy: config.lazy_load.clone(),
        }
    }

    /// Build an engine over the bundled filesystem loader, header reader
    /// and prefix URL resolver.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config,
            Arc::new(FileSystemLoader::new(&config.source.root)),
            Arc::new(RustBackend::new()),
            Arc::new(PrefixUrlResolver::new(&config.urls.cache_prefix)),
        )
    }

    /// Replace the id generator used for long-description ids.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Eager `<img>`, identical to the image inside a figure for the same
    /// request (including the `sizes` default).
    pub fn render_img(&self, request: &ImageRequest) -> Result<String, RenderError> {
        let resolved = self.resolve(request, &[])?;
        let img = markup::img(&resolved.parts(request, figure_sizes(request)));
        Ok(with_description(img, request, &resolved).into_string())
    }

    pub fn render_figure(
        &self,
        request: &ImageRequest,
        options: &FigureOptions,
    ) -> Result<String, RenderError> {
        let resolved = self.resolve(request, &[])?;
        let parts = resolved.parts(request, figure_sizes(request));
        let content = html! {
            (markup::img(&parts))
            (markup::figcaption(options.caption.as_deref(), &options.caption_class))
        };
        let figure = markup::figure(&options.class, &options.data, content);
        Ok(with_description(figure, request, &resolved).into_string())
    }

    /// Lazy figure. With lazy loading disabled this renders [`render_figure`](Self::render_figure).
    pub fn render_figure_lazy(
        &self,
        request: &ImageRequest,
        options: &FigureOptions,
    ) -> Result<String, RenderError> {
        if !self.lazy.enabled {
            debug!(filter = %request.filter, "lazy loading disabled, rendering eager figure");
            return self.render_figure(request, options);
        }
        let resolved = self.resolve(request, &[])?;
        let parts = resolved.parts(request, figure_sizes(request));
        let content = html! {
            (markup::lazy_img(&parts, resolved.placeholder(), &self.lazy))
            (markup::noscript(markup::img(&parts)))
            (markup::figcaption(options.caption.as_deref(), &options.caption_class))
        };
        let figure = markup::figure(&options.class, &options.data, content);
        Ok(with_description(figure, request, &resolved).into_string())
    }

    pub fn render_picture(
        &self,
        request: &ImageRequest,
        options: &PictureOptions,
    ) -> Result<String, RenderError> {
        self.picture(request, options, LoadingMode::Eager)
    }

    /// Lazy picture. With lazy loading disabled this renders [`render_picture`](Self::render_picture).
    pub fn render_picture_lazy(
        &self,
        request: &ImageRequest,
        options: &PictureOptions,
    ) -> Result<String, RenderError> {
        if !self.lazy.enabled {
            debug!(filter = %request.filter, "lazy loading disabled, rendering eager picture");
            return self.render_picture(request, options);
        }
        self.picture(request, options, LoadingMode::Lazy)
    }

    /// Bare srcset value for `path` across `filters`.
    ///
    /// The path is resolved with the first filter. An empty filter list
    /// yields an empty string, as does a list whose widths are all unknown.
    pub fn render_srcset<S: AsRef<str>>(
        &self,
        path: Option<&str>,
        filters: &[S],
    ) -> Result<String, RenderError> {
        let Some(first) = filters.first() else {
            return Ok(String::new());
        };
        for filter in filters {
            self.registry.lookup(filter.as_ref())?;
        }
        let resolved = self.paths.resolve_path(path, first.as_ref())?;
        Ok(self.srcset(&resolved.path, filters)?.unwrap_or_default())
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    fn picture(
        &self,
        request: &ImageRequest,
        options: &PictureOptions,
        mode: LoadingMode,
    ) -> Result<String, RenderError> {
        let sources: Vec<&SourceSpec> = options.sources.iter().collect();
        let resolved = self.resolve(request, &sources)?;

        let mut source_markup = Vec::with_capacity(sources.len());
        for spec in &sources {
            if let Some(source) = self.source(spec, mode)? {
                source_markup.push(source);
            }
        }

        let parts = resolved.parts(request, request.sizes.as_deref());
        let img = match mode {
            LoadingMode::Eager => markup::img(&parts),
            LoadingMode::Lazy => markup::lazy_img(&parts, resolved.placeholder(), &self.lazy),
        };
        let picture = markup::picture(&options.class, &options.data, &source_markup, img);
        Ok(with_description(picture, request, &resolved).into_string())
    }

    /// Validate the request, then resolve everything the primary image needs.
    ///
    /// `sources` are only validated here; they are resolved per source.
    fn resolve(
        &self,
        request: &ImageRequest,
        sources: &[&SourceSpec],
    ) -> Result<Resolved, RenderError> {
        let importance = Importance::parse_opt(request.importance.as_deref())?;
        self.check_filters(request, sources)?;

        let image = self
            .paths
            .resolve_path(request.path.as_deref(), &request.filter)?;
        let path = image.path.as_str();
        let src = self.browser_path(path, &request.filter);
        if image.is_fallback {
            debug!(requested = ?request.path, %src, "rendering substitute image");
        }
        let placeholder_src = request
            .placeholder_filter
            .as_deref()
            .map(|filter| self.browser_path(path, filter));
        let srcset = self.srcset(path, &request.srcset_filters)?;
        let size = self.dimensions.resolve(path, &request.filter)?;
        let description_id = request
            .html_alt
            .as_deref()
            .is_some_and(|text| !text.is_empty())
            .then(|| self.ids.next_id());

        Ok(Resolved {
            importance,
            src,
            placeholder_src,
            srcset,
            size,
            description_id,
        })
    }

    fn check_filters(
        &self,
        request: &ImageRequest,
        sources: &[&SourceSpec],
    ) -> Result<(), UnknownFilterError> {
        let source_filters = sources.iter().flat_map(|s| s.filters.iter());
        std::iter::once(&request.filter)
            .chain(request.placeholder_filter.iter())
            .chain(request.srcset_filters.iter())
            .chain(source_filters)
            .try_for_each(|filter| self.registry.lookup(filter).map(|_| ()))
    }

    /// One `<source>`, or `None` when it would have an empty srcset.
    fn source(&self, spec: &SourceSpec, mode: LoadingMode) -> Result<Option<Markup>, RenderError> {
        let Some(first) = spec.filters.first() else {
            debug!(path = %spec.path, "skipping picture source without filters");
            return Ok(None);
        };
        let resolved = self.paths.resolve_path(Some(spec.path.as_str()), first)?;
        let Some(srcset) = self.srcset(&resolved.path, &spec.filters)? else {
            debug!(path = %resolved.path, "skipping picture source with no usable srcset candidate");
            return Ok(None);
        };
        let size = self.dimensions.resolve(&resolved.path, first)?;
        Ok(Some(markup::source(
            &srcset,
            spec.media.as_deref(),
            spec.sizes.as_deref(),
            size,
            mode,
        )))
    }

    /// `url Nw` candidates joined by `", "`. Candidates whose width is
    /// unknown are skipped; `None` when nothing remains.
    fn srcset<S: AsRef<str>>(
        &self,
        path: &str,
        filters: &[S],
    ) -> Result<Option<String>, UnknownFilterError> {
        let mut candidates = Vec::with_capacity(filters.len());
        for filter in filters {
            let filter = filter.as_ref();
            match self.dimensions.width(path, filter)? {
                Some(width) => {
                    candidates.push(format!("{} {}w", self.browser_path(path, filter), width));
                }
                None => debug!(path, filter, "skipping srcset candidate without a known width"),
            }
        }
        Ok((!candidates.is_empty()).then(|| candidates.join(", ")))
    }

    fn browser_path(&self, path: &str, filter: &str) -> String {
        self.cache
            .url(path, filter, || self.urls.browser_path(path, filter))
    }
}

fn figure_sizes(request: &ImageRequest) -> Option<&str> {
    Some(request.sizes.as_deref().unwrap_or(DEFAULT_SIZES))
}

/// Append the hidden long description after `outer`, when the call drew an id.
fn with_description(outer: Markup, request: &ImageRequest, resolved: &Resolved) -> Markup {
    match (&resolved.description_id, request.html_alt.as_deref()) {
        (Some(id), Some(text)) => html! { (outer) (markup::description(id, text)) },
        _ => outer,
    }
}
