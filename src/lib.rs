//! # respimg
//!
//! Responsive, optionally lazy-loaded image markup from a logical image path
//! and a set of named filters.
//!
//! A template asks for "`uploads/cat.jpg` through `hero_xl`, with a srcset
//! over `hero_md` and `hero_xl`" and gets back a finished `<img>`,
//! `<figure>` or `<picture>` fragment: URLs, `srcset` width descriptors,
//! `width`/`height`, lazy-loading attributes and accessibility wiring. The
//! engine never transforms images itself; rendition URLs point at whatever
//! image service generates them on request.
//!
//! # Pipeline
//!
//! ```text
//! request → PathResolver → UrlResolver + DimensionResolver → markup → HTML
//!              │                        │
//!              └──────── MemoCache ─────┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Render entry points and request types |
//! | [`filters`] | Filter registry: filter name → transformation kind |
//! | [`dimensions`] | Output size of a (path, filter) pair, probing only when needed |
//! | [`resolver`] | Missing or unloadable paths → fallback or default image |
//! | [`cache`] | Process-scoped compute-once memoization |
//! | [`markup`] | Pure HTML builders, importance, data attributes, description ids |
//! | [`naming`] | Size-tier convention in filter names, used by fallback selection |
//! | [`imaging`] | Collaborator traits and the bundled filesystem/header-reading backend |
//! | [`urls`] | Bundled prefix URL resolver |
//! | [`config`] | `respimg.toml` loading, validation and merging |
//! | [`batch`] | Parallel rendering of JSON request lists |
//! | [`types`] | Shared value types (`ImageSize`, `SourceSpec`, …) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Static Sizes First
//!
//! Thumbnail, fixed and crop filters define their output box, so their
//! `width`/`height` come from configuration without opening the image.
//! Only relative resizes read the source, and only its header.
//!
//! ## Collaborators Behind Traits
//!
//! Storage ([`imaging::DataAccess`]), size probing ([`imaging::ImageAccess`])
//! and URL generation ([`imaging::UrlResolver`]) are traits. The bundled
//! implementations make the crate usable on its own; hosts with object
//! storage or an image CDN plug in their own.
//!
//! ## Maud for Escaping
//!
//! Fixed structure (`<noscript>`, `<figcaption>`, description `<div>`) is
//! written with [maud](https://maud.lambda.xyz/). Elements with runtime
//! attribute names (`data-*`) go through a small builder that escapes every
//! value the same way. Caller text never reaches the output unescaped.

pub mod batch;
pub mod cache;
pub mod config;
pub mod dimensions;
pub mod engine;
pub mod filters;
pub mod imaging;
pub mod markup;
pub mod naming;
pub mod output;
pub mod resolver;
pub mod types;
pub mod urls;

pub use engine::{Engine, FigureOptions, ImageRequest, PictureOptions, RenderError};

#[cfg(test)]
pub(crate) mod test_helpers;
