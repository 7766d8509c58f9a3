//! Markup builder: pure functions from resolved values to HTML.
//!
//! Nothing here performs I/O or consults a cache. By the time these
//! functions run, the engine has resolved the path, the URLs, the srcset
//! and the dimensions; the builder only arranges them.
//!
//! | Piece | Eager | Lazy |
//! |---|---|---|
//! | `<img>` | `src`, `srcset`, `sizes` | `src` = placeholder, `data-src`, `data-srcset`, `data-sizes`, lazy class tokens first |
//! | `<source>` | `srcset` | `data-srcset` |
//!
//! Every attribute value and every piece of caller text is escaped.

pub mod element;
pub mod ids;

pub use element::Tag;
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};

use crate::config::LazyLoadConfig;
use crate::types::ImageSize;
use maud::{Markup, PreEscaped, html};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Class of the visually hidden long-description container.
pub const DESCRIPTION_CLASS: &str = "alt-visually-hidden";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("the importance \"{0}\" is not valid, only low and high are accepted")]
pub struct InvalidImportanceError(pub String);

/// Fetch priority hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Low,
    High,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::High => "high",
        }
    }

    /// Parse an optional caller value; `None` means no hint.
    pub fn parse_opt(value: Option<&str>) -> Result<Option<Self>, InvalidImportanceError> {
        value.map(|v| v.parse()).transpose()
    }
}

impl FromStr for Importance {
    type Err = InvalidImportanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Importance::Low),
            "high" => Ok(Importance::High),
            other => Err(InvalidImportanceError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingMode {
    Eager,
    Lazy,
}

/// Ordered `data-*` attributes.
///
/// Names are normalized on insert: lowercased, an optional `data-` prefix
/// stripped, and anything outside `[a-z0-9._-]` removed. A name that is
/// empty after normalization is dropped with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataAttributes(Vec<(String, String)>);

impl DataAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute, keeping the position of the first insert.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let Some(name) = normalize_data_name(name) else {
            warn!(name, "dropping data attribute with unusable name");
            return;
        };
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Pairs of (name without `data-`, value).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn normalize_data_name(name: &str) -> Option<String> {
    let lower = name.trim().to_ascii_lowercase();
    let bare = lower.strip_prefix("data-").unwrap_or(&lower);
    let cleaned: String = bare
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

impl<'de> Deserialize<'de> for DataAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DataVisitor;

        impl<'de> Visitor<'de> for DataVisitor {
            type Value = DataAttributes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of data attribute names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut data = DataAttributes::new();
                while let Some((name, value)) = map.next_entry::<String, String>()? {
                    data.insert(&name, value);
                }
                Ok(data)
            }
        }

        deserializer.deserialize_map(DataVisitor)
    }
}

/// Fully resolved values for one `<img>`.
#[derive(Debug, Clone, Copy)]
pub struct ImgParts<'a> {
    pub alt: &'a str,
    /// Id of the long description; forces `alt=""` when present.
    pub described_by: Option<&'a str>,
    pub class: &'a str,
    pub src: &'a str,
    pub srcset: Option<&'a str>,
    pub sizes: Option<&'a str>,
    pub size: Option<ImageSize>,
    pub importance: Option<Importance>,
    pub data: &'a DataAttributes,
}

impl ImgParts<'_> {
    fn alt_text(&self) -> &str {
        if self.described_by.is_some() {
            ""
        } else {
            self.alt
        }
    }
}

fn with_dimensions(tag: Tag, size: Option<ImageSize>) -> Tag {
    match size {
        Some(size) => tag
            .attr("width", size.width.to_string())
            .attr("height", size.height.to_string()),
        None => tag,
    }
}

/// Eager `<img>`.
pub fn img(parts: &ImgParts<'_>) -> Markup {
    let tag = Tag::new("img")
        .attr("alt", parts.alt_text())
        .attr_opt("aria-describedby", parts.described_by)
        .class(parts.class)
        .attr("src", parts.src)
        .attr_opt("srcset", parts.srcset)
        .attr_opt("sizes", parts.sizes);
    with_dimensions(tag, parts.size)
        .attr_opt("importance", parts.importance.map(Importance::as_str))
        .data(parts.data)
        .void()
}

/// Lazy `<img>`: the placeholder loads first, the loader script swaps in
/// `data-src`, `data-srcset` and `data-sizes`.
pub fn lazy_img(parts: &ImgParts<'_>, placeholder_src: &str, lazy: &LazyLoadConfig) -> Markup {
    let class = format!(
        "{} {} {} {}",
        lazy.class_selector, lazy.placeholder_class_selector, lazy.blur_class_selector, parts.class
    );
    let tag = Tag::new("img")
        .attr("alt", parts.alt_text())
        .attr_opt("aria-describedby", parts.described_by)
        .class(&class)
        .attr("src", placeholder_src)
        .attr("data-src", parts.src)
        .attr_opt("data-srcset", parts.srcset)
        .attr_opt("data-sizes", parts.sizes);
    with_dimensions(tag, parts.size)
        .attr_opt("importance", parts.importance.map(Importance::as_str))
        .data(parts.data)
        .void()
}

/// `<source>` for a picture. `size` is the size of the source's first filter.
pub fn source(
    srcset: &str,
    media: Option<&str>,
    sizes: Option<&str>,
    size: Option<ImageSize>,
    mode: LoadingMode,
) -> Markup {
    let srcset_attr = match mode {
        LoadingMode::Eager => "srcset",
        LoadingMode::Lazy => "data-srcset",
    };
    let tag = Tag::new("source")
        .attr_opt("media", media)
        .attr_opt("sizes", sizes)
        .attr(srcset_attr, srcset);
    with_dimensions(tag, size).void()
}

/// `<figcaption>`, or nothing for an empty caption.
pub fn figcaption(text: Option<&str>, class: &str) -> Markup {
    match text.filter(|t| !t.is_empty()) {
        Some(text) => Tag::new("figcaption").class(class).wrap(html! { (text) }),
        None => PreEscaped(String::new()),
    }
}

pub fn noscript(inner: Markup) -> Markup {
    html! { noscript { (inner) } }
}

/// Visually hidden long description referenced by `aria-describedby`.
pub fn description(id: &str, text: &str) -> Markup {
    html! { div class=(DESCRIPTION_CLASS) id=(id) { (text) } }
}

pub fn figure(class: &str, data: &DataAttributes, content: Markup) -> Markup {
    Tag::new("figure").class(class).data(data).wrap(content)
}

pub fn picture(class: &str, data: &DataAttributes, sources: &[Markup], img: Markup) -> Markup {
    let children = html! {
        @for source in sources { (source) }
        (img)
    };
    Tag::new("picture").class(class).data(data).wrap(children)
}
