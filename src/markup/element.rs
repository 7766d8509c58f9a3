//! Attribute-list builder for elements maud cannot express statically.
//!
//! maud's `html!` needs attribute names at compile time, but `data-*`
//! attributes arrive from callers at runtime. [`Tag`] collects name/value
//! pairs in insertion order and renders them with every value escaped, so
//! the output is stable byte for byte for the same inputs.

use super::DataAttributes;
use maud::{Markup, PreEscaped, html};

/// Escape text for use inside a double-quoted attribute or element body.
pub fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

#[derive(Debug, Clone)]
pub struct Tag {
    name: &'static str,
    attrs: Vec<(String, String)>,
}

impl Tag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.attrs.push((name.to_string(), value.as_ref().to_string()));
        self
    }

    /// Add the attribute only when a value is present.
    pub fn attr_opt(self, name: &str, value: Option<impl AsRef<str>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// `class` is dropped entirely when there are no class tokens.
    pub fn class(self, class: &str) -> Self {
        let class = class.split_whitespace().collect::<Vec<_>>().join(" ");
        if class.is_empty() {
            self
        } else {
            self.attr("class", class)
        }
    }

    pub fn data(mut self, data: &DataAttributes) -> Self {
        for (name, value) in data.iter() {
            self.attrs.push((format!("data-{name}"), value.to_string()));
        }
        self
    }

    fn open_tag(&self) -> String {
        let mut out = format!("<{}", self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
        out.push('>');
        out
    }

    /// Render as a void element (`<img>`, `<source>`).
    pub fn void(&self) -> Markup {
        PreEscaped(self.open_tag())
    }

    /// Render as a container around already-rendered children.
    pub fn wrap(&self, children: Markup) -> Markup {
        PreEscaped(format!(
            "{}{}</{}>",
            self.open_tag(),
            children.into_string(),
            self.name
        ))
    }
}
