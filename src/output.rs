//! CLI output formatting for the `check` command and batch summaries.
//!
//! # Output Format
//!
//! ```text
//! Filters
//! 001 avatar
//!     Kind: fixed 96x96
//!     Size: 96x96
//! 002 hero_xl
//!     Kind: relative_resize widen 1280
//!     Size: from source
//!
//! Config
//!     Lazy loading: lazy lazy-placeholder lazy-blur
//!     Fallback: disabled
//!     Default image: disabled
//!     URLs: /media/cache/{filter}/{path}
//!     Sources: public
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::config::EngineConfig;
use crate::filters::FilterRegistry;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// One header per filter, sorted by name, with its kind and output size.
pub fn format_filters(registry: &FilterRegistry) -> Vec<String> {
    let mut lines = vec!["Filters".to_string()];
    if registry.is_empty() {
        lines.push(format!("{}(none configured)", indent(1)));
        return lines;
    }
    for (i, descriptor) in registry.descriptors().into_iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), descriptor.name));
        lines.push(format!("{}Kind: {}", indent(1), descriptor.kind));
        let size = match descriptor.kind.static_size() {
            Some(size) => size.to_string(),
            None => "from source".to_string(),
        };
        lines.push(format!("{}Size: {}", indent(1), size));
    }
    lines
}

/// Summary of the non-filter settings.
pub fn format_config(config: &EngineConfig) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];

    let lazy = &config.lazy_load;
    lines.push(if lazy.enabled {
        format!(
            "{}Lazy loading: {} {} {}",
            indent(1),
            lazy.class_selector,
            lazy.placeholder_class_selector,
            lazy.blur_class_selector
        )
    } else {
        format!("{}Lazy loading: disabled", indent(1))
    });

    let fallback = &config.fallback;
    if fallback.enabled {
        lines.push(format!("{}Fallback:", indent(1)));
        let images = &fallback.images;
        lines.push(format!(
            "{}retina (*{}): {}",
            indent(2),
            fallback.retina_suffix,
            images.retina
        ));
        lines.push(format!(
            "{}large ({}): {}",
            indent(2),
            fallback.large_tokens.join(", "),
            images.large
        ));
        lines.push(format!("{}medium: {}", indent(2), images.medium));
        lines.push(format!(
            "{}small ({}): {}",
            indent(2),
            fallback.small_tokens.join(", "),
            images.small
        ));
    } else {
        lines.push(format!("{}Fallback: disabled", indent(1)));
    }

    match (config.default_image.enabled, config.default_image.path.as_deref()) {
        (true, Some(path)) => lines.push(format!("{}Default image: {}", indent(1), path)),
        _ => lines.push(format!("{}Default image: disabled", indent(1))),
    }

    lines.push(format!(
        "{}URLs: {}/{{filter}}/{{path}}",
        indent(1),
        config.urls.cache_prefix.trim_end_matches('/')
    ));
    lines.push(format!("{}Sources: {}", indent(1), config.source.root));
    lines
}

pub fn print_check_output(config: &EngineConfig, registry: &FilterRegistry) {
    for line in format_filters(registry) {
        println!("{}", line);
    }
    println!();
    for line in format_config(config) {
        println!("{}", line);
    }
}

/// One-line batch summary, e.g. `Rendered 12 fragments (1 failed), cache: 30 cached, 6 computed (36 total)`.
pub fn format_batch_summary(rendered: usize, failed: usize, stats: &CacheStats) -> String {
    if failed > 0 {
        format!(
            "Rendered {} fragments ({} failed), cache: {}",
            rendered, failed, stats
        )
    } else {
        format!("Rendered {} fragments, cache: {}", rendered, stats)
    }
}
