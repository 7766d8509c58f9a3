//! Size-tier parsing for the filter naming convention.
//!
//! Deployments name filters so that the final token hints at the rendition
//! size, and fallback images are picked from that hint rather than from a
//! computed pixel size:
//!
//! - `hero_2x`, `card_large2x` → **retina** (name ends with the retina suffix)
//! - `hero_xl`, `banner_xxl` → **large** (last `_` token in the large set)
//! - `thumb_xs`, `avatar_xxs` → **small** (last `_` token in the small set)
//! - anything else (`card`, `thumb_md`) → **medium**
//!
//! This is an approximation: a filter called `thumb_xl` that actually
//! produces 64px images still gets the large fallback. Check the token
//! vocabulary in `[fallback]` against the filters you actually define.

use crate::config::FallbackConfig;

/// Fallback size tier inferred from a filter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    Retina,
    Large,
    Medium,
    Small,
}

/// Infer the size tier of a filter from its name.
///
/// The retina suffix is checked against the whole name first; otherwise only
/// the last underscore-delimited token is compared with the size-class sets.
pub fn size_tier(filter: &str, convention: &FallbackConfig) -> SizeTier {
    if !convention.retina_suffix.is_empty() && filter.ends_with(&convention.retina_suffix) {
        return SizeTier::Retina;
    }

    let token = filter.rsplit('_').next().unwrap_or(filter);
    if convention.large_tokens.iter().any(|t| t == token) {
        SizeTier::Large
    } else if convention.small_tokens.iter().any(|t| t == token) {
        SizeTier::Small
    } else {
        SizeTier::Medium
    }
}
