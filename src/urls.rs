//! Bundled [`UrlResolver`]: filtered renditions served from a cache prefix.
//!
//! URLs follow the `{prefix}/{filter}/{path}` layout used by on-demand image
//! caches, e.g. `/media/cache/thumb_small/uploads/cat.jpg`. Whatever serves
//! that prefix is expected to generate the rendition on first request.

use crate::imaging::UrlResolver;

#[derive(Debug, Clone)]
pub struct PrefixUrlResolver {
    prefix: String,
}

impl PrefixUrlResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl UrlResolver for PrefixUrlResolver {
    fn browser_path(&self, path: &str, filter: &str) -> String {
        format!("{}/{}/{}", self.prefix, filter, path.trim_start_matches('/'))
    }
}
