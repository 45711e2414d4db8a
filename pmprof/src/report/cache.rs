//! Cache dumps.

use super::{Renderer, DISABLED_MARKER};
use crate::cache::CacheSnapshot;

impl Renderer<'_> {
    /// Dump of one cache's objects in insertion order.
    ///
    /// ```text
    /// Cache: requests  --  Profile: orders
    ///
    /// (objectKey=first  ts=03/04/2021 01:05:09:7)
    /// GET /orders/17
    /// ```
    pub fn cache(&self, cache: &CacheSnapshot) -> String {
        if !self.enabled {
            return DISABLED_MARKER.to_string();
        }
        if cache.objects.is_empty() {
            return String::new();
        }

        let mut out = format!("Cache: {}  --  Profile: {}\n", cache.name, cache.profile);
        for object in &cache.objects {
            if self.options.cache_object_header {
                out.push_str(&format!(
                    "\n(objectKey={}  ts={})",
                    object.key(),
                    self.host.format_timestamp(object.timestamp())
                ));
            }
            out.push('\n');
            out.push_str(&object.value().to_string());
            out.push('\n');
        }
        out
    }

    /// Dumps of several caches sorted by (profile, cache), separated by a
    /// blank line. Caches without objects are left out.
    pub fn caches(&self, mut caches: Vec<CacheSnapshot>) -> String {
        if !self.enabled {
            return DISABLED_MARKER.to_string();
        }
        caches.sort_by(|a, b| a.profile.cmp(&b.profile).then_with(|| a.name.cmp(&b.name)));
        caches
            .iter()
            .map(|cache| self.cache(cache))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
