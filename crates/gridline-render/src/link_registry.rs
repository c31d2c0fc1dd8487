#![forbid(unsafe_code)]

//! Row link registry.
//!
//! Rows may carry a navigable URL (a "row link"). Cells store a compact
//! 24-bit id instead of the URL; the registry maps ids back to URLs so the
//! host can emit OSC 8 hyperlinks or open the target on activation.
//!
//! ```
//! use gridline_render::link_registry::LinkRegistry;
//!
//! let mut links = LinkRegistry::new();
//! let id = links.register("https://example.com/requests/42");
//! assert_eq!(links.get(id), Some("https://example.com/requests/42"));
//! ```

use std::collections::HashMap;

const MAX_LINK_ID: u32 = 0x00FF_FFFF;

/// URL ↔ id table. Id 0 means "no link".
#[derive(Debug, Clone)]
pub struct LinkRegistry {
    links: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Slot 0 is reserved.
            links: vec![String::new()],
            lookup: HashMap::new(),
        }
    }

    /// Register `url` and return its id. Registering the same URL twice
    /// returns the same id. Returns 0 once the id space is exhausted.
    pub fn register(&mut self, url: &str) -> u32 {
        if let Some(&id) = self.lookup.get(url) {
            return id;
        }
        let id = self.links.len() as u32;
        if id > MAX_LINK_ID {
            return 0;
        }
        self.links.push(url.to_string());
        self.lookup.insert(url.to_string(), id);
        id
    }

    /// URL for `id`.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.links.get(id as usize).map(String::as_str)
    }

    /// Drop every link. Ids handed out earlier become invalid.
    pub fn clear(&mut self) {
        self.links.truncate(1);
        self.lookup.clear();
    }

    /// Number of registered links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len() - 1
    }

    /// Whether no links are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_urls() {
        let mut links = LinkRegistry::new();
        let a = links.register("https://a");
        let b = links.register("https://a");
        assert_eq!(a, b);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn zero_is_no_link() {
        let mut links = LinkRegistry::new();
        links.register("https://a");
        assert_eq!(links.get(0), None);
    }

    #[test]
    fn clear_resets_ids() {
        let mut links = LinkRegistry::new();
        links.register("https://a");
        links.register("https://b");
        links.clear();
        assert!(links.is_empty());
        assert_eq!(links.register("https://c"), 1);
    }
}
