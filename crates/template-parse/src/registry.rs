//! The process-wide tag registry.
//!
//! `dashmap` gives concurrent readers with serialised writers and
//! atomic single-lookup visibility of writes, exactly the contract
//! §3.5/§5 ask for; `once_cell` lazily installs the built-in tags
//! (`if`/`elif`/`else`/`endif`, `for`/`endfor`, `break`, `continue`)
//! the first time any template is compiled.

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::parser::TagParserFn;
use crate::tags;

/// A concurrency-safe `tag_name -> TagParser` table.
pub struct TagRegistry {
    tags: DashMap<String, TagParserFn>,
}

impl TagRegistry {
    pub fn new() -> Self {
        TagRegistry {
            tags: DashMap::new(),
        }
    }

    /// Registers `parser` under `name`, overwriting any prior entry.
    pub fn register(&self, name: impl Into<String>, parser: TagParserFn) {
        self.tags.insert(name.into(), parser);
    }

    pub fn lookup(&self, name: &str) -> Option<TagParserFn> {
        self.tags.get(name).map(|entry| *entry.value())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// All registered tag names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.tags.remove(name).is_some()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide tag registry, seeded with the built-in tags before
/// any template is compiled.
pub static TAG_REGISTRY: Lazy<TagRegistry> = Lazy::new(|| {
    let registry = TagRegistry::new();
    tags::install_builtins(&registry);
    registry
});

/// Registers a custom tag parser under `name` in the global registry.
pub fn register_tag(name: impl Into<String>, parser: TagParserFn) {
    TAG_REGISTRY.register(name, parser);
}

pub fn lookup_tag(name: &str) -> Option<TagParserFn> {
    TAG_REGISTRY.lookup(name)
}

pub fn has_tag(name: &str) -> bool {
    TAG_REGISTRY.has(name)
}

pub fn list_tags() -> Vec<String> {
    TAG_REGISTRY.list()
}

pub fn unregister_tag(name: &str) -> bool {
    TAG_REGISTRY.unregister(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_installed_on_first_access() {
        assert!(TAG_REGISTRY.has("if"));
        assert!(TAG_REGISTRY.has("for"));
        assert!(TAG_REGISTRY.has("break"));
        assert!(TAG_REGISTRY.has("continue"));
    }

    #[test]
    fn list_is_sorted() {
        let names = TAG_REGISTRY.list();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
