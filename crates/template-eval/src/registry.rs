//! The process-wide filter registry (§3.5).
//!
//! Mirrors `template_parse::registry::TagRegistry`: a `DashMap` behind a
//! `once_cell::Lazy` static, giving concurrent lookups with serialized
//! writes. Unlike the tag registry, this one starts empty — concrete
//! filter implementations are out of scope for the core engine, which
//! only defines the contract a filter must satisfy.

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::FilterError;
use crate::value::Value;

/// A filter implementation: takes the input value and its (already
/// display-formatted) argument strings, and returns a transformed value
/// or a categorical [`FilterError`].
pub type FilterFn = fn(&Value, &[String]) -> Result<Value, FilterError>;

pub struct FilterRegistry {
    filters: DashMap<String, FilterFn>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        FilterRegistry {
            filters: DashMap::new(),
        }
    }

    pub fn register(&self, name: impl Into<String>, filter: FilterFn) {
        self.filters.insert(name.into(), filter);
    }

    pub fn lookup(&self, name: &str) -> Option<FilterFn> {
        self.filters.get(name).map(|entry| *entry.value())
    }

    pub fn has(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.filters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.filters.remove(name).is_some()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub static FILTER_REGISTRY: Lazy<FilterRegistry> = Lazy::new(FilterRegistry::new);

pub fn register_filter(name: impl Into<String>, filter: FilterFn) {
    FILTER_REGISTRY.register(name, filter);
}

pub fn lookup_filter(name: &str) -> Option<FilterFn> {
    FILTER_REGISTRY.lookup(name)
}

pub fn has_filter(name: &str) -> bool {
    FILTER_REGISTRY.has(name)
}

pub fn list_filters() -> Vec<String> {
    FILTER_REGISTRY.list()
}

pub fn unregister_filter(name: &str) -> bool {
    FILTER_REGISTRY.unregister(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(value: &Value, _args: &[String]) -> Result<Value, FilterError> {
        Ok(value.clone())
    }

    #[test]
    fn register_then_lookup_then_unregister() {
        let registry = FilterRegistry::new();
        assert!(!registry.has("noop"));
        registry.register("noop", noop as FilterFn);
        assert!(registry.has("noop"));
        assert!(registry.lookup("noop").is_some());
        assert!(registry.unregister("noop"));
        assert!(!registry.has("noop"));
    }

    #[test]
    fn list_is_sorted() {
        let registry = FilterRegistry::new();
        registry.register("zeta", noop as FilterFn);
        registry.register("alpha", noop as FilterFn);
        assert_eq!(registry.list(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
