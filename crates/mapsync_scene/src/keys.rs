//! Entity key-value storage.
//!
//! Keys follow map-file conventions: a key with an empty value does not
//! exist, so writing `""` removes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The key holding an entity's class name.
pub const CLASSNAME_KEY: &str = "classname";

/// String key-value pairs attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKeys(BTreeMap<String, String>);

impl EntityKeys {
    /// Create an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Create a key set with only a `classname`.
    #[must_use]
    pub fn with_class(classname: &str) -> Self {
        let mut keys = Self::new();
        keys.set(CLASSNAME_KEY, classname);
        keys
    }

    /// Builder-style [`EntityKeys::set`].
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the value of `key`, or `""` when it is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map_or("", String::as_str)
    }

    /// Returns `true` if `key` is present (and therefore non-empty).
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set `key` to `value`. An empty value removes the key.
    pub fn set(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.0.remove(key);
        } else {
            self.0.insert(key.to_string(), value.to_string());
        }
    }

    /// Returns the entity's class name, or `""`.
    #[must_use]
    pub fn classname(&self) -> &str {
        self.get(CLASSNAME_KEY)
    }

    /// Iterate over all key-value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_reads_empty() {
        let keys = EntityKeys::with_class("func_group");
        assert_eq!(keys.get("origin"), "");
        assert!(!keys.has("origin"));
        assert_eq!(keys.classname(), "func_group");
    }

    #[test]
    fn test_setting_empty_removes() {
        let mut keys = EntityKeys::new().with("angle", "90");
        assert!(keys.has("angle"));
        keys.set("angle", "");
        assert!(!keys.has("angle"));
        assert!(keys.is_empty());
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let keys = EntityKeys::new().with("b", "2").with("a", "1");
        let pairs: Vec<_> = keys.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }
}
