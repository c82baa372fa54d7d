//! Entity classes.
//!
//! Only the flags that influence how an entity's orientation keys are
//! interpreted are modelled here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Description of one entity class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityClass {
    /// The class name (value of the `classname` key).
    pub name: String,
    /// Point entity with a fixed bounding box (placed by `origin`).
    pub fixedsize: bool,
    /// The class is oriented by angles (e.g. models).
    pub has_angles: bool,
    /// The class declares an `angles` key.
    pub has_angles_key: bool,
    /// The class declares an `angle` key used as a direction, where `-1` and
    /// `-2` mean up and down.
    pub has_direction_key: bool,
}

impl EntityClass {
    /// Create a class with all flags cleared.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mark the class as a fixed-size point entity.
    #[must_use]
    pub fn point(mut self) -> Self {
        self.fixedsize = true;
        self
    }

    /// Mark the class as oriented by angles.
    #[must_use]
    pub fn with_angles(mut self) -> Self {
        self.has_angles = true;
        self
    }

    /// Mark the class as declaring an `angles` key.
    #[must_use]
    pub fn with_angles_key(mut self) -> Self {
        self.has_angles_key = true;
        self
    }

    /// Mark the class as declaring a direction `angle` key.
    #[must_use]
    pub fn with_direction_key(mut self) -> Self {
        self.has_direction_key = true;
        self
    }

    /// Returns `true` if any class flag implies orientation keys.
    #[must_use]
    pub fn supports_angles(&self) -> bool {
        self.has_angles || self.has_angles_key || self.has_direction_key
    }
}

/// Lookup table from class name to [`EntityClass`].
///
/// Unknown class names resolve to a flag-less default class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityClassRegistry {
    classes: HashMap<String, EntityClass>,
    #[serde(skip)]
    fallback: EntityClass,
}

impl EntityClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a class.
    pub fn register(&mut self, class: EntityClass) {
        self.classes.insert(class.name.clone(), class);
    }

    /// Returns the class named `name`, or the default class.
    #[must_use]
    pub fn get(&self, name: &str) -> &EntityClass {
        self.classes.get(name).unwrap_or(&self.fallback)
    }

    /// Returns `true` if a class named `name` was registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_class_has_no_flags() {
        let registry = EntityClassRegistry::new();
        let class = registry.get("does_not_exist");
        assert!(!class.supports_angles());
        assert!(!class.fixedsize);
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EntityClassRegistry::new();
        registry.register(EntityClass::new("info_player_start").point().with_angles());
        assert!(registry.contains("info_player_start"));
        assert!(registry.get("info_player_start").supports_angles());
        assert!(registry.get("info_player_start").fixedsize);
    }
}
