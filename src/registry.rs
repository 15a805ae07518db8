use std::collections::HashMap;

use crate::desc::TypeDesc;

/// Type identity → definition name. Filled once before generation starts and
/// only read while walking.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    names: HashMap<String, String>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, type)` pairs in order.
    pub fn from_definitions<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a TypeDesc)>,
    {
        let mut registry = Self::new();
        for (name, ty) in definitions {
            registry.register(name, ty);
        }
        registry
    }

    /// Register `ty` under `name`. Wrappers are peeled first, so `Box<T>` and
    /// `Option<T>` register `T`. Only structs have an identity; other types are
    /// ignored. Registering the same struct again replaces its name.
    pub fn register(&mut self, name: &str, ty: &TypeDesc) {
        let Some(key) = ty.struct_key() else {
            log::trace!("definition {name} ({}) has no struct identity", ty.display_name());
            return;
        };
        if let Some(prev) = self.names.insert(key.to_string(), name.to_string()) {
            if prev != name {
                log::debug!("type {key} registered as both {prev} and {name}; using {name}");
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// JSON pointer to the definition for `key`, e.g. `#/definitions/item`.
    pub fn reference(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|name| format!("#/definitions/{name}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
