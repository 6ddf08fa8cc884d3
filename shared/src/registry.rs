use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

/// Errors raised by schema registration and lookup. These indicate bugs in
/// application code and are never recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registered the same type name twice. Fatal to process initialization.
    #[error("Type `{name}` is already registered; types are process-lifetime and cannot be replaced")]
    DuplicateType { name: String },

    /// Looked up a type name that was never registered
    #[error("Type `{name}` is not registered")]
    UnknownType { name: String },

    /// Addressed a method a type's schema does not declare
    #[error("Type `{type_name}` declares no method `{method}`")]
    UnknownMethod { type_name: String, method: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldDef {
    name: String,
    /// Local fields live only in their owning store and are never replicated.
    local: bool,
}

/// Immutable schema for one registered entity type: a unique name, declared
/// fields, and declared method names. Registered once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: String,
    fields: Vec<FieldDef>,
    methods: Vec<String>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Declares a replicated field.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            local: false,
        });
        self
    }

    /// Declares a field that exists on both peers but is never synced; the
    /// mirror side is free to mutate it.
    pub fn with_local_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            local: true,
        });
        self
    }

    /// Declares a method callable over the RPC channel.
    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Index of a declared field, in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|field| field.name.as_str())
    }

    pub fn field_is_local(&self, index: usize) -> bool {
        self.fields.get(index).map(|field| field.local).unwrap_or(false)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|method| method == name)
    }
}

/// Maps type names to schemas. Shared by both peers so spawn messages can be
/// resolved into correctly-shaped entities.
pub struct TypeRegistry {
    types: HashMap<String, Arc<EntityType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registers a schema. Types are process-lifetime; there is no
    /// unregistration.
    pub fn register(&mut self, entity_type: EntityType) -> Result<(), RegistryError> {
        let name = entity_type.name().to_owned();
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateType { name });
        }
        self.types.insert(name, Arc::new(entity_type));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<EntityType>, RegistryError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownType {
                name: name.to_owned(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
