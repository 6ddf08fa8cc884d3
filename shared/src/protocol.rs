use std::collections::HashMap;

use crate::{
    registry::{EntityType, RegistryError, TypeRegistry},
    store::EntityStore,
    types::EntityId,
};

/// Lifecycle hook fired when an entity spawns or despawns. Receives the
/// owning store and the entity in transition — explicit context rather than
/// a hidden global manager handle.
pub type LifecycleHook = Box<dyn FnMut(&mut EntityStore, EntityId)>;

#[derive(Default)]
struct TypeHooks {
    on_spawn: Option<LifecycleHook>,
    on_despawn: Option<LifecycleHook>,
}

/// Bundles everything both peers must agree on before a connection is
/// useful: the type registry and per-type lifecycle hooks. Built once at
/// startup and handed to the Server/Client constructor.
pub struct Protocol {
    registry: TypeRegistry,
    hooks: HashMap<String, TypeHooks>,
}

impl Protocol {
    pub fn builder() -> ProtocolBuilder {
        ProtocolBuilder {
            types: Vec::new(),
            hooks: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Fires the on-spawn hook for the (live) entity, if one is registered
    pub fn invoke_on_spawn(&mut self, store: &mut EntityStore, id: EntityId) {
        let Some(type_name) = store.get(id).map(|entity| entity.type_name().to_owned()) else {
            return;
        };
        if let Some(hook) = self
            .hooks
            .get_mut(&type_name)
            .and_then(|hooks| hooks.on_spawn.as_mut())
        {
            hook(store, id);
        }
    }

    /// Fires the on-despawn hook for the (still live) entity, if one is
    /// registered. Callers remove the entity afterwards.
    pub fn invoke_on_despawn(&mut self, store: &mut EntityStore, id: EntityId) {
        let Some(type_name) = store.get(id).map(|entity| entity.type_name().to_owned()) else {
            return;
        };
        if let Some(hook) = self
            .hooks
            .get_mut(&type_name)
            .and_then(|hooks| hooks.on_despawn.as_mut())
        {
            hook(store, id);
        }
    }
}

/// Builder for a Protocol. Registration errors (duplicate type names) are
/// reported by `build`, since they are fatal to process initialization.
pub struct ProtocolBuilder {
    types: Vec<EntityType>,
    hooks: HashMap<String, TypeHooks>,
}

impl ProtocolBuilder {
    pub fn add_type(mut self, entity_type: EntityType) -> Self {
        self.types.push(entity_type);
        self
    }

    pub fn on_spawn(
        mut self,
        type_name: &str,
        hook: impl FnMut(&mut EntityStore, EntityId) + 'static,
    ) -> Self {
        self.hooks
            .entry(type_name.to_owned())
            .or_default()
            .on_spawn = Some(Box::new(hook));
        self
    }

    pub fn on_despawn(
        mut self,
        type_name: &str,
        hook: impl FnMut(&mut EntityStore, EntityId) + 'static,
    ) -> Self {
        self.hooks
            .entry(type_name.to_owned())
            .or_default()
            .on_despawn = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<Protocol, RegistryError> {
        let mut registry = TypeRegistry::new();
        for entity_type in self.types {
            registry.register(entity_type)?;
        }
        Ok(Protocol {
            registry,
            hooks: self.hooks,
        })
    }
}
