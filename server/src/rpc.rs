use std::collections::HashMap;

use replica_shared::{ConnectionId, Entity, EntityId, EntityStore, Protocol, Value};

use crate::error::ServerError;

/// Identifies the caller and target of an in-flight RPC invocation.
#[derive(Clone, Copy, Debug)]
pub struct RpcContext {
    /// The connection whose Controller issued the call
    pub connection: ConnectionId,
    /// The entity the call is addressed to (normally that Controller)
    pub target: EntityId,
}

/// Handler invoked for one (type, method) pair. Runs synchronously inside
/// the tick that received the call, so its mutations land in the same
/// tick's outbound deltas.
pub type RpcHandler = Box<dyn FnMut(&mut WorldHandle, RpcContext, &[Value])>;

/// Closed dispatch table from (type name, method name) to handler.
pub struct RpcTable {
    handlers: HashMap<(String, String), RpcHandler>,
}

impl RpcTable {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, type_name: &str, method: &str, handler: RpcHandler) {
        self.handlers
            .insert((type_name.to_owned(), method.to_owned()), handler);
    }

    pub fn get_mut(&mut self, type_name: &str, method: &str) -> Option<&mut RpcHandler> {
        self.handlers
            .get_mut(&(type_name.to_owned(), method.to_owned()))
    }
}

/// Mutation surface handed to RPC handlers and used internally for
/// engine-driven lifecycle (Controller spawn/despawn). Wraps the store so
/// lifecycle hooks and the reference validator run for every path.
pub struct WorldHandle<'a> {
    store: &'a mut EntityStore,
    protocol: &'a mut Protocol,
}

impl<'a> WorldHandle<'a> {
    pub fn new(store: &'a mut EntityStore, protocol: &'a mut Protocol) -> Self {
        Self { store, protocol }
    }

    /// Creates an entity of the named type and fires its on-spawn hook.
    pub fn spawn(
        &mut self,
        type_name: &str,
        initial_fields: &[(&str, Value)],
    ) -> Result<EntityId, ServerError> {
        let entity_type = self.protocol.registry().resolve(type_name)?;
        let id = self.store.create(&entity_type, initial_fields)?;
        self.protocol.invoke_on_spawn(self.store, id);
        Ok(id)
    }

    /// Despawns an entity: validates no references remain, fires the
    /// on-despawn hook, then removes it. The validator runs before the hook
    /// so a rejected despawn never half-fires lifecycle callbacks.
    pub fn despawn(&mut self, id: EntityId) -> Result<(), ServerError> {
        if !self.store.contains(id) {
            return Err(ServerError::Store(replica_shared::StoreError::NotFound {
                id,
            }));
        }
        if let Some((referencer, field)) = replica_shared::find_dangling_reference(self.store, id)
        {
            return Err(ServerError::Store(
                replica_shared::StoreError::DanglingReference {
                    target: id,
                    referencer,
                    field,
                },
            ));
        }
        self.protocol.invoke_on_despawn(self.store, id);
        self.store.destroy(id)?;
        Ok(())
    }

    pub fn set_field(&mut self, id: EntityId, field: &str, value: Value) -> Result<bool, ServerError> {
        Ok(self.store.set_field(id, field, value)?)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    pub fn store(&self) -> &EntityStore {
        self.store
    }
}
