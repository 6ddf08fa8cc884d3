use std::{cell::RefCell, rc::Rc};

use replica_shared::{EntityId, EntityStore};

/// Shared record of lifecycle hook firings. Clone it, hand recorders to a
/// `ProtocolBuilder`, then assert on what fired and for which entities.
#[derive(Clone, Default)]
pub struct HookLog {
    records: Rc<RefCell<Vec<(String, EntityId)>>>,
}

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook closure that records `(label, entity)` each time it fires.
    pub fn recorder(&self, label: &str) -> impl FnMut(&mut EntityStore, EntityId) + 'static {
        let records = Rc::clone(&self.records);
        let label = label.to_owned();
        move |_store, id| records.borrow_mut().push((label.clone(), id))
    }

    /// How many times hooks with this label have fired
    pub fn count(&self, label: &str) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|(recorded, _)| recorded == label)
            .count()
    }

    /// The entities hooks with this label fired for, in firing order
    pub fn ids_for(&self, label: &str) -> Vec<EntityId> {
        self.records
            .borrow()
            .iter()
            .filter(|(recorded, _)| recorded == label)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Drains the full record in firing order
    pub fn take(&self) -> Vec<(String, EntityId)> {
        std::mem::take(&mut *self.records.borrow_mut())
    }
}
