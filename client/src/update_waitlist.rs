use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use replica_shared::{EntityId, Value};

/// Holds updates that arrived before the spawn of the entity they address.
/// A bounded gap-skip upstream can legitimately deliver an update first;
/// buffered fields are applied when the spawn lands. Entries whose spawn
/// never arrives are dropped once their TTL lapses, the TTL counting from
/// the first buffered update.
pub struct UpdateWaitlist {
    ttl: Duration,
    pending: HashMap<EntityId, PendingUpdates>,
}

struct PendingUpdates {
    fields: Vec<(String, Value)>,
    deadline: Instant,
}

impl UpdateWaitlist {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: HashMap::new(),
        }
    }

    /// Buffers an update batch. A later value for an already-buffered field
    /// supersedes the earlier one.
    pub fn buffer(&mut self, id: EntityId, fields: Vec<(String, Value)>) {
        let entry = self.pending.entry(id).or_insert_with(|| PendingUpdates {
            fields: Vec::new(),
            deadline: Instant::now() + self.ttl,
        });
        for (field, value) in fields {
            if let Some(slot) = entry.fields.iter_mut().find(|(name, _)| *name == field) {
                slot.1 = value;
            } else {
                entry.fields.push((field, value));
            }
        }
    }

    /// Removes and returns whatever was buffered for `id`, oldest field
    /// first.
    pub fn take(&mut self, id: EntityId) -> Option<Vec<(String, Value)>> {
        self.pending.remove(&id).map(|entry| entry.fields)
    }

    /// Drops any buffer for `id`, e.g. when a despawn for it arrives.
    pub fn discard(&mut self, id: EntityId) {
        self.pending.remove(&id);
    }

    /// Drops entries past their deadline and returns their ids.
    pub fn expire(&mut self) -> Vec<EntityId> {
        let now = Instant::now();
        let mut expired: Vec<EntityId> = self
            .pending
            .iter()
            .filter(|(_, entry)| now >= entry.deadline)
            .map(|(id, _)| *id)
            .collect();
        expired.sort();
        for id in &expired {
            self.pending.remove(id);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
