use crate::{store::entity_store::EntityStore, types::EntityId};

/// Scans every live entity other than `target` for a field that still
/// references it. Returns the first offender as (referencer, field name).
///
/// Run at despawn time so a dangling reference is a loud error at the
/// despawning call site rather than a silently serialized corpse id.
pub fn find_dangling_reference(
    store: &EntityStore,
    target: EntityId,
) -> Option<(EntityId, String)> {
    for (id, entity) in store.iter() {
        if id == target {
            continue;
        }
        if let Some(field) = entity.references(target) {
            return Some((id, field.to_owned()));
        }
    }
    None
}
