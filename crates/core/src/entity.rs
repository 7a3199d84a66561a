//! Entity trait: identity + continuity across state changes.

/// Anything the backend stores under a primary key (users, companies, audits).
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;

    /// Two snapshots describe the same record, even if their fields differ.
    fn same_record(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// Look up a record by id in a fetched collection.
pub fn find_by_id<T: Entity>(items: &[T], id: T::Id) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

/// Replace the record with the same id, or append it when absent.
///
/// Used when a successful write returns the authoritative server copy.
pub fn upsert<T: Entity>(items: &mut Vec<T>, item: T) {
    match items.iter().position(|existing| existing.same_record(&item)) {
        Some(idx) => items[idx] = item,
        None => items.push(item),
    }
}
