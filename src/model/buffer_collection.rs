use crate::model::buffer::IrcBuffer;
use crate::types::BufferId;
use std::collections::HashMap;

/// Dual-indexed buffer collection for one network.
///
/// The primary index is the lowercased buffer name; the secondary index maps
/// the core-assigned id back onto the name. A buffer whose id is still
/// unassigned ([`BufferId::INVALID`]) is reachable by name only. Every id
/// mutation goes through this type so both indices move together.
#[derive(Debug, Clone, Default)]
pub struct IrcBufferCollection {
    by_name: HashMap<String, IrcBuffer>,
    id_index: HashMap<BufferId, String>,
}

impl IrcBufferCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Insert a buffer, replacing any previous buffer of the same name
    /// (last write wins, as on the wire).
    pub fn insert(&mut self, buffer: IrcBuffer) {
        let key = buffer.name().to_lowercase();
        if let Some(previous) = self.by_name.get(&key)
            && previous.id().is_valid()
        {
            self.id_index.remove(&previous.id());
        }
        if buffer.id().is_valid() {
            self.id_index.insert(buffer.id(), key.clone());
        }
        self.by_name.insert(key, buffer);
    }

    pub fn by_id(&self, id: BufferId) -> Option<&IrcBuffer> {
        let key = self.id_index.get(&id)?;
        self.by_name.get(key)
    }

    pub fn by_id_mut(&mut self, id: BufferId) -> Option<&mut IrcBuffer> {
        let key = self.id_index.get(&id)?;
        self.by_name.get_mut(key)
    }

    pub fn by_name(&self, name: &str) -> Option<&IrcBuffer> {
        self.by_name.get(&name.to_lowercase())
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut IrcBuffer> {
        self.by_name.get_mut(&name.to_lowercase())
    }

    pub fn contains_id(&self, id: BufferId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    pub fn remove_by_id(&mut self, id: BufferId) -> Option<IrcBuffer> {
        let key = self.id_index.remove(&id)?;
        self.by_name.remove(&key)
    }

    pub fn remove_by_name(&mut self, name: &str) -> Option<IrcBuffer> {
        let buffer = self.by_name.remove(&name.to_lowercase())?;
        if buffer.id().is_valid() {
            self.id_index.remove(&buffer.id());
        }
        Some(buffer)
    }

    /// Rename a buffer, atomically re-keying both indices.
    pub fn rename(&mut self, id: BufferId, new_name: &str) -> bool {
        let Some(old_key) = self.id_index.get(&id).cloned() else {
            return false;
        };
        let Some(mut buffer) = self.by_name.remove(&old_key) else {
            return false;
        };
        buffer.set_name(new_name.to_owned());
        let new_key = new_name.to_lowercase();
        self.id_index.insert(id, new_key.clone());
        self.by_name.insert(new_key, buffer);
        true
    }

    /// Assign (or re-assign) a buffer's id, keeping the id index in step.
    /// The buffer is addressed by its current name.
    pub fn assign_id(&mut self, name: &str, id: BufferId) -> bool {
        let key = name.to_lowercase();
        let Some(buffer) = self.by_name.get_mut(&key) else {
            return false;
        };
        if buffer.id().is_valid() {
            self.id_index.remove(&buffer.id());
        }
        buffer.set_id(id);
        if id.is_valid() {
            self.id_index.insert(id, key);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &IrcBuffer> {
        self.by_name.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut IrcBuffer> {
        self.by_name.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.id_index.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkId;

    fn buffer(id: i32, name: &str) -> IrcBuffer {
        let mut b = IrcBuffer::new(NetworkId(1), name);
        if id >= 0 {
            b.set_id(BufferId(id));
        }
        b
    }

    fn assert_dual_index(collection: &IrcBufferCollection) {
        for b in collection.iter() {
            if b.id().is_valid() {
                let via_id = collection.by_id(b.id()).expect("reachable by id");
                assert_eq!(via_id.name(), b.name());
            }
            assert!(collection.by_name(b.name()).is_some(), "reachable by name");
        }
        for id in collection.ids().collect::<Vec<_>>() {
            assert!(collection.by_id(id).is_some());
        }
    }

    #[test]
    fn lookup_by_id_and_case_insensitive_name() {
        let mut collection = IrcBufferCollection::new();
        collection.insert(buffer(10, "#Test"));
        assert!(collection.by_id(BufferId(10)).is_some());
        assert!(collection.by_name("#test").is_some());
        assert!(collection.by_name("#TEST").is_some());
        assert_dual_index(&collection);
    }

    #[test]
    fn pending_buffers_are_not_indexed_by_id() {
        let mut collection = IrcBufferCollection::new();
        collection.insert(buffer(-1, "#pending"));
        assert!(collection.by_name("#pending").is_some());
        assert_eq!(collection.ids().count(), 0);

        assert!(collection.assign_id("#pending", BufferId(42)));
        assert_eq!(collection.by_id(BufferId(42)).unwrap().name(), "#pending");
        assert_dual_index(&collection);
    }

    #[test]
    fn rename_updates_both_indices() {
        let mut collection = IrcBufferCollection::new();
        collection.insert(buffer(10, "#old"));
        assert!(collection.rename(BufferId(10), "#new"));
        assert!(collection.by_name("#old").is_none());
        assert_eq!(collection.by_id(BufferId(10)).unwrap().name(), "#new");
        assert_dual_index(&collection);
    }

    #[test]
    fn reassigning_id_drops_stale_index_entry() {
        let mut collection = IrcBufferCollection::new();
        collection.insert(buffer(10, "#chan"));
        assert!(collection.assign_id("#chan", BufferId(20)));
        assert!(collection.by_id(BufferId(10)).is_none());
        assert_eq!(collection.by_id(BufferId(20)).unwrap().name(), "#chan");
        assert_dual_index(&collection);
    }

    #[test]
    fn remove_by_either_key_clears_both_indices() {
        let mut collection = IrcBufferCollection::new();
        collection.insert(buffer(10, "#a"));
        collection.insert(buffer(11, "#b"));
        assert!(collection.remove_by_id(BufferId(10)).is_some());
        assert!(collection.by_name("#a").is_none());
        assert!(collection.remove_by_name("#B").is_some());
        assert!(collection.by_id(BufferId(11)).is_none());
        assert!(collection.is_empty());
    }

    #[test]
    fn same_name_insert_replaces_and_unindexes_old_id() {
        let mut collection = IrcBufferCollection::new();
        collection.insert(buffer(10, "#chan"));
        collection.insert(buffer(30, "#CHAN"));
        assert!(collection.by_id(BufferId(10)).is_none());
        assert_eq!(collection.by_id(BufferId(30)).unwrap().name(), "#CHAN");
        assert_eq!(collection.len(), 1);
        assert_dual_index(&collection);
    }
}
