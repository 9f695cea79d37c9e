use crate::types::{BufferId, NetworkId};
use crate::value::{Value, VariantMap};
use log::debug;
use std::collections::HashSet;

/// A saved, ordered, filtered chat list.
///
/// Invariant: a buffer id is in at most one of the visible list, the
/// temporarily-removed set and the permanently-removed set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferView {
    pub id: i32,
    pub buffer_view_name: String,
    pub network_id: NetworkId,
    buffer_list: Vec<BufferId>,
    temporarily_removed: HashSet<BufferId>,
    removed: HashSet<BufferId>,
    pub sort_alphabetically: bool,
    pub hide_inactive_buffers: bool,
    pub hide_inactive_networks: bool,
    pub allowed_buffer_types: i32,
    pub add_new_buffers_automatically: bool,
    pub minimum_activity: i32,
    pub disable_decoration: bool,
    pub show_search: bool,
}

impl BufferView {
    pub fn new(id: i32) -> Self {
        BufferView {
            id,
            ..Default::default()
        }
    }

    pub fn from_wire_map(id: i32, map: &VariantMap) -> Self {
        let mut view = BufferView::new(id);
        for (key, value) in map {
            view.apply_field(key, value);
        }
        view
    }

    /// Explicit wire-field table; unknown fields are logged and skipped.
    pub fn apply_field(&mut self, key: &str, value: &Value) {
        match key {
            "bufferViewName" => {
                if let Some(text) = value.as_text() {
                    self.buffer_view_name = text.into_owned();
                }
            }
            "networkId" => {
                if let Some(id) = value.as_network_id() {
                    self.network_id = id;
                }
            }
            "BufferList" => {
                self.buffer_list = id_list(value);
                let visible: HashSet<_> = self.buffer_list.iter().copied().collect();
                self.temporarily_removed.retain(|id| !visible.contains(id));
                self.removed.retain(|id| !visible.contains(id));
            }
            "TemporarilyRemovedBuffers" => {
                for id in id_list(value) {
                    self.hide_temporarily(id);
                }
            }
            "RemovedBuffers" => {
                for id in id_list(value) {
                    self.hide_permanently(id);
                }
            }
            "sortAlphabetically" => {
                self.sort_alphabetically = value.as_bool().unwrap_or(self.sort_alphabetically)
            }
            "hideInactiveBuffers" => {
                self.hide_inactive_buffers = value.as_bool().unwrap_or(self.hide_inactive_buffers)
            }
            "hideInactiveNetworks" => {
                self.hide_inactive_networks =
                    value.as_bool().unwrap_or(self.hide_inactive_networks)
            }
            "allowedBufferTypes" => {
                if let Some(types) = value.as_i64() {
                    self.allowed_buffer_types = types as i32;
                }
            }
            "addNewBuffersAutomatically" => {
                self.add_new_buffers_automatically = value
                    .as_bool()
                    .unwrap_or(self.add_new_buffers_automatically)
            }
            "minimumActivity" => {
                if let Some(activity) = value.as_i64() {
                    self.minimum_activity = activity as i32;
                }
            }
            "disableDecoration" => {
                self.disable_decoration = value.as_bool().unwrap_or(self.disable_decoration)
            }
            "showSearch" => self.show_search = value.as_bool().unwrap_or(self.show_search),
            other => {
                debug!(target: "Session/BufferView", "Ignoring unknown view field '{other}'");
            }
        }
    }

    pub fn buffer_list(&self) -> &[BufferId] {
        &self.buffer_list
    }

    pub fn temporarily_removed(&self) -> &HashSet<BufferId> {
        &self.temporarily_removed
    }

    pub fn removed(&self) -> &HashSet<BufferId> {
        &self.removed
    }

    pub fn is_visible(&self, id: BufferId) -> bool {
        self.buffer_list.contains(&id)
    }

    /// Insert into the visible list at `position` (clamped), clearing the id
    /// from both removal sets first.
    pub fn add_buffer(&mut self, id: BufferId, position: usize) {
        self.unhide(id);
        if self.buffer_list.contains(&id) {
            return;
        }
        let position = position.min(self.buffer_list.len());
        self.buffer_list.insert(position, id);
    }

    /// Reorder a visible buffer. Returns false if the id is not visible.
    pub fn move_buffer(&mut self, id: BufferId, position: usize) -> bool {
        let Some(current) = self.buffer_list.iter().position(|b| *b == id) else {
            return false;
        };
        self.buffer_list.remove(current);
        let position = position.min(self.buffer_list.len());
        self.buffer_list.insert(position, id);
        true
    }

    /// Hide a buffer until the next session (temporary removal).
    pub fn hide_temporarily(&mut self, id: BufferId) {
        self.buffer_list.retain(|b| *b != id);
        self.removed.remove(&id);
        self.temporarily_removed.insert(id);
    }

    /// Hide a buffer permanently.
    pub fn hide_permanently(&mut self, id: BufferId) {
        self.buffer_list.retain(|b| *b != id);
        self.temporarily_removed.remove(&id);
        self.removed.insert(id);
    }

    /// Clear the id from both removal sets. Re-adding to the visible list is
    /// a separate, explicit step.
    pub fn unhide(&mut self, id: BufferId) {
        self.temporarily_removed.remove(&id);
        self.removed.remove(&id);
    }
}

fn id_list(value: &Value) -> Vec<BufferId> {
    value
        .as_list()
        .map(|items| items.iter().filter_map(Value::as_buffer_id).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhide_clears_both_removal_lists() {
        let mut view = BufferView::new(1);
        view.hide_permanently(BufferId(5));
        assert!(view.removed().contains(&BufferId(5)));
        view.unhide(BufferId(5));
        assert!(!view.removed().contains(&BufferId(5)));
        assert!(!view.temporarily_removed().contains(&BufferId(5)));
    }

    #[test]
    fn a_buffer_lives_in_at_most_one_list() {
        let mut view = BufferView::new(1);
        view.add_buffer(BufferId(5), 0);
        view.hide_temporarily(BufferId(5));
        assert!(!view.is_visible(BufferId(5)));
        assert!(view.temporarily_removed().contains(&BufferId(5)));

        view.hide_permanently(BufferId(5));
        assert!(!view.temporarily_removed().contains(&BufferId(5)));
        assert!(view.removed().contains(&BufferId(5)));

        view.add_buffer(BufferId(5), 0);
        assert!(view.is_visible(BufferId(5)));
        assert!(view.removed().is_empty());
        assert!(view.temporarily_removed().is_empty());
    }

    #[test]
    fn move_buffer_reorders() {
        let mut view = BufferView::new(1);
        for id in [1, 2, 3] {
            view.add_buffer(BufferId(id), usize::MAX);
        }
        assert!(view.move_buffer(BufferId(3), 0));
        assert_eq!(
            view.buffer_list(),
            &[BufferId(3), BufferId(1), BufferId(2)]
        );
        assert!(!view.move_buffer(BufferId(9), 0));
    }

    #[test]
    fn wire_map_populates_lists_and_toggles() {
        let mut map = VariantMap::new();
        map.insert("bufferViewName".into(), Value::from("All Chats"));
        map.insert(
            "BufferList".into(),
            Value::List(vec![Value::from(1), Value::from(2)]),
        );
        map.insert(
            "TemporarilyRemovedBuffers".into(),
            Value::List(vec![Value::from(3)]),
        );
        map.insert("RemovedBuffers".into(), Value::List(vec![Value::from(4)]));
        map.insert("sortAlphabetically".into(), Value::Bool(true));
        let view = BufferView::from_wire_map(7, &map);
        assert_eq!(view.id, 7);
        assert_eq!(view.buffer_view_name, "All Chats");
        assert_eq!(view.buffer_list(), &[BufferId(1), BufferId(2)]);
        assert!(view.temporarily_removed().contains(&BufferId(3)));
        assert!(view.removed().contains(&BufferId(4)));
        assert!(view.sort_alphabetically);
    }
}
