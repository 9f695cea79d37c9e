use crate::model::message::IrcMessage;
use crate::types::{BufferId, BufferInfo, BufferType, MsgId, NetworkId};
use std::collections::{BTreeMap, HashMap};

/// Channel membership entry: the mode string a nick holds in one buffer.
/// User data itself lives in the network's user map under the same nick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferMember {
    pub modes: String,
}

impl BufferMember {
    pub fn with_modes(modes: impl Into<String>) -> Self {
        Self {
            modes: modes.into(),
        }
    }

    pub fn add_mode(&mut self, mode: &str) {
        for ch in mode.chars() {
            if !self.modes.contains(ch) {
                self.modes.push(ch);
            }
        }
    }

    pub fn remove_mode(&mut self, mode: &str) {
        self.modes.retain(|ch| !mode.contains(ch));
    }

    pub fn is_owner(&self) -> bool {
        self.modes.contains('q')
    }

    pub fn is_admin(&self) -> bool {
        self.modes.contains('a')
    }

    pub fn is_op(&self) -> bool {
        self.modes.contains('o')
    }

    pub fn is_half_op(&self) -> bool {
        self.modes.contains('h')
    }

    pub fn is_voiced(&self) -> bool {
        self.modes.contains('v')
    }
}

/// One conversation context: channel, query, network status line or group.
#[derive(Debug, Clone, Default)]
pub struct IrcBuffer {
    id: BufferId,
    name: String,
    is_channel: bool,
    pub network: NetworkId,
    pub group: u32,
    pub buffer_type: BufferType,
    pub is_active: bool,
    pub is_status_buffer: bool,
    pub topic: String,
    members: HashMap<String, BufferMember>,
    messages: BTreeMap<MsgId, IrcMessage>,
}

impl IrcBuffer {
    pub fn new(network: NetworkId, name: impl Into<String>) -> Self {
        let mut buffer = IrcBuffer {
            id: BufferId::INVALID,
            network,
            ..Default::default()
        };
        buffer.set_name(name.into());
        buffer
    }

    pub fn from_info(info: &BufferInfo) -> Self {
        let mut buffer = IrcBuffer::new(info.network, info.name.clone());
        buffer.id = info.id;
        buffer.group = info.group;
        buffer.buffer_type = info.buffer_type;
        buffer.is_status_buffer = info.buffer_type == BufferType::Status;
        buffer
    }

    pub fn info(&self) -> BufferInfo {
        BufferInfo {
            id: self.id,
            network: self.network,
            buffer_type: self.buffer_type,
            group: self.group,
            name: self.name.clone(),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: BufferId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the buffer. Channel-ness is derived from the first character.
    pub fn set_name(&mut self, name: String) {
        self.is_channel = matches!(name.chars().next(), Some('#' | '&' | '+' | '!'));
        self.name = name;
    }

    pub fn is_channel(&self) -> bool {
        self.is_channel
    }

    // --- membership ---

    pub fn add_member(&mut self, nick: impl Into<String>, modes: impl Into<String>) {
        self.members
            .insert(nick.into(), BufferMember::with_modes(modes));
    }

    pub fn remove_member(&mut self, nick: &str) -> bool {
        self.members.remove(nick).is_some()
    }

    /// Re-key a membership entry without losing its mode string.
    pub fn rename_member(&mut self, old_nick: &str, new_nick: &str) -> bool {
        match self.members.remove(old_nick) {
            Some(member) => {
                self.members.insert(new_nick.to_owned(), member);
                true
            }
            None => false,
        }
    }

    pub fn member(&self, nick: &str) -> Option<&BufferMember> {
        self.members.get(nick)
    }

    pub fn member_mut(&mut self, nick: &str) -> Option<&mut BufferMember> {
        self.members.get_mut(nick)
    }

    pub fn has_member(&self, nick: &str) -> bool {
        self.members.contains_key(nick)
    }

    pub fn members(&self) -> impl Iterator<Item = (&String, &BufferMember)> {
        self.members.iter()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // --- messages ---

    /// Insert a message keyed by its id. Ids are unique; a re-delivered id
    /// overwrites the stored message.
    pub fn add_message(&mut self, message: IrcMessage) {
        self.messages.insert(message.id, message);
    }

    pub fn message(&self, id: MsgId) -> Option<&IrcMessage> {
        self.messages.get(&id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &IrcMessage> {
        self.messages.values()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn remove_message(&mut self, id: MsgId) -> Option<IrcMessage> {
        self.messages.remove(&id)
    }

    /// Drop all but the `keep` newest messages.
    pub fn trim_messages(&mut self, keep: usize) {
        while self.messages.len() > keep {
            self.messages.pop_first();
        }
    }

    /// Smallest message id currently present.
    pub fn first_message_id(&self) -> Option<MsgId> {
        self.messages.keys().next().copied()
    }

    /// Largest message id currently present.
    pub fn last_message_id(&self) -> Option<MsgId> {
        self.messages.keys().next_back().copied()
    }

    pub(crate) fn take_messages(&mut self) -> BTreeMap<MsgId, IrcMessage> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageFlags, MessageType};
    use chrono::Utc;

    fn msg(id: i32) -> IrcMessage {
        IrcMessage {
            id: MsgId(id),
            timestamp: Utc::now(),
            msg_type: MessageType::PLAIN,
            flags: MessageFlags::empty(),
            buffer: BufferId(1),
            sender: "alice!a@b".into(),
            content: "hi".into(),
        }
    }

    #[test]
    fn channel_flag_follows_name_prefix() {
        let mut buffer = IrcBuffer::new(NetworkId(1), "#rust");
        assert!(buffer.is_channel());
        buffer.set_name("alice".into());
        assert!(!buffer.is_channel());
        for name in ["&local", "+modeless", "!secure"] {
            buffer.set_name(name.into());
            assert!(buffer.is_channel(), "{name} should be a channel");
        }
    }

    #[test]
    fn first_and_last_follow_present_keys() {
        let mut buffer = IrcBuffer::new(NetworkId(1), "#rust");
        for id in [5, 2, 9] {
            buffer.add_message(msg(id));
        }
        assert_eq!(buffer.first_message_id(), Some(MsgId(2)));
        assert_eq!(buffer.last_message_id(), Some(MsgId(9)));

        buffer.remove_message(MsgId(2));
        assert_eq!(buffer.first_message_id(), Some(MsgId(5)));
        buffer.remove_message(MsgId(9));
        assert_eq!(buffer.last_message_id(), Some(MsgId(5)));
    }

    #[test]
    fn trim_drops_oldest_first() {
        let mut buffer = IrcBuffer::new(NetworkId(1), "#rust");
        for id in 1..=5 {
            buffer.add_message(msg(id));
        }
        buffer.trim_messages(2);
        assert_eq!(buffer.first_message_id(), Some(MsgId(4)));
        assert_eq!(buffer.last_message_id(), Some(MsgId(5)));
    }

    #[test]
    fn rename_member_keeps_modes() {
        let mut buffer = IrcBuffer::new(NetworkId(1), "#rust");
        buffer.add_member("alice", "ov");
        assert!(buffer.rename_member("alice", "alice_"));
        let member = buffer.member("alice_").unwrap();
        assert_eq!(member.modes, "ov");
        assert!(member.is_op());
        assert!(member.is_voiced());
        assert!(buffer.member("alice").is_none());
    }

    #[test]
    fn member_mode_edits() {
        let mut member = BufferMember::default();
        member.add_mode("o");
        member.add_mode("o");
        assert_eq!(member.modes, "o");
        member.add_mode("v");
        member.remove_mode("o");
        assert!(!member.is_op());
        assert!(member.is_voiced());
    }
}
