use crate::model::identity::Identity;
use crate::types::{BufferId, MessageFlags, MessageType, MsgId, WireMessage};
use chrono::{DateTime, Utc};
use log::warn;
use regex::RegexBuilder;

/// Which nicks trigger the highlight flag on inbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightMode {
    None,
    #[default]
    CurrentNick,
    AllIdentityNicks,
}

/// One message in a buffer. The core fields are immutable once received; the
/// flags bitmask is re-derived locally (self/highlight).
#[derive(Debug, Clone, PartialEq)]
pub struct IrcMessage {
    pub id: MsgId,
    pub timestamp: DateTime<Utc>,
    pub msg_type: MessageType,
    pub flags: MessageFlags,
    pub buffer: BufferId,
    pub sender: String,
    pub content: String,
}

impl IrcMessage {
    pub fn from_wire(wire: WireMessage) -> Self {
        IrcMessage {
            id: wire.id,
            timestamp: wire.timestamp,
            msg_type: wire.msg_type,
            flags: wire.flags,
            buffer: wire.buffer.id,
            sender: wire.sender,
            content: wire.content,
        }
    }

    /// Nick portion of the sender mask.
    pub fn sender_nick(&self) -> &str {
        self.sender.split('!').next().unwrap_or(&self.sender)
    }

    pub fn is_self(&self) -> bool {
        self.flags.contains(MessageFlags::SELF_MSG)
    }

    /// Highlighted for display. A self message is never highlighted, even if
    /// the highlight bit is set.
    pub fn is_highlighted(&self) -> bool {
        self.flags.contains(MessageFlags::HIGHLIGHT) && !self.is_self()
    }

    /// Re-derive the highlight bit against the network's current nick and the
    /// active identity, per the session's highlight mode.
    ///
    /// Only Plain and Action messages participate; anything else (joins,
    /// server notices, ...) keeps its flags untouched.
    pub fn update_flags(
        &mut self,
        network_nick: Option<&str>,
        identity: Option<&Identity>,
        mode: HighlightMode,
    ) {
        if mode == HighlightMode::None || self.is_self() {
            return;
        }
        if !self
            .msg_type
            .intersects(MessageType::PLAIN | MessageType::ACTION)
        {
            return;
        }

        let mut fragments: Vec<String> = Vec::new();
        match mode {
            HighlightMode::None => return,
            HighlightMode::CurrentNick => {
                let Some(nick) = network_nick.filter(|n| !n.is_empty()) else {
                    return;
                };
                fragments.push(regex::escape(nick));
            }
            HighlightMode::AllIdentityNicks => {
                let Some(identity) = identity.filter(|i| !i.nicks().is_empty()) else {
                    return;
                };
                fragments.extend_from_slice(identity.nick_regex_fragments());
                if let Some(nick) = network_nick.filter(|n| !n.is_empty())
                    && !identity.contains_nick(nick)
                {
                    fragments.push(regex::escape(nick));
                }
            }
        }

        let source = format!(r"(^|\W)(?:{})(\W|$)", fragments.join("|"));
        let regex = match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                warn!(target: "Session/Message", "Highlight regex failed to compile: {e}");
                return;
            }
        };
        if regex.is_match(&self.content) {
            self.flags |= MessageFlags::HIGHLIGHT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdentityId;

    fn plain(content: &str) -> IrcMessage {
        IrcMessage {
            id: MsgId(1),
            timestamp: Utc::now(),
            msg_type: MessageType::PLAIN,
            flags: MessageFlags::empty(),
            buffer: BufferId(1),
            sender: "bob!b@example.org".into(),
            content: content.into(),
        }
    }

    #[test]
    fn current_nick_highlights_on_word_boundary() {
        let mut msg = plain("hey alice!");
        msg.update_flags(Some("alice"), None, HighlightMode::CurrentNick);
        assert!(msg.is_highlighted());
    }

    #[test]
    fn embedded_nick_does_not_highlight() {
        let mut msg = plain("hey alicebob");
        msg.update_flags(Some("alice"), None, HighlightMode::CurrentNick);
        assert!(!msg.is_highlighted());
    }

    #[test]
    fn nick_match_is_case_insensitive() {
        let mut msg = plain("ALICE: ping");
        msg.update_flags(Some("alice"), None, HighlightMode::CurrentNick);
        assert!(msg.is_highlighted());
    }

    #[test]
    fn non_plain_types_never_highlight() {
        let mut msg = plain("alice joined");
        msg.msg_type = MessageType::JOIN;
        msg.update_flags(Some("alice"), None, HighlightMode::CurrentNick);
        assert!(!msg.is_highlighted());
    }

    #[test]
    fn identity_mode_unions_all_nicks() {
        let mut identity = Identity::new(IdentityId(1));
        identity.set_nicks(vec!["ally".into(), "al".into()]);
        let mut msg = plain("ping al?");
        msg.update_flags(Some("alice"), Some(&identity), HighlightMode::AllIdentityNicks);
        assert!(msg.is_highlighted());

        // The network nick joins the alternation when absent from the list.
        let mut msg = plain("ping alice?");
        msg.update_flags(Some("alice"), Some(&identity), HighlightMode::AllIdentityNicks);
        assert!(msg.is_highlighted());
    }

    #[test]
    fn identity_mode_without_nicks_is_a_no_op() {
        let identity = Identity::new(IdentityId(1));
        let mut msg = plain("ping alice?");
        msg.update_flags(Some("alice"), Some(&identity), HighlightMode::AllIdentityNicks);
        assert!(!msg.is_highlighted());
    }

    #[test]
    fn self_messages_are_never_highlighted() {
        let mut msg = plain("note to self: alice");
        msg.flags |= MessageFlags::SELF_MSG;
        msg.update_flags(Some("alice"), None, HighlightMode::CurrentNick);
        assert!(!msg.is_highlighted());
    }
}
