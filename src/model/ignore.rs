use crate::model::message::IrcMessage;
use crate::model::pattern::compile_rule;
use crate::types::MessageType;
use crate::value::{Value, VariantMap};
use log::warn;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum IgnoreType {
    #[default]
    Sender = 0,
    Message = 1,
    Ctcp = 2,
}

impl IgnoreType {
    pub fn from_wire(raw: i64) -> IgnoreType {
        match raw {
            1 => IgnoreType::Message,
            2 => IgnoreType::Ctcp,
            _ => IgnoreType::Sender,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Strictness {
    #[default]
    Unmatched = 0,
    Soft = 1,
    Hard = 2,
}

impl Strictness {
    pub fn from_wire(raw: i64) -> Strictness {
        match raw {
            1 => Strictness::Soft,
            2 => Strictness::Hard,
            _ => Strictness::Unmatched,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum IgnoreScope {
    #[default]
    Global = 0,
    Network = 1,
    Channel = 2,
}

impl IgnoreScope {
    pub fn from_wire(raw: i64) -> IgnoreScope {
        match raw {
            1 => IgnoreScope::Network,
            2 => IgnoreScope::Channel,
            _ => IgnoreScope::Global,
        }
    }
}

/// One ignore rule. Both patterns are compiled eagerly; a rule whose pattern
/// fails to compile is deactivated instead of poisoning the whole list.
#[derive(Debug, Clone)]
pub struct IgnoreItem {
    pub ignore_type: IgnoreType,
    pub ignore_rule: String,
    pub is_regex: bool,
    pub strictness: Strictness,
    pub scope: IgnoreScope,
    pub scope_rule: String,
    pub is_active: bool,
    rule_regex: Option<Regex>,
    scope_regex: Option<Regex>,
}

impl IgnoreItem {
    pub fn new(
        ignore_type: IgnoreType,
        ignore_rule: impl Into<String>,
        is_regex: bool,
        strictness: Strictness,
        scope: IgnoreScope,
        scope_rule: impl Into<String>,
        is_active: bool,
    ) -> Self {
        let mut item = IgnoreItem {
            ignore_type,
            ignore_rule: ignore_rule.into(),
            is_regex,
            strictness,
            scope,
            scope_rule: scope_rule.into(),
            is_active,
            rule_regex: None,
            scope_regex: None,
        };
        item.compile();
        item
    }

    /// (Re)compile both patterns. Called on construction and after any rule
    /// mutation; a compile failure deactivates the rule.
    pub fn compile(&mut self) {
        self.rule_regex = match compile_rule(&self.ignore_rule, self.is_regex, false) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(
                    target: "Session/IgnoreList",
                    "Deactivating ignore rule '{}': {e}", self.ignore_rule
                );
                self.is_active = false;
                None
            }
        };
        // Scope rules are always wildcard patterns.
        self.scope_regex = match compile_rule(&self.scope_rule, false, false) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(
                    target: "Session/IgnoreList",
                    "Deactivating ignore rule '{}' (scope '{}'): {e}",
                    self.ignore_rule, self.scope_rule
                );
                self.is_active = false;
                None
            }
        };
    }

    /// Test the subject (message content or sender mask) against the rule.
    pub fn match_ignore(&self, subject: &str) -> bool {
        self.rule_regex
            .as_ref()
            .is_some_and(|re| re.is_match(subject))
    }

    /// Test a network or channel name against the scope pattern.
    pub fn match_scope(&self, name: &str) -> bool {
        self.scope_regex
            .as_ref()
            .is_some_and(|re| re.is_match(name))
    }
}

/// Ordered ignore rules; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    items: Vec<IgnoreItem>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[IgnoreItem] {
        &self.items
    }

    pub fn push(&mut self, item: IgnoreItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a message should be suppressed.
    ///
    /// Only Plain, Action and Notice messages are subject to ignore rules.
    /// Rules are evaluated in list order; inactive rules and CTCP rules are
    /// skipped (CTCP filtering happens before messages reach the session).
    pub fn matches(&self, message: &IrcMessage, network_name: &str, buffer_name: &str) -> bool {
        if !message.msg_type.intersects(
            MessageType::PLAIN | MessageType::ACTION | MessageType::NOTICE,
        ) {
            return false;
        }
        for item in &self.items {
            if !item.is_active || item.ignore_type == IgnoreType::Ctcp {
                continue;
            }
            let in_scope = match item.scope {
                IgnoreScope::Global => true,
                IgnoreScope::Network => item.match_scope(network_name),
                IgnoreScope::Channel => item.match_scope(buffer_name),
            };
            if !in_scope {
                continue;
            }
            let subject = match item.ignore_type {
                IgnoreType::Message => &message.content,
                _ => &message.sender,
            };
            if item.match_ignore(subject) {
                return true;
            }
        }
        false
    }

    /// Import the wire's struct-of-arrays shape.
    pub fn from_wire_map(map: &VariantMap) -> Self {
        let Some(columns) = map.get("IgnoreList").and_then(Value::as_map) else {
            return IgnoreList::default();
        };
        let rules = text_column(columns, "ignoreRule");
        let scope_rules = text_column(columns, "scopeRule");
        let types = int_column(columns, "ignoreType");
        let strictness = int_column(columns, "strictness");
        let scopes = int_column(columns, "scope");
        let regexes = bool_column(columns, "isRegEx");
        let actives = bool_column(columns, "isActive");

        let mut list = IgnoreList::default();
        for (row, rule) in rules.iter().enumerate() {
            list.push(IgnoreItem::new(
                IgnoreType::from_wire(types.get(row).copied().unwrap_or(0)),
                rule.clone(),
                regexes.get(row).copied().unwrap_or(false),
                Strictness::from_wire(strictness.get(row).copied().unwrap_or(0)),
                IgnoreScope::from_wire(scopes.get(row).copied().unwrap_or(0)),
                scope_rules.get(row).cloned().unwrap_or_default(),
                actives.get(row).copied().unwrap_or(false),
            ));
        }
        list
    }

    /// Export back to the wire's struct-of-arrays shape.
    pub fn to_wire_map(&self) -> VariantMap {
        let mut columns = VariantMap::new();
        columns.insert(
            "ignoreType".into(),
            Value::List(
                self.items
                    .iter()
                    .map(|i| Value::Int(i.ignore_type as i64))
                    .collect(),
            ),
        );
        columns.insert(
            "ignoreRule".into(),
            Value::List(
                self.items
                    .iter()
                    .map(|i| Value::from(i.ignore_rule.clone()))
                    .collect(),
            ),
        );
        columns.insert(
            "isRegEx".into(),
            Value::List(self.items.iter().map(|i| Value::Bool(i.is_regex)).collect()),
        );
        columns.insert(
            "strictness".into(),
            Value::List(
                self.items
                    .iter()
                    .map(|i| Value::Int(i.strictness as i64))
                    .collect(),
            ),
        );
        columns.insert(
            "scope".into(),
            Value::List(self.items.iter().map(|i| Value::Int(i.scope as i64)).collect()),
        );
        columns.insert(
            "scopeRule".into(),
            Value::List(
                self.items
                    .iter()
                    .map(|i| Value::from(i.scope_rule.clone()))
                    .collect(),
            ),
        );
        columns.insert(
            "isActive".into(),
            Value::List(self.items.iter().map(|i| Value::Bool(i.is_active)).collect()),
        );
        let mut map = VariantMap::new();
        map.insert("IgnoreList".into(), Value::Map(columns));
        map
    }
}

fn text_column(columns: &VariantMap, key: &str) -> Vec<String> {
    columns
        .get(key)
        .and_then(Value::as_string_list)
        .unwrap_or_default()
}

fn int_column(columns: &VariantMap, key: &str) -> Vec<i64> {
    columns
        .get(key)
        .and_then(Value::as_list)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

fn bool_column(columns: &VariantMap, key: &str) -> Vec<bool> {
    columns
        .get(key)
        .and_then(Value::as_list)
        .map(|items| items.iter().filter_map(Value::as_bool).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferId, MessageFlags, MsgId};
    use chrono::Utc;

    fn msg(msg_type: MessageType, sender: &str, content: &str) -> IrcMessage {
        IrcMessage {
            id: MsgId(1),
            timestamp: Utc::now(),
            msg_type,
            flags: MessageFlags::empty(),
            buffer: BufferId(1),
            sender: sender.into(),
            content: content.into(),
        }
    }

    fn sender_rule(rule: &str, scope: IgnoreScope, scope_rule: &str) -> IgnoreItem {
        IgnoreItem::new(
            IgnoreType::Sender,
            rule,
            false,
            Strictness::Soft,
            scope,
            scope_rule,
            true,
        )
    }

    #[test]
    fn wildcard_rule_round_trip() {
        let item = sender_rule("*foo*", IgnoreScope::Global, "");
        assert!(item.match_ignore("xxfooyy"));
        assert!(!item.match_ignore("bar"));
    }

    #[test]
    fn regex_rule_is_used_verbatim() {
        let item = IgnoreItem::new(
            IgnoreType::Message,
            r"^spam\d+",
            true,
            Strictness::Soft,
            IgnoreScope::Global,
            "",
            true,
        );
        assert!(item.match_ignore("spam123 click here"));
        assert!(!item.match_ignore("no spam here"));
    }

    #[test]
    fn invalid_regex_deactivates_rule_only() {
        let mut list = IgnoreList::new();
        list.push(IgnoreItem::new(
            IgnoreType::Sender,
            "[broken",
            true,
            Strictness::Soft,
            IgnoreScope::Global,
            "",
            true,
        ));
        list.push(sender_rule("*troll*", IgnoreScope::Global, ""));
        assert!(!list.items()[0].is_active);
        assert!(list.items()[1].is_active);
        let m = msg(MessageType::PLAIN, "troll!t@h", "hello");
        assert!(list.matches(&m, "libera", "#rust"));
    }

    #[test]
    fn only_plain_action_notice_are_ignorable() {
        let mut list = IgnoreList::new();
        list.push(sender_rule("*", IgnoreScope::Global, ""));
        assert!(!list.matches(&msg(MessageType::JOIN, "x!x@x", ""), "net", "#c"));
        assert!(list.matches(&msg(MessageType::NOTICE, "x!x@x", ""), "net", "#c"));
        assert!(list.matches(&msg(MessageType::ACTION, "x!x@x", ""), "net", "#c"));
    }

    #[test]
    fn network_and_channel_scopes_gate_matching() {
        let mut list = IgnoreList::new();
        list.push(sender_rule("*troll*", IgnoreScope::Network, "libera*"));
        let m = msg(MessageType::PLAIN, "troll!t@h", "hi");
        assert!(list.matches(&m, "libera.chat", "#rust"));
        assert!(!list.matches(&m, "oftc", "#rust"));

        let mut list = IgnoreList::new();
        list.push(sender_rule("*troll*", IgnoreScope::Channel, "#rust"));
        assert!(list.matches(&m, "libera.chat", "#rust"));
        assert!(!list.matches(&m, "libera.chat", "#python"));
    }

    #[test]
    fn first_match_wins_and_inactive_rules_are_skipped() {
        let mut inactive = sender_rule("*troll*", IgnoreScope::Global, "");
        inactive.is_active = false;
        let mut list = IgnoreList::new();
        list.push(inactive);
        let m = msg(MessageType::PLAIN, "troll!t@h", "hi");
        assert!(!list.matches(&m, "net", "#c"));
    }

    #[test]
    fn message_type_rules_test_content_not_sender() {
        let mut list = IgnoreList::new();
        list.push(IgnoreItem::new(
            IgnoreType::Message,
            "*buy now*",
            false,
            Strictness::Soft,
            IgnoreScope::Global,
            "",
            true,
        ));
        assert!(list.matches(
            &msg(MessageType::PLAIN, "friend!f@h", "BUY NOW cheap"),
            "net",
            "#c"
        ));
        assert!(!list.matches(
            &msg(MessageType::PLAIN, "buy now!f@h", "hello"),
            "net",
            "#c"
        ));
    }

    #[test]
    fn columnar_round_trip_preserves_scope_column() {
        let mut list = IgnoreList::new();
        list.push(sender_rule("*foo*", IgnoreScope::Channel, "#rust"));
        let map = list.to_wire_map();
        let restored = IgnoreList::from_wire_map(&map);
        assert_eq!(restored.items().len(), 1);
        let item = &restored.items()[0];
        assert_eq!(item.scope, IgnoreScope::Channel);
        assert_eq!(item.strictness, Strictness::Soft);
        assert_eq!(item.scope_rule, "#rust");
    }
}
