use crate::model::message::HighlightMode;
use crate::model::pattern::compile_rule;
use crate::value::{Value, VariantMap};
use log::warn;
use regex::Regex;

/// Manager-level nick-highlight selection, as synced from the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum HighlightNickType {
    #[default]
    AllNicks = 0,
    CurrentNick = 1,
    NoNick = 2,
}

impl HighlightNickType {
    pub fn from_wire(raw: i64) -> HighlightNickType {
        match raw {
            1 => HighlightNickType::CurrentNick,
            2 => HighlightNickType::NoNick,
            _ => HighlightNickType::AllNicks,
        }
    }

    pub fn as_mode(&self) -> HighlightMode {
        match self {
            HighlightNickType::AllNicks => HighlightMode::AllIdentityNicks,
            HighlightNickType::CurrentNick => HighlightMode::CurrentNick,
            HighlightNickType::NoNick => HighlightMode::None,
        }
    }
}

/// A user-defined highlight condition.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    pub id: i32,
    pub name: String,
    pub is_regex: bool,
    pub is_case_sensitive: bool,
    pub is_enabled: bool,
    pub is_inverse: bool,
    pub sender: String,
    pub channel: String,
    content_regex: Option<Regex>,
}

impl HighlightRule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i32,
        name: impl Into<String>,
        is_regex: bool,
        is_case_sensitive: bool,
        is_enabled: bool,
        is_inverse: bool,
        sender: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        let mut rule = HighlightRule {
            id,
            name: name.into(),
            is_regex,
            is_case_sensitive,
            is_enabled,
            is_inverse,
            sender: sender.into(),
            channel: channel.into(),
            content_regex: None,
        };
        rule.compile();
        rule
    }

    pub fn compile(&mut self) {
        self.content_regex = match compile_rule(&self.name, self.is_regex, self.is_case_sensitive)
        {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(
                    target: "Session/Highlight",
                    "Disabling highlight rule '{}': {e}", self.name
                );
                self.is_enabled = false;
                None
            }
        };
    }

    /// Test a message against this rule. `is_inverse` flips the content
    /// match; sender and channel restrictions are wildcard patterns and an
    /// empty pattern means unrestricted.
    pub fn matches(&self, content: &str, sender: &str, channel: &str) -> bool {
        if !self.is_enabled {
            return false;
        }
        if !self.sender.is_empty() {
            match compile_rule(&self.sender, false, self.is_case_sensitive) {
                Ok(re) if re.is_match(sender) => {}
                _ => return false,
            }
        }
        if !self.channel.is_empty() {
            match compile_rule(&self.channel, false, self.is_case_sensitive) {
                Ok(re) if re.is_match(channel) => {}
                _ => return false,
            }
        }
        let hit = self
            .content_regex
            .as_ref()
            .is_some_and(|re| re.is_match(content));
        hit != self.is_inverse
    }
}

/// The session's highlight rule set plus the manager-level nick mode.
#[derive(Debug, Clone, Default)]
pub struct HighlightRuleManager {
    rules: Vec<HighlightRule>,
    pub highlight_nick: HighlightNickType,
    pub nicks_case_sensitive: bool,
}

impl HighlightRuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    pub fn push(&mut self, rule: HighlightRule) {
        self.rules.push(rule);
    }

    pub fn from_wire_map(map: &VariantMap) -> Self {
        let mut manager = HighlightRuleManager::default();
        if let Some(raw) = map.get("highlightNick").and_then(Value::as_i64) {
            manager.highlight_nick = HighlightNickType::from_wire(raw);
        }
        if let Some(flag) = map.get("nicksCaseSensitive").and_then(Value::as_bool) {
            manager.nicks_case_sensitive = flag;
        }
        let Some(columns) = map.get("HighlightRuleList").and_then(Value::as_map) else {
            return manager;
        };
        let ids = int_column(columns, "id");
        let names = text_column(columns, "name");
        let regexes = bool_column(columns, "isRegEx");
        let case_sensitive = bool_column(columns, "isCaseSensitive");
        let enabled = bool_column(columns, "isEnabled");
        let inverse = bool_column(columns, "isInverse");
        let senders = text_column(columns, "sender");
        let channels = text_column(columns, "chanName");
        for (row, name) in names.iter().enumerate() {
            manager.push(HighlightRule::new(
                ids.get(row).copied().unwrap_or(row as i64) as i32,
                name.clone(),
                regexes.get(row).copied().unwrap_or(false),
                case_sensitive.get(row).copied().unwrap_or(false),
                enabled.get(row).copied().unwrap_or(true),
                inverse.get(row).copied().unwrap_or(false),
                senders.get(row).cloned().unwrap_or_default(),
                channels.get(row).cloned().unwrap_or_default(),
            ));
        }
        manager
    }

    pub fn to_wire_map(&self) -> VariantMap {
        let mut columns = VariantMap::new();
        columns.insert(
            "id".into(),
            Value::List(self.rules.iter().map(|r| Value::from(r.id)).collect()),
        );
        columns.insert(
            "name".into(),
            Value::List(
                self.rules
                    .iter()
                    .map(|r| Value::from(r.name.clone()))
                    .collect(),
            ),
        );
        columns.insert(
            "isRegEx".into(),
            Value::List(self.rules.iter().map(|r| Value::Bool(r.is_regex)).collect()),
        );
        columns.insert(
            "isCaseSensitive".into(),
            Value::List(
                self.rules
                    .iter()
                    .map(|r| Value::Bool(r.is_case_sensitive))
                    .collect(),
            ),
        );
        columns.insert(
            "isEnabled".into(),
            Value::List(self.rules.iter().map(|r| Value::Bool(r.is_enabled)).collect()),
        );
        columns.insert(
            "isInverse".into(),
            Value::List(self.rules.iter().map(|r| Value::Bool(r.is_inverse)).collect()),
        );
        columns.insert(
            "sender".into(),
            Value::List(
                self.rules
                    .iter()
                    .map(|r| Value::from(r.sender.clone()))
                    .collect(),
            ),
        );
        columns.insert(
            "chanName".into(),
            Value::List(
                self.rules
                    .iter()
                    .map(|r| Value::from(r.channel.clone()))
                    .collect(),
            ),
        );
        let mut map = VariantMap::new();
        map.insert("HighlightRuleList".into(), Value::Map(columns));
        map.insert(
            "highlightNick".into(),
            Value::Int(self.highlight_nick as i64),
        );
        map.insert(
            "nicksCaseSensitive".into(),
            Value::Bool(self.nicks_case_sensitive),
        );
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

    #[test]
    fn rule_matches_wildcard_content() {
        let rule = HighlightRule::new(1, "*deploy*", false, false, true, false, "", "");
        assert!(rule.matches("time to DEPLOY", "bob!b@h", "#ops"));
        assert!(!rule.matches("lunch?", "bob!b@h", "#ops"));
    }

    #[test]
    fn sender_and_channel_restrict() {
        let rule = HighlightRule::new(1, "*alert*", false, false, true, false, "bot*", "#ops");
        assert!(rule.matches("alert: disk", "bot1!b@h", "#ops"));
        assert!(!rule.matches("alert: disk", "human!h@h", "#ops"));
        assert!(!rule.matches("alert: disk", "bot1!b@h", "#random"));
    }

    #[test]
    fn inverse_rule_flips_content_match() {
        let rule = HighlightRule::new(1, "*ok*", false, false, true, true, "", "");
        assert!(!rule.matches("all ok", "b!b@h", "#c"));
        assert!(rule.matches("failure", "b!b@h", "#c"));
    }

    #[test]
    fn wire_map_round_trip_keeps_manager_flags() {
        let mut manager = HighlightRuleManager::new();
        manager.highlight_nick = HighlightNickType::CurrentNick;
        manager.nicks_case_sensitive = true;
        manager.push(HighlightRule::new(
            3, "*rust*", false, false, true, false, "", "#rust",
        ));
        let restored = HighlightRuleManager::from_wire_map(&manager.to_wire_map());
        assert_eq!(restored.highlight_nick, HighlightNickType::CurrentNick);
        assert!(restored.nicks_case_sensitive);
        assert_eq!(restored.rules().len(), 1);
        assert_eq!(restored.rules()[0].id, 3);
        assert_eq!(restored.rules()[0].channel, "#rust");
    }

    #[test]
    fn nick_type_maps_onto_highlight_mode() {
        assert_eq!(
            HighlightNickType::AllNicks.as_mode(),
            HighlightMode::AllIdentityNicks
        );
        assert_eq!(
            HighlightNickType::NoNick.as_mode(),
            HighlightMode::None
        );
    }
}
