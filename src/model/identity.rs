use crate::types::IdentityId;
use crate::value::{Value, VariantMap};
use log::debug;

/// A reusable outbound persona: nick list, away behaviour, exit messages.
///
/// Setting the nick list also derives one escaped regex fragment per nick,
/// pre-computed here because highlight checks run per message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub id: IdentityId,
    pub identity_name: String,
    pub real_name: String,
    nicks: Vec<String>,
    nick_regex_fragments: Vec<String>,
    pub ident: String,
    pub away_nick: String,
    pub away_nick_enabled: bool,
    pub away_reason: String,
    pub away_reason_enabled: bool,
    pub auto_away_enabled: bool,
    pub auto_away_time: u32,
    pub auto_away_reason: String,
    pub auto_away_reason_enabled: bool,
    pub detach_away_enabled: bool,
    pub detach_away_reason: String,
    pub detach_away_reason_enabled: bool,
    pub kick_reason: String,
    pub part_reason: String,
    pub quit_reason: String,
}

impl Identity {
    pub fn new(id: IdentityId) -> Self {
        Identity {
            id,
            ..Default::default()
        }
    }

    pub fn from_wire_map(map: &VariantMap) -> Self {
        let mut identity = Identity::default();
        identity.update(map);
        identity
    }

    pub fn nicks(&self) -> &[String] {
        &self.nicks
    }

    pub fn set_nicks(&mut self, nicks: Vec<String>) {
        self.nick_regex_fragments = nicks.iter().map(|n| regex::escape(n)).collect();
        self.nicks = nicks;
    }

    /// Escaped regex fragments, one per nick, in nick-list order.
    pub fn nick_regex_fragments(&self) -> &[String] {
        &self.nick_regex_fragments
    }

    pub fn contains_nick(&self, nick: &str) -> bool {
        self.nicks.iter().any(|n| n.eq_ignore_ascii_case(nick))
    }

    /// Apply one wire field through the explicit field table.
    /// `id` and `identityId` are the same value under two names.
    pub fn apply_field(&mut self, key: &str, value: &Value) {
        let set_string = |slot: &mut String, value: &Value| {
            if let Some(text) = value.as_text() {
                *slot = text.into_owned();
            }
        };
        match key {
            "id" | "identityId" => {
                if let Some(id) = value.as_identity_id() {
                    self.id = id;
                }
            }
            "identityName" => set_string(&mut self.identity_name, value),
            "realName" => set_string(&mut self.real_name, value),
            "nicks" => {
                if let Some(nicks) = value.as_string_list() {
                    self.set_nicks(nicks);
                }
            }
            "ident" => set_string(&mut self.ident, value),
            "awayNick" => set_string(&mut self.away_nick, value),
            "awayNickEnabled" => {
                self.away_nick_enabled = value.as_bool().unwrap_or(self.away_nick_enabled)
            }
            "awayReason" => set_string(&mut self.away_reason, value),
            "awayReasonEnabled" => {
                self.away_reason_enabled = value.as_bool().unwrap_or(self.away_reason_enabled)
            }
            "autoAwayEnabled" => {
                self.auto_away_enabled = value.as_bool().unwrap_or(self.auto_away_enabled)
            }
            "autoAwayTime" => {
                if let Some(t) = value.as_i64() {
                    self.auto_away_time = t as u32;
                }
            }
            "autoAwayReason" => set_string(&mut self.auto_away_reason, value),
            "autoAwayReasonEnabled" => {
                self.auto_away_reason_enabled =
                    value.as_bool().unwrap_or(self.auto_away_reason_enabled)
            }
            "detachAwayEnabled" => {
                self.detach_away_enabled = value.as_bool().unwrap_or(self.detach_away_enabled)
            }
            "detachAwayReason" => set_string(&mut self.detach_away_reason, value),
            "detachAwayReasonEnabled" => {
                self.detach_away_reason_enabled =
                    value.as_bool().unwrap_or(self.detach_away_reason_enabled)
            }
            "kickReason" => set_string(&mut self.kick_reason, value),
            "partReason" => set_string(&mut self.part_reason, value),
            "quitReason" => set_string(&mut self.quit_reason, value),
            "sslKey" | "sslCert" => {}
            other => {
                debug!(target: "Session/Identity", "Ignoring unknown identity field '{other}'");
            }
        }
    }

    pub fn update(&mut self, fields: &VariantMap) {
        for (key, value) in fields {
            self.apply_field(key, value);
        }
    }

    pub fn to_wire_map(&self) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert("identityId".into(), Value::from(self.id));
        map.insert("identityName".into(), Value::from(self.identity_name.clone()));
        map.insert("realName".into(), Value::from(self.real_name.clone()));
        map.insert("nicks".into(), Value::StringList(self.nicks.clone()));
        map.insert("ident".into(), Value::from(self.ident.clone()));
        map.insert("awayNick".into(), Value::from(self.away_nick.clone()));
        map.insert("awayNickEnabled".into(), Value::Bool(self.away_nick_enabled));
        map.insert("awayReason".into(), Value::from(self.away_reason.clone()));
        map.insert(
            "awayReasonEnabled".into(),
            Value::Bool(self.away_reason_enabled),
        );
        map.insert("autoAwayEnabled".into(), Value::Bool(self.auto_away_enabled));
        map.insert("autoAwayTime".into(), Value::Int(self.auto_away_time as i64));
        map.insert(
            "autoAwayReason".into(),
            Value::from(self.auto_away_reason.clone()),
        );
        map.insert(
            "autoAwayReasonEnabled".into(),
            Value::Bool(self.auto_away_reason_enabled),
        );
        map.insert(
            "detachAwayEnabled".into(),
            Value::Bool(self.detach_away_enabled),
        );
        map.insert(
            "detachAwayReason".into(),
            Value::from(self.detach_away_reason.clone()),
        );
        map.insert(
            "detachAwayReasonEnabled".into(),
            Value::Bool(self.detach_away_reason_enabled),
        );
        map.insert("kickReason".into(), Value::from(self.kick_reason.clone()));
        map.insert("partReason".into(), Value::from(self.part_reason.clone()));
        map.insert("quitReason".into(), Value::from(self.quit_reason.clone()));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nick_fragments_are_escaped() {
        let mut identity = Identity::new(IdentityId(1));
        identity.set_nicks(vec!["alice".into(), "ali[ce]".into()]);
        assert_eq!(
            identity.nick_regex_fragments(),
            &["alice".to_string(), r"ali\[ce\]".to_string()]
        );
    }

    #[test]
    fn id_and_identity_id_are_aliases() {
        let mut identity = Identity::default();
        identity.apply_field("id", &Value::Int(7));
        assert_eq!(identity.id, IdentityId(7));
        identity.apply_field("identityId", &Value::Int(9));
        assert_eq!(identity.id, IdentityId(9));
    }

    #[test]
    fn wire_map_round_trip() {
        let mut identity = Identity::new(IdentityId(3));
        identity.identity_name = "main".into();
        identity.set_nicks(vec!["alice".into()]);
        identity.quit_reason = "bye".into();
        let restored = Identity::from_wire_map(&identity.to_wire_map());
        assert_eq!(restored, identity);
    }
}
