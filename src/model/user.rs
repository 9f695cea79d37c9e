use crate::value::{Value, VariantMap};
use chrono::{DateTime, Utc};
use log::debug;

/// One user as seen on a network.
///
/// The identifying key is the full `nick!user@host` mask; the nick is the
/// substring before the first `!`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrcUser {
    mask: String,
    pub away: bool,
    pub away_message: String,
    pub user: String,
    pub host: String,
    pub real_name: String,
    pub user_modes: String,
    pub encrypted: bool,
    pub idle_time: Option<DateTime<Utc>>,
    pub login_time: Option<DateTime<Utc>>,
    pub server: String,
}

impl IrcUser {
    pub fn new(mask: impl Into<String>) -> Self {
        let mask = mask.into();
        let mut user = IrcUser {
            mask,
            ..Default::default()
        };
        let (_, ident, host) = split_mask(&user.mask);
        user.user = ident.to_owned();
        user.host = host.to_owned();
        user
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }

    pub fn nick(&self) -> &str {
        split_mask(&self.mask).0
    }

    /// Replace the nick portion of the mask, keeping `user@host`.
    pub fn set_nick(&mut self, new_nick: &str) {
        let (_, ident, host) = split_mask(&self.mask);
        self.mask = if ident.is_empty() && host.is_empty() {
            new_nick.to_owned()
        } else {
            format!("{new_nick}!{ident}@{host}")
        };
    }

    /// Apply one wire field. The mapping from wire field name to entity field
    /// is this explicit table; unknown fields are logged and skipped.
    pub fn apply_field(&mut self, key: &str, value: &Value) {
        match key {
            "away" => self.away = value.as_bool().unwrap_or(self.away),
            "awayMessage" => {
                if let Some(text) = value.as_text() {
                    self.away_message = text.into_owned();
                }
            }
            "user" => {
                if let Some(text) = value.as_text() {
                    self.user = text.into_owned();
                }
            }
            "host" => {
                if let Some(text) = value.as_text() {
                    self.host = text.into_owned();
                }
            }
            "realName" => {
                if let Some(text) = value.as_text() {
                    self.real_name = text.into_owned();
                }
            }
            "userModes" => {
                if let Some(text) = value.as_text() {
                    self.user_modes = text.into_owned();
                }
            }
            "encrypted" => self.encrypted = value.as_bool().unwrap_or(self.encrypted),
            "idleTime" => self.idle_time = value.as_datetime(),
            "loginTime" => self.login_time = value.as_datetime(),
            "server" => {
                if let Some(text) = value.as_text() {
                    self.server = text.into_owned();
                }
            }
            "nick" => {
                if let Some(text) = value.as_text() {
                    self.set_nick(&text);
                }
            }
            // Part of the wire state, nothing to mirror locally.
            "channels" | "lastAwayMessage" | "lastAwayMessageTime" | "suserHost"
            | "whoisServiceReply" | "ircOperator" => {}
            other => {
                debug!(target: "Session/IrcUser", "Ignoring unknown user field '{other}'");
            }
        }
    }

    /// Bulk field update from a wire map.
    pub fn update(&mut self, fields: &VariantMap) {
        for (key, value) in fields {
            self.apply_field(key, value);
        }
    }
}

fn split_mask(mask: &str) -> (&str, &str, &str) {
    match mask.split_once('!') {
        Some((nick, rest)) => match rest.split_once('@') {
            Some((ident, host)) => (nick, ident, host),
            None => (nick, rest, ""),
        },
        None => (mask, "", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nick_is_derived_from_mask() {
        let user = IrcUser::new("alice!ident@example.org");
        assert_eq!(user.nick(), "alice");
        assert_eq!(user.user, "ident");
        assert_eq!(user.host, "example.org");
    }

    #[test]
    fn set_nick_preserves_user_and_host() {
        let mut user = IrcUser::new("alice!ident@example.org");
        user.set_nick("alice_");
        assert_eq!(user.mask(), "alice_!ident@example.org");
        assert_eq!(user.nick(), "alice_");
    }

    #[test]
    fn bare_nick_masks_are_accepted() {
        let mut user = IrcUser::new("alice");
        assert_eq!(user.nick(), "alice");
        user.set_nick("bob");
        assert_eq!(user.mask(), "bob");
    }

    #[test]
    fn update_applies_known_fields_only() {
        let mut user = IrcUser::new("alice!a@b");
        let mut fields = VariantMap::new();
        fields.insert("away".into(), Value::Bool(true));
        fields.insert("realName".into(), Value::from("Alice"));
        fields.insert("bogusField".into(), Value::from("x"));
        user.update(&fields);
        assert!(user.away);
        assert_eq!(user.real_name, "Alice");
    }
}
