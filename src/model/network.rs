use crate::model::buffer::IrcBuffer;
use crate::model::buffer_collection::IrcBufferCollection;
use crate::model::user::IrcUser;
use crate::types::{BufferId, ConnectionState, IdentityId, NetworkId};
use crate::value::{MapReader, VariantMap};
use std::collections::{BTreeMap, HashMap};

/// One entry of a network's server list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkServer {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub use_ssl: bool,
    pub ssl_verify: bool,
    pub ssl_version: i32,
    pub use_proxy: bool,
    pub proxy_type: i32,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub proxy_user: String,
    pub proxy_pass: String,
}

impl NetworkServer {
    pub fn from_wire_map(map: &VariantMap) -> Self {
        let mut reader = MapReader::new(map);
        NetworkServer {
            host: reader.optional_string("Host").unwrap_or_default(),
            port: reader.optional_i64("Port").unwrap_or(6667) as u16,
            password: reader.optional_string("Password").unwrap_or_default(),
            use_ssl: reader.optional_bool("UseSSL").unwrap_or(false),
            ssl_verify: reader.optional_bool("sslVerify").unwrap_or(false),
            ssl_version: reader.optional_i64("sslVersion").unwrap_or(0) as i32,
            use_proxy: reader.optional_bool("UseProxy").unwrap_or(false),
            proxy_type: reader.optional_i64("ProxyType").unwrap_or(0) as i32,
            proxy_host: reader.optional_string("ProxyHost").unwrap_or_default(),
            proxy_port: reader.optional_i64("ProxyPort").unwrap_or(0) as u16,
            proxy_user: reader.optional_string("ProxyUser").unwrap_or_default(),
            proxy_pass: reader.optional_string("ProxyPass").unwrap_or_default(),
        }
    }
}

/// What a user's quit did to the local state, so the dispatcher can emit the
/// matching events.
#[derive(Debug, Default, PartialEq)]
pub struct QuitOutcome {
    /// Channel buffers the user was removed from.
    pub affected: Vec<BufferId>,
    /// Buffers deactivated because the quitting nick was our own.
    pub deactivated: Vec<BufferId>,
}

/// One configured IRC network and everything scoped to it.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    my_nick: Option<String>,
    pub latency: i32,
    pub connection_state: ConnectionState,
    is_connected: bool,
    pub current_server: String,
    pub server_list: Vec<NetworkServer>,
    pub codec_for_server: String,
    pub codec_for_encoding: String,
    pub codec_for_decoding: String,
    pub perform: Vec<String>,
    pub identity: IdentityId,
    pub auto_reconnect_interval: u32,
    pub auto_reconnect_retries: u16,
    pub unlimited_reconnect_retries: bool,
    pub auto_identify_service: String,
    pub auto_identify_password: String,
    pub use_sasl: bool,
    pub sasl_account: String,
    pub sasl_password: String,
    pub rejoin_channels: bool,
    pub use_custom_message_rate: bool,
    pub message_rate_burst_size: u32,
    pub message_rate_delay: u32,
    pub unlimited_message_rate: bool,
    pub buffers: IrcBufferCollection,
    users: HashMap<String, IrcUser>,
    status_buffer: Option<BufferId>,
}

impl Network {
    pub fn new(id: NetworkId) -> Self {
        Network {
            id,
            ..Default::default()
        }
    }

    pub fn my_nick(&self) -> Option<&str> {
        self.my_nick.as_deref()
    }

    pub fn set_my_nick(&mut self, nick: impl Into<String>) {
        self.my_nick = Some(nick.into());
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Toggle the connected flag. The status buffer's activation follows the
    /// connection; the affected buffer id is returned for event emission.
    pub fn set_connected(&mut self, connected: bool) -> Option<BufferId> {
        self.is_connected = connected;
        let status_id = self.status_buffer?;
        let buffer = self.buffers.by_id_mut(status_id)?;
        buffer.is_active = connected;
        Some(status_id)
    }

    pub fn status_buffer(&self) -> Option<BufferId> {
        self.status_buffer
    }

    pub fn set_status_buffer(&mut self, id: BufferId) {
        self.status_buffer = Some(id);
    }

    // --- users ---

    /// Insert a user keyed by nick. Case-sensitive, last write wins.
    pub fn add_user(&mut self, user: IrcUser) {
        self.users.insert(user.nick().to_owned(), user);
    }

    pub fn user(&self, nick: &str) -> Option<&IrcUser> {
        self.users.get(nick)
    }

    pub fn user_mut(&mut self, nick: &str) -> Option<&mut IrcUser> {
        self.users.get_mut(nick)
    }

    pub fn users(&self) -> impl Iterator<Item = &IrcUser> {
        self.users.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Rename a user: re-key the network user map and every channel buffer's
    /// membership entry, preserving mode strings.
    pub fn rename_user(&mut self, old_nick: &str, new_nick: &str) -> bool {
        let Some(mut user) = self.users.remove(old_nick) else {
            return false;
        };
        user.set_nick(new_nick);
        self.users.insert(new_nick.to_owned(), user);

        for buffer in self.buffers.iter_mut() {
            if buffer.is_channel() {
                buffer.rename_member(old_nick, new_nick);
            }
        }
        if self
            .my_nick
            .as_deref()
            .is_some_and(|mine| mine == old_nick)
        {
            self.my_nick = Some(new_nick.to_owned());
        }
        true
    }

    /// Remove a user from the network and every channel buffer. If the nick
    /// was our own, the affected buffers are deactivated as well.
    pub fn remove_user(&mut self, nick: &str) -> QuitOutcome {
        let mut outcome = QuitOutcome::default();
        let is_own_nick = self
            .my_nick
            .as_deref()
            .is_some_and(|mine| mine.eq_ignore_ascii_case(nick));

        for buffer in self.buffers.iter_mut() {
            if buffer.is_channel() && buffer.remove_member(nick) {
                outcome.affected.push(buffer.id());
                if is_own_nick {
                    buffer.is_active = false;
                    outcome.deactivated.push(buffer.id());
                }
            }
        }
        self.users.remove(nick);
        outcome
    }

    /// Move every message of `source` into `target` (re-pointing ownership),
    /// then drop `source` from the collection.
    pub fn merge_buffers_permanently(&mut self, target: BufferId, source: BufferId) -> bool {
        let Some(mut source_buffer) = self.buffers.remove_by_id(source) else {
            return false;
        };
        let Some(target_buffer) = self.buffers.by_id_mut(target) else {
            // Target vanished underneath us; put the source back untouched.
            self.buffers.insert(source_buffer);
            return false;
        };
        for (_, mut message) in source_buffer.take_messages() {
            message.buffer = target;
            target_buffer.add_message(message);
        }
        true
    }
}

/// All networks of one session, with cross-network buffer lookup by id.
/// Exactly one network owns any given buffer id.
#[derive(Debug, Clone, Default)]
pub struct NetworkCollection {
    networks: BTreeMap<NetworkId, Network>,
}

impl NetworkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, network: Network) {
        self.networks.insert(network.id, network);
    }

    pub fn remove(&mut self, id: NetworkId) -> Option<Network> {
        self.networks.remove(&id)
    }

    pub fn get(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(&id)
    }

    pub fn get_mut(&mut self, id: NetworkId) -> Option<&mut Network> {
        self.networks.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Network> {
        self.networks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn network_of_buffer(&self, id: BufferId) -> Option<NetworkId> {
        self.networks
            .values()
            .find(|n| n.buffers.contains_id(id))
            .map(|n| n.id)
    }

    pub fn buffer(&self, id: BufferId) -> Option<&IrcBuffer> {
        self.networks.values().find_map(|n| n.buffers.by_id(id))
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> Option<&mut IrcBuffer> {
        self.networks
            .values_mut()
            .find_map(|n| n.buffers.by_id_mut(id))
    }
}
