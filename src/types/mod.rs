pub mod events;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one configured IRC network on the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub i32);

/// Identifies one outbound identity profile on the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(pub i32);

/// Identifies one buffer (channel/query/status/group) on the core.
///
/// The core assigns ids; a locally created buffer carries [`BufferId::INVALID`]
/// until the core reports the real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub i32);

impl BufferId {
    pub const INVALID: BufferId = BufferId(-1);

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

/// Identifies one message within the core's backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MsgId(pub i32);

macro_rules! id_display {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        })*
    };
}

id_display!(NetworkId, IdentityId, BufferId, MsgId);

/// Buffer kind as reported in a `BufferInfo` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(i16)]
pub enum BufferType {
    #[default]
    Invalid = 0x00,
    Status = 0x01,
    Channel = 0x02,
    Query = 0x04,
    Group = 0x08,
}

impl BufferType {
    pub fn from_wire(raw: i64) -> BufferType {
        match raw {
            0x01 => BufferType::Status,
            0x02 => BufferType::Channel,
            0x04 => BufferType::Query,
            0x08 => BufferType::Group,
            _ => BufferType::Invalid,
        }
    }
}

/// Connection lifecycle of one network, as synced from the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(i32)]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connecting = 1,
    Initializing = 2,
    Initialized = 3,
    Reconnecting = 4,
    Disconnecting = 5,
}

impl ConnectionState {
    pub fn from_wire(raw: i64) -> ConnectionState {
        match raw {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Initializing,
            3 => ConnectionState::Initialized,
            4 => ConnectionState::Reconnecting,
            5 => ConnectionState::Disconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

bitflags! {
    /// Wire message-type bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MessageType: u32 {
        const PLAIN = 0x00001;
        const NOTICE = 0x00002;
        const ACTION = 0x00004;
        const NICK = 0x00008;
        const MODE = 0x00010;
        const JOIN = 0x00020;
        const PART = 0x00040;
        const QUIT = 0x00080;
        const KICK = 0x00100;
        const KILL = 0x00200;
        const SERVER = 0x00400;
        const INFO = 0x00800;
        const ERROR = 0x01000;
        const DAY_CHANGE = 0x02000;
        const TOPIC = 0x04000;
        const NETSPLIT_JOIN = 0x08000;
        const NETSPLIT_QUIT = 0x10000;
        const INVITE = 0x20000;
    }
}

bitflags! {
    /// Per-message flags. `SELF_MSG`/`HIGHLIGHT` are derived locally after the
    /// message arrives; the rest come from the core.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageFlags: u32 {
        const SELF_MSG = 0x01;
        const HIGHLIGHT = 0x02;
        const REDIRECTED = 0x04;
        const SERVER_MSG = 0x08;
        const BACKLOG = 0x80;
    }
}

/// The wire's `BufferInfo` record (field order matters to the codec).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferInfo {
    pub id: BufferId,
    pub network: NetworkId,
    pub buffer_type: BufferType,
    pub group: u32,
    pub name: String,
}

impl Default for BufferId {
    fn default() -> Self {
        BufferId::INVALID
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        NetworkId(0)
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        IdentityId(0)
    }
}

/// The wire's `Message` record as decoded by the codec, before it is folded
/// into the entity model.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    pub id: MsgId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub msg_type: MessageType,
    pub flags: MessageFlags,
    pub buffer: BufferInfo,
    pub sender: String,
    pub content: String,
}
