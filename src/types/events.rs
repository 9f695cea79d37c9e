//! Event surface consumed by the presentation layer.
//!
//! Every state change the dispatcher applies is announced here. Event names
//! are a stable contract: [`name()`] returns the same string for the same
//! change across releases, so subscribers can log or route on it.

use crate::types::{BufferId, ConnectionState, IdentityId, MsgId, NetworkId};
use crate::value::VariantMap;
use std::sync::Arc;
use tokio::sync::broadcast;

// The size of the broadcast channel buffer.
const CHANNEL_CAPACITY: usize = 100;

// Macro to generate EventBus fields and constructor
macro_rules! define_event_bus {
    ($(($field:ident, $type:ty)),* $(,)?) => {
        /// Typed event bus with one broadcast channel per event domain.
        #[derive(Debug)]
        pub struct EventBus {
            $(
                pub $field: broadcast::Sender<$type>,
            )*
        }

        impl EventBus {
            pub fn new() -> Self {
                Self {
                    $(
                        $field: broadcast::channel(CHANNEL_CAPACITY).0,
                    )*
                }
            }
        }
    };
}

define_event_bus! {
    (session, Arc<SessionEvent>),
    (network, Arc<NetworkEvent>),
    (buffer, Arc<BufferEvent>),
    (buffer_view, Arc<BufferViewEvent>),
    (user, Arc<UserEvent>),
    (channel, Arc<ChannelEvent>),
    (identity, Arc<IdentityEvent>),
    (rules, Arc<RuleEvent>),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Session lifecycle and error reporting.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    CoreInfoInit(VariantMap),
    Login,
    LoginFailed(String),
    Setup(VariantMap),
    SetupOk,
    SetupFailed(String),
    Init,
    IdentitiesInit,
    Error(String),
    Unhandled(String),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::CoreInfoInit(_) => "coreinfoinit",
            SessionEvent::Login => "login",
            SessionEvent::LoginFailed(_) => "loginfailed",
            SessionEvent::Setup(_) => "setup",
            SessionEvent::SetupOk => "setupok",
            SessionEvent::SetupFailed(_) => "setupfailed",
            SessionEvent::Init => "init",
            SessionEvent::IdentitiesInit => "identities.init",
            SessionEvent::Error(_) => "error",
            SessionEvent::Unhandled(_) => "unhandled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkEvent {
    pub network: NetworkId,
    pub change: NetworkChange,
}

#[derive(Debug, Clone)]
pub enum NetworkChange {
    New,
    Remove,
    Init,
    AddBuffer(BufferId),
    Connected,
    Disconnected,
    Latency(i32),
    ConnectionState(ConnectionState),
    MyNick(String),
    UserRenamed { old_nick: String, new_nick: String },
    NetworkName(String),
    Server(String),
    ServerList,
    CodecDecoding(String),
    CodecEncoding(String),
    CodecServer(String),
    Perform(Vec<String>),
    Identity(IdentityId),
    AutoReconnectInterval(u32),
    AutoReconnectRetries(u16),
    UnlimitedReconnectRetries(bool),
    AutoIdentifyService(String),
    AutoIdentifyPassword(String),
    UseSasl(bool),
    SaslAccount(String),
    SaslPassword(String),
    RejoinChannels(bool),
    UseCustomMessageRate(bool),
    MessageRateBurstSize(u32),
    MessageRateDelay(u32),
    UnlimitedMessageRate(bool),
}

impl NetworkEvent {
    pub fn name(&self) -> &'static str {
        match &self.change {
            NetworkChange::New => "network.new",
            NetworkChange::Remove => "network.remove",
            NetworkChange::Init => "network.init",
            NetworkChange::AddBuffer(_) => "network.addbuffer",
            NetworkChange::Connected => "network.connected",
            NetworkChange::Disconnected => "network.disconnected",
            NetworkChange::Latency(_) => "network.latency",
            NetworkChange::ConnectionState(_) => "network.connectionstate",
            NetworkChange::MyNick(_) => "network.mynick",
            NetworkChange::UserRenamed { .. } => "network.userrenamed",
            NetworkChange::NetworkName(_) => "network.networkname",
            NetworkChange::Server(_) => "network.server",
            NetworkChange::ServerList => "network.serverlist",
            NetworkChange::CodecDecoding(_) => "network.codec.decoding",
            NetworkChange::CodecEncoding(_) => "network.codec.encoding",
            NetworkChange::CodecServer(_) => "network.codec.server",
            NetworkChange::Perform(_) => "network.perform",
            NetworkChange::Identity(_) => "network.identity",
            NetworkChange::AutoReconnectInterval(_) => "network.autoreconnect.interval",
            NetworkChange::AutoReconnectRetries(_) => "network.autoreconnect.retries",
            NetworkChange::UnlimitedReconnectRetries(_) => "network.autoreconnect.unlimited",
            NetworkChange::AutoIdentifyService(_) => "network.autoidentify.service",
            NetworkChange::AutoIdentifyPassword(_) => "network.autoidentify.password",
            NetworkChange::UseSasl(_) => "network.usesasl",
            NetworkChange::SaslAccount(_) => "network.sasl.account",
            NetworkChange::SaslPassword(_) => "network.sasl.password",
            NetworkChange::RejoinChannels(_) => "network.rejoinchannels",
            NetworkChange::UseCustomMessageRate(_) => "network.usecustommessagerate",
            NetworkChange::MessageRateBurstSize(_) => "network.messagerate.burstsize",
            NetworkChange::MessageRateDelay(_) => "network.messagerate.delay",
            NetworkChange::UnlimitedMessageRate(_) => "network.messagerate.unlimited",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BufferEvent {
    pub buffer: BufferId,
    pub change: BufferChange,
}

#[derive(Debug, Clone)]
pub enum BufferChange {
    Read,
    LastSeen(MsgId),
    MarkerLine(MsgId),
    Activity(i64),
    Remove,
    Rename(String),
    Merge { source: BufferId },
    Deactivate,
    Activate,
    Backlog { count: usize },
    Message(MsgId),
}

impl BufferEvent {
    pub fn name(&self) -> &'static str {
        match &self.change {
            BufferChange::Read => "buffer.read",
            BufferChange::LastSeen(_) => "buffer.lastseen",
            BufferChange::MarkerLine(_) => "buffer.markerline",
            BufferChange::Activity(_) => "buffer.activity",
            BufferChange::Remove => "buffer.remove",
            BufferChange::Rename(_) => "buffer.rename",
            BufferChange::Merge { .. } => "buffer.merge",
            BufferChange::Deactivate => "buffer.deactivate",
            BufferChange::Activate => "buffer.activate",
            BufferChange::Backlog { .. } => "buffer.backlog",
            BufferChange::Message(_) => "buffer.message",
        }
    }
}

/// How a buffer left a view's visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideMode {
    Temporary,
    Permanent,
}

#[derive(Debug, Clone)]
pub struct BufferViewEvent {
    pub view: i32,
    pub change: BufferViewChange,
}

#[derive(Debug, Clone)]
pub enum BufferViewChange {
    Ids(Vec<i32>),
    Init,
    BufferUnhide(BufferId),
    BufferHidden(BufferId, HideMode),
    OrderChanged(BufferId),
    NetworkId(NetworkId),
    Search(bool),
    HideInactiveBuffers(bool),
    HideInactiveNetworks(bool),
    AllowedBufferTypes(i32),
    AddNewBuffersAutomatically(bool),
    MinimumActivity(i32),
    BufferViewName(String),
    DisableDecoration(bool),
    Update,
}

impl BufferViewEvent {
    pub fn name(&self) -> &'static str {
        match &self.change {
            BufferViewChange::Ids(_) => "bufferview.ids",
            BufferViewChange::Init => "bufferview.init",
            BufferViewChange::BufferUnhide(_) => "bufferview.bufferunhide",
            BufferViewChange::BufferHidden(..) => "bufferview.bufferhidden",
            BufferViewChange::OrderChanged(_) => "bufferview.orderchanged",
            BufferViewChange::NetworkId(_) => "bufferview.networkid",
            BufferViewChange::Search(_) => "bufferview.search",
            BufferViewChange::HideInactiveBuffers(_) => "bufferview.hideinactivebuffers",
            BufferViewChange::HideInactiveNetworks(_) => "bufferview.hideinactivenetworks",
            BufferViewChange::AllowedBufferTypes(_) => "bufferview.allowedbuffertypes",
            BufferViewChange::AddNewBuffersAutomatically(_) => {
                "bufferview.addnewbuffersautomatically"
            }
            BufferViewChange::MinimumActivity(_) => "bufferview.minimumactivity",
            BufferViewChange::BufferViewName(_) => "bufferview.bufferviewname",
            BufferViewChange::DisableDecoration(_) => "bufferview.disabledecoration",
            BufferViewChange::Update => "bufferview.update",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserEvent {
    pub network: NetworkId,
    pub nick: String,
    pub change: UserChange,
}

#[derive(Debug, Clone)]
pub enum UserChange {
    Part { channel: String },
    Quit,
    Away(bool),
    RealName(String),
}

impl UserEvent {
    pub fn name(&self) -> &'static str {
        match &self.change {
            UserChange::Part { .. } => "user.part",
            UserChange::Quit => "user.quit",
            UserChange::Away(_) => "user.away",
            UserChange::RealName(_) => "user.realname",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub network: NetworkId,
    pub channel: String,
    pub change: ChannelChange,
}

#[derive(Debug, Clone)]
pub enum ChannelChange {
    Join(Vec<String>),
    AddUserMode { nick: String, mode: String },
    RemoveUserMode { nick: String, mode: String },
    Topic(String),
}

impl ChannelEvent {
    pub fn name(&self) -> &'static str {
        match &self.change {
            ChannelChange::Join(_) => "channel.join",
            ChannelChange::AddUserMode { .. } => "channel.addusermode",
            ChannelChange::RemoveUserMode { .. } => "channel.removeusermode",
            ChannelChange::Topic(_) => "channel.topic",
        }
    }
}

#[derive(Debug, Clone)]
pub enum IdentityEvent {
    Updated(IdentityId),
    New(IdentityId),
    Remove(IdentityId),
}

impl IdentityEvent {
    pub fn name(&self) -> &'static str {
        match self {
            IdentityEvent::Updated(_) => "identity",
            IdentityEvent::New(_) => "identity.new",
            IdentityEvent::Remove(_) => "identity.remove",
        }
    }
}

/// Rule-set replacement notifications (whole-list imports).
#[derive(Debug, Clone)]
pub enum RuleEvent {
    IgnoreList,
    Aliases,
    HighlightRules,
}

impl RuleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RuleEvent::IgnoreList => "ignorelist",
            RuleEvent::Aliases => "aliases",
            RuleEvent::HighlightRules => "highlightrules",
        }
    }
}
