use crate::model::{
    AliasManager, HighlightMode, HighlightRuleManager, Identity, IgnoreList, NetworkCollection,
};
use crate::types::{IdentityId, NetworkId};
use std::collections::BTreeMap;

/// Where the connection stands in the handshake/session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Preamble sent, waiting for the core's magic-number word.
    #[default]
    AwaitingMagicAck,
    /// ClientInit sent, waiting for ClientInitAck.
    AwaitingClientInitAck,
    /// Core reported itself unconfigured; waiting for a setup request.
    Setup,
    /// ClientLogin sent, waiting for ClientLoginAck.
    AwaitingLoginAck,
    /// Logged in, waiting for SessionInit.
    SessionBootstrap,
    /// Bootstrapped; incremental sync is live.
    Synchronized,
}

/// Everything one inbound frame may mutate. Owned by the client behind a
/// single lock held for the duration of a frame's dispatch, which is what
/// makes each frame's mutation atomic.
#[derive(Debug, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub networks: NetworkCollection,
    pub identities: BTreeMap<IdentityId, Identity>,
    pub buffer_views: BTreeMap<i32, crate::model::BufferView>,
    pub ignore_list: IgnoreList,
    pub aliases: AliasManager,
    pub highlights: HighlightRuleManager,
    pub highlight_mode: HighlightMode,
}

impl SessionState {
    pub fn new(highlight_mode: HighlightMode) -> Self {
        SessionState {
            highlight_mode,
            ..Default::default()
        }
    }

    /// The identity assigned to a network, if both still exist.
    pub fn identity_for_network(&self, network: NetworkId) -> Option<&Identity> {
        let identity_id = self.networks.get(network)?.identity;
        self.identities.get(&identity_id)
    }

    /// Re-derive a message's highlight bit against the owning network's nick
    /// and identity, under the session's current highlight mode.
    pub fn update_message_flags(
        &self,
        message: &mut crate::model::IrcMessage,
        network: NetworkId,
    ) {
        let Some(net) = self.networks.get(network) else {
            return;
        };
        let identity = self.identities.get(&net.identity);
        message.update_flags(net.my_nick(), identity, self.highlight_mode);
    }
}
