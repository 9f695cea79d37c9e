//! RPC frame dispatch: one-shot remote calls routed by their signature
//! string.

use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::{Identity, IrcBuffer, IrcMessage, Network};
use crate::request::init_request_frame;
use crate::types::events::{BufferChange, IdentityEvent, NetworkChange, SessionEvent};
use crate::types::{BufferType, WireMessage};
use crate::value::{ArgReader, Value};
use log::warn;
use std::sync::Arc;

pub async fn handle_rpc(
    client: &Arc<Client>,
    function: &str,
    args: &[Value],
) -> Result<(), ProtocolError> {
    let mut reader = ArgReader::new(args);
    match function {
        "2displayMsg(Message)" => {
            let message = reader.message();
            reader.finish()?;
            let Some(message) = message else {
                return Err(ProtocolError::Malformed("displayMsg without Message".into()));
            };
            handle_display_msg(client, message).await;
        }
        "__objectRenamed__" => {
            let class_name = reader.text();
            let new_id = reader.text();
            let old_id = reader.text();
            reader.finish()?;
            handle_object_renamed(client, &class_name, &new_id, &old_id).await;
        }
        "2networkCreated(NetworkId)" => {
            let network_id = reader.network_id();
            reader.finish()?;
            client
                .state
                .lock()
                .await
                .networks
                .add(Network::new(network_id));
            client.emit_network(network_id, NetworkChange::New);
            client
                .send_frame_logged(init_request_frame("Network", &network_id.to_string()))
                .await;
        }
        "2networkRemoved(NetworkId)" => {
            let network_id = reader.network_id();
            reader.finish()?;
            if client
                .state
                .lock()
                .await
                .networks
                .remove(network_id)
                .is_none()
            {
                warn!(target: "Session/Rpc", "Removal of unknown network {network_id}, dropping");
                return Ok(());
            }
            client.emit_network(network_id, NetworkChange::Remove);
        }
        "2identityCreated(Identity)" => {
            let fields = reader.map();
            reader.finish()?;
            let identity = Identity::from_wire_map(&fields);
            let id = identity.id;
            client.state.lock().await.identities.insert(id, identity);
            client.emit_identity(IdentityEvent::New(id));
        }
        "2identityRemoved(IdentityId)" => {
            let id = reader.identity_id();
            reader.finish()?;
            if client.state.lock().await.identities.remove(&id).is_none() {
                warn!(target: "Session/Rpc", "Removal of unknown identity {id}, dropping");
                return Ok(());
            }
            client.emit_identity(IdentityEvent::Remove(id));
        }
        other => {
            warn!(target: "Session/Rpc", "Unhandled rpc call '{other}'");
            client.emit_session(SessionEvent::Unhandled(format!("rpc {other}")));
        }
    }
    Ok(())
}

/// Resolve the target buffer (by id, then by pending name, else create it),
/// append the message and re-derive its highlight flags.
async fn handle_display_msg(client: &Arc<Client>, wire: WireMessage) {
    let info = wire.buffer.clone();
    let mut created = false;
    let mut message = IrcMessage::from_wire(wire);

    let mut state = client.state.lock().await;
    {
        let Some(network) = state.networks.get_mut(info.network) else {
            warn!(
                target: "Session/Rpc",
                "Message for unknown network {}, dropping", info.network
            );
            return;
        };
        if network.buffers.contains_id(info.id) {
            // Already tracked under this id.
        } else if network.buffers.contains_name(&info.name) {
            // A pending buffer matches by name: re-index it under the
            // core-assigned id instead of duplicating it.
            if info.id.is_valid() {
                network.buffers.assign_id(&info.name, info.id);
            }
        } else {
            let buffer = IrcBuffer::from_info(&info);
            if info.buffer_type == BufferType::Status {
                network.set_status_buffer(info.id);
            }
            network.buffers.insert(buffer);
            created = true;
        }
    }

    state.update_message_flags(&mut message, info.network);

    let Some(network) = state.networks.get_mut(info.network) else {
        return;
    };
    let target = if info.id.is_valid() {
        network.buffers.by_id_mut(info.id)
    } else {
        network.buffers.by_name_mut(&info.name)
    };
    let Some(target) = target else {
        warn!(target: "Session/Rpc", "Buffer for message vanished, dropping");
        return;
    };
    message.buffer = target.id();
    let message_id = message.id;
    let buffer_id = target.id();
    target.add_message(message);
    drop(state);

    if created {
        client.emit_network(info.network, NetworkChange::AddBuffer(info.id));
    }
    client.emit_buffer(buffer_id, BufferChange::Message(message_id));
}

/// `__objectRenamed__` carries the class name plus new/old object ids. Only
/// IrcUser renames touch local state; anything else is reported unhandled.
async fn handle_object_renamed(client: &Arc<Client>, class_name: &str, new_id: &str, old_id: &str) {
    match class_name {
        "IrcUser" => {
            let Some((network_id, new_nick)) = super::split_composite_id(new_id) else {
                warn!(target: "Session/Rpc", "Bad renamed object id '{new_id}', dropping");
                return;
            };
            let Some((_, old_nick)) = super::split_composite_id(old_id) else {
                warn!(target: "Session/Rpc", "Bad renamed object id '{old_id}', dropping");
                return;
            };
            let mut state = client.state.lock().await;
            let Some(network) = state.networks.get_mut(network_id) else {
                warn!(target: "Session/Rpc", "Rename on unknown network {network_id}, dropping");
                return;
            };
            if network.rename_user(old_nick, new_nick) {
                drop(state);
                client.emit_network(
                    network_id,
                    NetworkChange::UserRenamed {
                        old_nick: old_nick.to_owned(),
                        new_nick: new_nick.to_owned(),
                    },
                );
            } else {
                warn!(target: "Session/Rpc", "Rename of unknown user '{old_nick}', dropping");
            }
        }
        other => {
            client.emit_session(SessionEvent::Unhandled(format!("rename {other}")));
        }
    }
}
