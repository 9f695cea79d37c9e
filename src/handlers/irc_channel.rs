use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::IrcBuffer;
use crate::types::events::{BufferChange, ChannelChange, UserChange};
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub struct IrcChannelHandler;

#[async_trait]
impl SyncHandler for IrcChannelHandler {
    fn class_name(&self) -> &'static str {
        "IrcChannel"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        let Some((network_id, channel)) = super::split_composite_id(object_id) else {
            return Err(ProtocolError::Malformed(format!(
                "bad IrcChannel object id '{object_id}'"
            )));
        };
        let mut reader = ArgReader::new(args);
        let mut state = client.state.lock().await;
        let Some(network) = state.networks.get_mut(network_id) else {
            warn!(target: "Session/IrcChannel", "Sync for unknown network {network_id}, dropping");
            return Ok(true);
        };
        let own_nick = network.my_nick().map(str::to_owned);
        let Some(buffer) = network.buffers.by_name_mut(channel) else {
            warn!(
                target: "Session/IrcChannel",
                "Sync for unknown channel '{channel}' on network {network_id}, dropping"
            );
            return Ok(true);
        };

        match function {
            "joinIrcUsers" => {
                let nicks = reader.string_list();
                let modes = reader.string_list();
                reader.finish()?;
                for (row, nick) in nicks.iter().enumerate() {
                    buffer.add_member(
                        nick.clone(),
                        modes.get(row).cloned().unwrap_or_default(),
                    );
                }
                client.emit_channel(
                    network_id,
                    channel.to_owned(),
                    ChannelChange::Join(nicks),
                );
            }
            "part" => {
                let nick = reader.text();
                reader.finish()?;
                if buffer.remove_member(&nick) {
                    let buffer_id = buffer.id();
                    if own_nick.is_some_and(|mine| mine.eq_ignore_ascii_case(&nick)) {
                        buffer.is_active = false;
                        client.emit_buffer(buffer_id, BufferChange::Deactivate);
                    }
                    client.emit_user(
                        network_id,
                        nick,
                        UserChange::Part {
                            channel: channel.to_owned(),
                        },
                    );
                }
            }
            "setTopic" => {
                let topic = reader.text();
                reader.finish()?;
                buffer.topic = topic.clone();
                client.emit_channel(network_id, channel.to_owned(), ChannelChange::Topic(topic));
            }
            "addUserMode" => {
                let nick = reader.text();
                let mode = reader.text();
                reader.finish()?;
                let Some(member) = buffer.member_mut(&nick) else {
                    warn!(target: "Session/IrcChannel", "Mode for unknown member '{nick}', dropping");
                    return Ok(true);
                };
                member.add_mode(&mode);
                client.emit_channel(
                    network_id,
                    channel.to_owned(),
                    ChannelChange::AddUserMode { nick, mode },
                );
            }
            "removeUserMode" => {
                let nick = reader.text();
                let mode = reader.text();
                reader.finish()?;
                let Some(member) = buffer.member_mut(&nick) else {
                    warn!(target: "Session/IrcChannel", "Mode for unknown member '{nick}', dropping");
                    return Ok(true);
                };
                member.remove_mode(&mode);
                client.emit_channel(
                    network_id,
                    channel.to_owned(),
                    ChannelChange::RemoveUserMode { nick, mode },
                );
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        let Some((network_id, channel)) = super::split_composite_id(object_id) else {
            return Err(ProtocolError::Malformed(format!(
                "bad IrcChannel object id '{object_id}'"
            )));
        };
        let mut state = client.state.lock().await;
        let Some(network) = state.networks.get_mut(network_id) else {
            warn!(target: "Session/IrcChannel", "Init data for unknown network {network_id}, dropping");
            return Ok(());
        };
        if !network.buffers.contains_name(channel) {
            network
                .buffers
                .insert(IrcBuffer::new(network_id, channel.to_owned()));
        }
        let Some(buffer) = network.buffers.by_name_mut(channel) else {
            return Ok(());
        };
        if let Some(topic) = data.get("topic").and_then(Value::as_text) {
            buffer.topic = topic.into_owned();
        }
        if let Some(user_modes) = data.get("UserModes").and_then(Value::as_map) {
            for (nick, modes) in user_modes {
                let modes = modes.as_text().map(|m| m.into_owned()).unwrap_or_default();
                buffer.add_member(nick.clone(), modes);
            }
        }
        Ok(())
    }
}
