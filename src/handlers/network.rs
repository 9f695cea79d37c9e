use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::{IrcBuffer, IrcUser, Network, NetworkServer};
use crate::types::events::{BufferChange, NetworkChange};
use crate::types::{ConnectionState, NetworkId};
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

pub struct NetworkHandler;

#[async_trait]
impl SyncHandler for NetworkHandler {
    fn class_name(&self) -> &'static str {
        "Network"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        let network_id = parse_network_id(object_id)?;
        let mut reader = ArgReader::new(args);

        // Follow-up requests are collected and written after the model
        // mutation, so a send failure cannot leave a frame half-applied.
        let mut follow_up: Option<(String, String)> = None;
        {
            let mut state = client.state.lock().await;
            let Some(network) = state.networks.get_mut(network_id) else {
                warn!(target: "Session/Network", "Sync for unknown network {network_id}, dropping");
                return Ok(true);
            };

            match function {
                "setMyNick" => {
                    let nick = reader.text();
                    reader.finish()?;
                    if let Some(old) = network.my_nick().map(str::to_owned)
                        && old != nick
                        && network.user(&old).is_some()
                    {
                        network.rename_user(&old, &nick);
                        client.emit_network(
                            network_id,
                            NetworkChange::UserRenamed {
                                old_nick: old,
                                new_nick: nick.clone(),
                            },
                        );
                    }
                    network.set_my_nick(nick.clone());
                    client.emit_network(network_id, NetworkChange::MyNick(nick));
                }
                "setLatency" => {
                    let latency = reader.i64();
                    reader.finish()?;
                    network.latency = latency as i32;
                    client.emit_network(network_id, NetworkChange::Latency(latency as i32));
                }
                "setNetworkName" => {
                    let name = reader.text();
                    reader.finish()?;
                    network.name = name.clone();
                    client.emit_network(network_id, NetworkChange::NetworkName(name));
                }
                "setCurrentServer" => {
                    let server = reader.text();
                    reader.finish()?;
                    network.current_server = server.clone();
                    client.emit_network(network_id, NetworkChange::Server(server));
                }
                "setConnected" => {
                    let connected = reader.bool();
                    reader.finish()?;
                    let status_buffer = network.set_connected(connected);
                    client.emit_network(
                        network_id,
                        if connected {
                            NetworkChange::Connected
                        } else {
                            NetworkChange::Disconnected
                        },
                    );
                    if let Some(buffer) = status_buffer {
                        client.emit_buffer(
                            buffer,
                            if connected {
                                BufferChange::Activate
                            } else {
                                BufferChange::Deactivate
                            },
                        );
                    }
                }
                "setConnectionState" => {
                    let raw = reader.i64();
                    reader.finish()?;
                    let connection_state = ConnectionState::from_wire(raw);
                    network.connection_state = connection_state;
                    client.emit_network(
                        network_id,
                        NetworkChange::ConnectionState(connection_state),
                    );
                }
                "addIrcUser" => {
                    let mask = reader.text();
                    reader.finish()?;
                    let user = IrcUser::new(mask);
                    let nick = user.nick().to_owned();
                    network.add_user(user);
                    follow_up = Some(("IrcUser".into(), format!("{network_id}/{nick}")));
                }
                "addIrcChannel" => {
                    let name = reader.text();
                    reader.finish()?;
                    if !network.buffers.contains_name(&name) {
                        network
                            .buffers
                            .insert(IrcBuffer::new(network_id, name.clone()));
                    }
                    follow_up = Some(("IrcChannel".into(), format!("{network_id}/{name}")));
                }
                "setIdentity" => {
                    let identity = reader.identity_id();
                    reader.finish()?;
                    network.identity = identity;
                    client.emit_network(network_id, NetworkChange::Identity(identity));
                }
                "setServerList" => {
                    let servers = reader.list();
                    reader.finish()?;
                    network.server_list = servers
                        .iter()
                        .filter_map(Value::as_map)
                        .map(NetworkServer::from_wire_map)
                        .collect();
                    client.emit_network(network_id, NetworkChange::ServerList);
                }
                "setCodecForServer" => {
                    let codec = reader.text();
                    reader.finish()?;
                    network.codec_for_server = codec.clone();
                    client.emit_network(network_id, NetworkChange::CodecServer(codec));
                }
                "setCodecForEncoding" => {
                    let codec = reader.text();
                    reader.finish()?;
                    network.codec_for_encoding = codec.clone();
                    client.emit_network(network_id, NetworkChange::CodecEncoding(codec));
                }
                "setCodecForDecoding" => {
                    let codec = reader.text();
                    reader.finish()?;
                    network.codec_for_decoding = codec.clone();
                    client.emit_network(network_id, NetworkChange::CodecDecoding(codec));
                }
                "setPerform" => {
                    let perform = reader.string_list();
                    reader.finish()?;
                    network.perform = perform.clone();
                    client.emit_network(network_id, NetworkChange::Perform(perform));
                }
                "setAutoReconnectInterval" => {
                    let interval = reader.i64();
                    reader.finish()?;
                    network.auto_reconnect_interval = interval as u32;
                    client.emit_network(
                        network_id,
                        NetworkChange::AutoReconnectInterval(interval as u32),
                    );
                }
                "setAutoReconnectRetries" => {
                    let retries = reader.i64();
                    reader.finish()?;
                    network.auto_reconnect_retries = retries as u16;
                    client.emit_network(
                        network_id,
                        NetworkChange::AutoReconnectRetries(retries as u16),
                    );
                }
                "setUnlimitedReconnectRetries" => {
                    let unlimited = reader.bool();
                    reader.finish()?;
                    network.unlimited_reconnect_retries = unlimited;
                    client.emit_network(
                        network_id,
                        NetworkChange::UnlimitedReconnectRetries(unlimited),
                    );
                }
                "setAutoIdentifyService" => {
                    let service = reader.text();
                    reader.finish()?;
                    network.auto_identify_service = service.clone();
                    client.emit_network(network_id, NetworkChange::AutoIdentifyService(service));
                }
                "setAutoIdentifyPassword" => {
                    let password = reader.text();
                    reader.finish()?;
                    network.auto_identify_password = password.clone();
                    client.emit_network(network_id, NetworkChange::AutoIdentifyPassword(password));
                }
                "setUseSasl" => {
                    let use_sasl = reader.bool();
                    reader.finish()?;
                    network.use_sasl = use_sasl;
                    client.emit_network(network_id, NetworkChange::UseSasl(use_sasl));
                }
                "setSaslAccount" => {
                    let account = reader.text();
                    reader.finish()?;
                    network.sasl_account = account.clone();
                    client.emit_network(network_id, NetworkChange::SaslAccount(account));
                }
                "setSaslPassword" => {
                    let password = reader.text();
                    reader.finish()?;
                    network.sasl_password = password.clone();
                    client.emit_network(network_id, NetworkChange::SaslPassword(password));
                }
                "setRejoinChannels" => {
                    let rejoin = reader.bool();
                    reader.finish()?;
                    network.rejoin_channels = rejoin;
                    client.emit_network(network_id, NetworkChange::RejoinChannels(rejoin));
                }
                "setUseCustomMessageRate" => {
                    let custom = reader.bool();
                    reader.finish()?;
                    network.use_custom_message_rate = custom;
                    client.emit_network(network_id, NetworkChange::UseCustomMessageRate(custom));
                }
                "setMessageRateBurstSize" => {
                    let burst = reader.i64();
                    reader.finish()?;
                    network.message_rate_burst_size = burst as u32;
                    client.emit_network(
                        network_id,
                        NetworkChange::MessageRateBurstSize(burst as u32),
                    );
                }
                "setMessageRateDelay" => {
                    let delay = reader.i64();
                    reader.finish()?;
                    network.message_rate_delay = delay as u32;
                    client
                        .emit_network(network_id, NetworkChange::MessageRateDelay(delay as u32));
                }
                "setUnlimitedMessageRate" => {
                    let unlimited = reader.bool();
                    reader.finish()?;
                    network.unlimited_message_rate = unlimited;
                    client
                        .emit_network(network_id, NetworkChange::UnlimitedMessageRate(unlimited));
                }
                _ => return Ok(false),
            }
        }

        if let Some((class_name, object_id)) = follow_up {
            client
                .send_frame_logged(crate::request::init_request_frame(&class_name, &object_id))
                .await;
        }
        Ok(true)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        let network_id = parse_network_id(object_id)?;
        let mut state = client.state.lock().await;
        let Some(network) = state.networks.get_mut(network_id) else {
            warn!(target: "Session/Network", "Init data for unknown network {network_id}, dropping");
            return Ok(());
        };

        apply_network_fields(network, &data);
        if let Some(collections) = data.get("IrcUsersAndChannels").and_then(Value::as_map) {
            apply_users_and_channels(network, collections);
        }
        if let Some(connected) = data.get("isConnected").and_then(Value::as_bool) {
            let status_buffer = network.set_connected(connected);
            if let Some(buffer) = status_buffer {
                client.emit_buffer(
                    buffer,
                    if connected {
                        BufferChange::Activate
                    } else {
                        BufferChange::Deactivate
                    },
                );
            }
        }
        client.emit_network(network_id, NetworkChange::Init);
        Ok(())
    }
}

fn parse_network_id(object_id: &str) -> Result<NetworkId, ProtocolError> {
    object_id
        .parse::<i32>()
        .map(NetworkId)
        .map_err(|_| ProtocolError::Malformed(format!("bad network object id '{object_id}'")))
}

/// Explicit wire-field table for the Network init snapshot.
fn apply_network_fields(network: &mut Network, data: &VariantMap) {
    for (key, value) in data {
        match key.as_str() {
            "networkName" => {
                if let Some(name) = value.as_text() {
                    network.name = name.into_owned();
                }
            }
            "myNick" => {
                if let Some(nick) = value.as_text() {
                    network.set_my_nick(nick.into_owned());
                }
            }
            "currentServer" => {
                if let Some(server) = value.as_text() {
                    network.current_server = server.into_owned();
                }
            }
            "latency" => {
                if let Some(latency) = value.as_i64() {
                    network.latency = latency as i32;
                }
            }
            "connectionState" => {
                if let Some(raw) = value.as_i64() {
                    network.connection_state = ConnectionState::from_wire(raw);
                }
            }
            "identityId" => {
                if let Some(identity) = value.as_identity_id() {
                    network.identity = identity;
                }
            }
            "ServerList" => {
                if let Some(servers) = value.as_list() {
                    network.server_list = servers
                        .iter()
                        .filter_map(Value::as_map)
                        .map(NetworkServer::from_wire_map)
                        .collect();
                }
            }
            "codecForServer" => {
                if let Some(codec) = value.as_text() {
                    network.codec_for_server = codec.into_owned();
                }
            }
            "codecForEncoding" => {
                if let Some(codec) = value.as_text() {
                    network.codec_for_encoding = codec.into_owned();
                }
            }
            "codecForDecoding" => {
                if let Some(codec) = value.as_text() {
                    network.codec_for_decoding = codec.into_owned();
                }
            }
            "perform" => {
                if let Some(perform) = value.as_string_list() {
                    network.perform = perform;
                }
            }
            "autoReconnectInterval" => {
                if let Some(interval) = value.as_i64() {
                    network.auto_reconnect_interval = interval as u32;
                }
            }
            "autoReconnectRetries" => {
                if let Some(retries) = value.as_i64() {
                    network.auto_reconnect_retries = retries as u16;
                }
            }
            "unlimitedReconnectRetries" => {
                if let Some(unlimited) = value.as_bool() {
                    network.unlimited_reconnect_retries = unlimited;
                }
            }
            "autoIdentifyService" => {
                if let Some(service) = value.as_text() {
                    network.auto_identify_service = service.into_owned();
                }
            }
            "autoIdentifyPassword" => {
                if let Some(password) = value.as_text() {
                    network.auto_identify_password = password.into_owned();
                }
            }
            "useSasl" => {
                if let Some(use_sasl) = value.as_bool() {
                    network.use_sasl = use_sasl;
                }
            }
            "saslAccount" => {
                if let Some(account) = value.as_text() {
                    network.sasl_account = account.into_owned();
                }
            }
            "saslPassword" => {
                if let Some(password) = value.as_text() {
                    network.sasl_password = password.into_owned();
                }
            }
            "rejoinChannels" => {
                if let Some(rejoin) = value.as_bool() {
                    network.rejoin_channels = rejoin;
                }
            }
            "useCustomMessageRate" => {
                if let Some(custom) = value.as_bool() {
                    network.use_custom_message_rate = custom;
                }
            }
            "msgRateBurstSize" => {
                if let Some(burst) = value.as_i64() {
                    network.message_rate_burst_size = burst as u32;
                }
            }
            "msgRateMessageDelay" => {
                if let Some(delay) = value.as_i64() {
                    network.message_rate_delay = delay as u32;
                }
            }
            "unlimitedMessageRate" => {
                if let Some(unlimited) = value.as_bool() {
                    network.unlimited_message_rate = unlimited;
                }
            }
            "isConnected" | "IrcUsersAndChannels" => {}
            other => {
                debug!(target: "Session/Network", "Ignoring unknown network field '{other}'");
            }
        }
    }
}

fn apply_users_and_channels(network: &mut Network, collections: &VariantMap) {
    if let Some(users) = collections.get("Users").and_then(Value::as_map) {
        for (nick, fields) in users {
            let Some(fields) = fields.as_map() else {
                continue;
            };
            let ident = fields
                .get("user")
                .and_then(Value::as_text)
                .unwrap_or_default();
            let host = fields
                .get("host")
                .and_then(Value::as_text)
                .unwrap_or_default();
            let mask = if ident.is_empty() && host.is_empty() {
                nick.clone()
            } else {
                format!("{nick}!{ident}@{host}")
            };
            let mut user = IrcUser::new(mask);
            user.update(fields);
            network.add_user(user);
        }
    }
    if let Some(channels) = collections.get("Channels").and_then(Value::as_map) {
        for (name, fields) in channels {
            let Some(fields) = fields.as_map() else {
                continue;
            };
            let network_id = network.id;
            if !network.buffers.contains_name(name) {
                network.buffers.insert(IrcBuffer::new(network_id, name.clone()));
            }
            let Some(buffer) = network.buffers.by_name_mut(name) else {
                continue;
            };
            if let Some(topic) = fields.get("topic").and_then(Value::as_text) {
                buffer.topic = topic.into_owned();
            }
            if let Some(user_modes) = fields.get("UserModes").and_then(Value::as_map) {
                for (member, modes) in user_modes {
                    let modes = modes
                        .as_text()
                        .map(|m| m.into_owned())
                        .unwrap_or_default();
                    buffer.add_member(member.clone(), modes);
                }
            }
        }
    }
}
