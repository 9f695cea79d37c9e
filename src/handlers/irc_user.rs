use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::IrcUser;
use crate::types::events::{BufferChange, NetworkChange, UserChange};
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub struct IrcUserHandler;

#[async_trait]
impl SyncHandler for IrcUserHandler {
    fn class_name(&self) -> &'static str {
        "IrcUser"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        let Some((network_id, nick)) = super::split_composite_id(object_id) else {
            return Err(ProtocolError::Malformed(format!(
                "bad IrcUser object id '{object_id}'"
            )));
        };
        let mut reader = ArgReader::new(args);
        let mut state = client.state.lock().await;
        let Some(network) = state.networks.get_mut(network_id) else {
            warn!(target: "Session/IrcUser", "Sync for unknown network {network_id}, dropping");
            return Ok(true);
        };

        match function {
            "setNick" => {
                let new_nick = reader.text();
                reader.finish()?;
                if network.rename_user(nick, &new_nick) {
                    client.emit_network(
                        network_id,
                        NetworkChange::UserRenamed {
                            old_nick: nick.to_owned(),
                            new_nick,
                        },
                    );
                } else {
                    warn!(target: "Session/IrcUser", "Rename of unknown user '{nick}', dropping");
                }
            }
            "setAway" => {
                let away = reader.bool();
                reader.finish()?;
                let Some(user) = network.user_mut(nick) else {
                    warn!(target: "Session/IrcUser", "Away for unknown user '{nick}', dropping");
                    return Ok(true);
                };
                user.away = away;
                client.emit_user(network_id, nick.to_owned(), UserChange::Away(away));
            }
            "setAwayMessage" => {
                let message = reader.text();
                reader.finish()?;
                if let Some(user) = network.user_mut(nick) {
                    user.away_message = message;
                }
            }
            "setRealName" => {
                let real_name = reader.text();
                reader.finish()?;
                let Some(user) = network.user_mut(nick) else {
                    warn!(target: "Session/IrcUser", "Real name for unknown user '{nick}', dropping");
                    return Ok(true);
                };
                user.real_name = real_name.clone();
                client.emit_user(network_id, nick.to_owned(), UserChange::RealName(real_name));
            }
            "setIdleTime" => {
                let idle = reader.datetime();
                reader.finish()?;
                if let Some(user) = network.user_mut(nick) {
                    user.idle_time = idle;
                }
            }
            "setLoginTime" => {
                let login = reader.datetime();
                reader.finish()?;
                if let Some(user) = network.user_mut(nick) {
                    user.login_time = login;
                }
            }
            "updateHostmask" => {
                let mask = reader.text();
                reader.finish()?;
                if let Some(user) = network.user_mut(nick) {
                    let fresh = IrcUser::new(mask);
                    user.user = fresh.user.clone();
                    user.host = fresh.host.clone();
                }
            }
            "partChannel" => {
                let channel = reader.text();
                reader.finish()?;
                let own_nick = network
                    .my_nick()
                    .is_some_and(|mine| mine.eq_ignore_ascii_case(nick));
                let Some(buffer) = network.buffers.by_name_mut(&channel) else {
                    warn!(target: "Session/IrcUser", "Part from unknown buffer '{channel}', dropping");
                    return Ok(true);
                };
                if buffer.remove_member(nick) {
                    let buffer_id = buffer.id();
                    if own_nick {
                        buffer.is_active = false;
                        client.emit_buffer(buffer_id, BufferChange::Deactivate);
                    }
                    client.emit_user(
                        network_id,
                        nick.to_owned(),
                        UserChange::Part { channel },
                    );
                }
            }
            "quit" => {
                reader.finish()?;
                let outcome = network.remove_user(nick);
                for buffer in outcome.deactivated {
                    client.emit_buffer(buffer, BufferChange::Deactivate);
                }
                client.emit_user(network_id, nick.to_owned(), UserChange::Quit);
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
        let Some((network_id, nick)) = super::split_composite_id(object_id) else {
            return Err(ProtocolError::Malformed(format!(
                "bad IrcUser object id '{object_id}'"
            )));
        };
        let mut state = client.state.lock().await;
        let Some(network) = state.networks.get_mut(network_id) else {
            warn!(target: "Session/IrcUser", "Init data for unknown network {network_id}, dropping");
            return Ok(());
        };
        match network.user_mut(nick) {
            Some(user) => user.update(&data),
            None => {
                let mut user = IrcUser::new(nick);
                user.update(&data);
                network.add_user(user);
            }
        }
        Ok(())
    }
}
