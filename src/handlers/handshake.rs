//! Handshake-phase dispatch: tagged `MsgType` maps, login branching and the
//! session bootstrap on `SessionInit`.

use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::{Identity, IrcBuffer, Network};
use crate::request::init_request_frame;
use crate::session::SessionPhase;
use crate::types::events::{NetworkChange, SessionEvent};
use crate::types::{BufferType, MsgId};
use crate::value::{Value, VariantMap};
use log::{info, warn};
use std::sync::Arc;

pub async fn handle_handshake_message(
    client: &Arc<Client>,
    map: VariantMap,
) -> Result<(), ProtocolError> {
    let Some(msg_type) = map.get("MsgType").and_then(Value::as_text) else {
        return Err(ProtocolError::Malformed(
            "handshake map without MsgType".into(),
        ));
    };
    let msg_type = msg_type.into_owned();

    match msg_type.as_str() {
        "ClientInitAck" => handle_client_init_ack(client, map).await,
        "ClientInitReject" => {
            let message = error_text(&map);
            warn!(target: "Session", "Client init rejected: {message}");
            client.emit_session(SessionEvent::Error(message));
            Ok(())
        }
        "ClientLoginAck" => {
            info!(target: "Session", "Login accepted");
            client.state.lock().await.phase = SessionPhase::SessionBootstrap;
            client.emit_session(SessionEvent::Login);
            Ok(())
        }
        "ClientLoginReject" => {
            let message = error_text(&map);
            warn!(target: "Session", "Login rejected: {message}");
            client.emit_session(SessionEvent::LoginFailed(message));
            Ok(())
        }
        "CoreSetupAck" => {
            info!(target: "Session", "Core setup accepted, proceeding to login");
            client.emit_session(SessionEvent::SetupOk);
            if let Err(e) = client.login().await {
                warn!(target: "Session", "Login after setup failed: {e}");
                client.emit_session(SessionEvent::Error(e.to_string()));
            }
            Ok(())
        }
        "CoreSetupReject" => {
            let message = error_text(&map);
            warn!(target: "Session", "Core setup rejected: {message}");
            client.emit_session(SessionEvent::SetupFailed(message));
            Ok(())
        }
        "SessionInit" => handle_session_init(client, map).await,
        other => {
            warn!(target: "Session", "Unhandled handshake message '{other}'");
            client.emit_session(SessionEvent::Unhandled(other.to_owned()));
            Ok(())
        }
    }
}

async fn handle_client_init_ack(
    client: &Arc<Client>,
    map: VariantMap,
) -> Result<(), ProtocolError> {
    let configured = map.get("Configured").and_then(Value::as_bool).unwrap_or(false);
    let login_enabled = map
        .get("LoginEnabled")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    if !configured {
        info!(target: "Session", "Core is unconfigured, requesting setup");
        client.state.lock().await.phase = SessionPhase::Setup;
        client.emit_session(SessionEvent::Setup(map));
        return Ok(());
    }
    if !login_enabled {
        warn!(target: "Session", "Core supports no login flow this client understands");
        client.emit_session(SessionEvent::Error(
            "core does not offer a supported login flow".into(),
        ));
        return Ok(());
    }
    if let Err(e) = client.login().await {
        warn!(target: "Session", "Sending login failed: {e}");
        client.emit_session(SessionEvent::Error(e.to_string()));
    }
    Ok(())
}

/// Session bootstrap: seed the entity model from the `SessionState` snapshot,
/// then request full init data for every object the session tracks, seed the
/// initial backlog and start the heartbeat.
async fn handle_session_init(client: &Arc<Client>, map: VariantMap) -> Result<(), ProtocolError> {
    let Some(session_state) = map.get("SessionState").and_then(Value::as_map) else {
        return Err(ProtocolError::Malformed(
            "SessionInit without SessionState".into(),
        ));
    };

    let mut init_requests: Vec<Value> = Vec::new();
    let mut backlog_buffers = Vec::new();
    {
        let mut state = client.state.lock().await;
        state.phase = SessionPhase::Synchronized;

        if let Some(ids) = session_state.get("NetworkIds").and_then(Value::as_list) {
            for id in ids.iter().filter_map(Value::as_network_id) {
                state.networks.add(Network::new(id));
                client.emit_network(id, NetworkChange::New);
                init_requests.push(init_request_frame("Network", &id.to_string()));
            }
        }

        if let Some(infos) = session_state.get("BufferInfos").and_then(Value::as_list) {
            for info in infos.iter().filter_map(Value::as_buffer_info) {
                let Some(network) = state.networks.get_mut(info.network) else {
                    warn!(
                        target: "Session",
                        "Buffer {} references unknown network {}, dropping", info.id, info.network
                    );
                    continue;
                };
                let buffer = IrcBuffer::from_info(info);
                if info.buffer_type == BufferType::Status {
                    network.set_status_buffer(info.id);
                }
                if info.buffer_type == BufferType::Channel {
                    init_requests.push(init_request_frame(
                        "IrcChannel",
                        &format!("{}/{}", info.network, info.name),
                    ));
                }
                network.buffers.insert(buffer);
                client.emit_network(info.network, NetworkChange::AddBuffer(info.id));
                backlog_buffers.push(info.id);
            }
        }

        if let Some(identities) = session_state.get("Identities").and_then(Value::as_list) {
            for identity_map in identities.iter().filter_map(Value::as_map) {
                let identity = Identity::from_wire_map(identity_map);
                state.identities.insert(identity.id, identity);
            }
            client.emit_session(SessionEvent::IdentitiesInit);
        }
    }

    for class in [
        "BufferSyncer",
        "BufferViewManager",
        "IgnoreListManager",
        "AliasManager",
    ] {
        init_requests.push(init_request_frame(class, ""));
    }
    for frame in init_requests {
        client.send_frame_logged(frame).await;
    }
    let limit = client.config.initial_backlog_limit;
    for buffer in backlog_buffers {
        if let Err(e) = client
            .request_backlog(buffer, MsgId(-1), MsgId(-1), limit, 0)
            .await
        {
            warn!(target: "Session", "Initial backlog request for {buffer} failed: {e}");
        }
    }

    if !client
        .heartbeat_started
        .swap(true, std::sync::atomic::Ordering::AcqRel)
    {
        tokio::spawn(client.clone().heartbeat_loop());
    }

    info!(target: "Session", "Session bootstrap complete");
    client.emit_session(SessionEvent::Init);
    Ok(())
}

fn error_text(map: &VariantMap) -> String {
    map.get("Error")
        .and_then(Value::as_text)
        .map(|s| s.into_owned())
        .unwrap_or_else(|| "unknown error".into())
}
