//! The protocol dispatcher: frame-type state machine plus the per-class
//! handler tables that apply inbound frames to the entity model.

pub mod backlog;
pub mod buffer_syncer;
pub mod buffer_view;
pub mod handshake;
pub mod identity;
pub mod irc_channel;
pub mod irc_user;
pub mod network;
pub mod router;
pub mod rpc;
pub mod rules;
pub mod traits;

use crate::client::Client;
use crate::error::ProtocolError;
use crate::request::{FrameType, heartbeat_reply_frame};
use crate::types::NetworkId;
use crate::types::events::SessionEvent;
use crate::value::{ArgReader, Value};
use log::warn;
use router::ClassRouter;
use std::sync::Arc;

pub(crate) fn build_router() -> ClassRouter {
    let mut router = ClassRouter::new();
    router.register(Arc::new(network::NetworkHandler));
    router.register(Arc::new(buffer_syncer::BufferSyncerHandler));
    router.register(Arc::new(buffer_view::BufferViewManagerHandler));
    router.register(Arc::new(buffer_view::BufferViewConfigHandler));
    router.register(Arc::new(irc_user::IrcUserHandler));
    router.register(Arc::new(irc_channel::IrcChannelHandler));
    router.register(Arc::new(backlog::BacklogManagerHandler));
    router.register(Arc::new(identity::IdentityHandler));
    router.register(Arc::new(rules::IgnoreListManagerHandler));
    router.register(Arc::new(rules::AliasManagerHandler));
    router.register(Arc::new(rules::HighlightRuleManagerHandler));
    router.register(Arc::new(rules::CoreInfoHandler));
    router
}

/// `IrcUser`/`IrcChannel` objects are addressed as `"<networkId>/<name>"`;
/// split once on the first `/` (names may contain further slashes).
pub(crate) fn split_composite_id(object_id: &str) -> Option<(NetworkId, &str)> {
    let (network, name) = object_id.split_once('/')?;
    let id = network.parse::<i32>().ok()?;
    Some((NetworkId(id), name))
}

/// Dispatch one decoded frame. Protocol errors are absorbed here: logged and
/// surfaced as an `error` event, the connection stays up and the model keeps
/// the state it had before the offending frame.
pub async fn dispatch_frame(client: &Arc<Client>, frame: Value) {
    let result = match frame {
        Value::Map(map) => handshake::handle_handshake_message(client, map).await,
        Value::List(items) => dispatch_session_frame(client, &items).await,
        other => Err(ProtocolError::Malformed(format!(
            "expected handshake map or session list, got {}",
            other.kind()
        ))),
    };
    if let Err(e) = result {
        warn!(target: "Session", "Dropping frame: {e}");
        client.emit_session(SessionEvent::Error(e.to_string()));
    }
}

async fn dispatch_session_frame(
    client: &Arc<Client>,
    items: &[Value],
) -> Result<(), ProtocolError> {
    let mut reader = ArgReader::new(items);
    let code = reader.i64();
    if !reader.ok() {
        return Err(ProtocolError::Malformed("empty session frame".into()));
    }
    let frame_type =
        FrameType::from_wire(code).ok_or(ProtocolError::UnknownFrameType(code))?;

    match frame_type {
        FrameType::Sync => {
            let class_name = reader.text();
            let object_id = reader.text();
            let function = reader.text();
            if let Some(e) = reader.errors.first() {
                return Err(ProtocolError::Value(e.clone()));
            }
            let args = reader.remaining();
            let handled = client
                .router
                .dispatch_sync(client, &class_name, &object_id, &function, args)
                .await?;
            if !handled {
                warn!(
                    target: "Session",
                    "Unhandled sync {class_name}::{function} for '{object_id}'"
                );
                client.emit_session(SessionEvent::Unhandled(format!(
                    "sync {class_name}::{function}"
                )));
            }
        }
        FrameType::RpcCall => {
            let function = reader.text();
            if !reader.ok() {
                return Err(ProtocolError::Malformed("rpc frame without function".into()));
            }
            rpc::handle_rpc(client, &function, reader.remaining()).await?;
        }
        FrameType::InitData => {
            let class_name = reader.text();
            let object_id = reader.text();
            let data = reader.map();
            reader.finish()?;
            let handled = client
                .router
                .dispatch_init(client, &class_name, &object_id, data)
                .await?;
            if !handled {
                warn!(target: "Session", "Init data for unknown class {class_name}");
                client.emit_session(SessionEvent::Unhandled(format!(
                    "initdata {class_name}"
                )));
            }
        }
        FrameType::HeartBeat => {
            // Echo the received time straight back.
            let time = items.get(1).cloned().unwrap_or(Value::None);
            client.send_frame_logged(heartbeat_reply_frame(time)).await;
        }
        FrameType::HeartBeatReply => {
            client.handle_heartbeat_reply().await;
        }
        FrameType::InitRequest => {
            warn!(target: "Session", "Core sent an init request; dropping");
            client.emit_session(SessionEvent::Unhandled("initrequest".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkId;

    #[test]
    fn composite_ids_split_on_first_slash_only() {
        assert_eq!(
            split_composite_id("1/#chan"),
            Some((NetworkId(1), "#chan"))
        );
        assert_eq!(
            split_composite_id("2/nick/odd"),
            Some((NetworkId(2), "nick/odd"))
        );
        assert_eq!(split_composite_id("no-slash"), None);
        assert_eq!(split_composite_id("x/#chan"), None);
    }
}
