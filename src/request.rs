//! Outbound frame builders: every user-initiated action becomes exactly one
//! frame of the session protocol's two shapes (tagged handshake map, or
//! positional list led by a frame-type code).

use crate::client::Client;
use crate::error::ClientError;
use crate::model::{AliasManager, HighlightRuleManager, Identity, IgnoreList};
use crate::types::{BufferId, IdentityId, MsgId, NetworkId};
use crate::value::{Value, VariantMap};
use chrono::Timelike;

/// Top-level frame-type codes of session frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum FrameType {
    Sync = 1,
    RpcCall = 2,
    InitRequest = 3,
    InitData = 4,
    HeartBeat = 5,
    HeartBeatReply = 6,
}

impl FrameType {
    pub fn from_wire(code: i64) -> Option<FrameType> {
        match code {
            1 => Some(FrameType::Sync),
            2 => Some(FrameType::RpcCall),
            3 => Some(FrameType::InitRequest),
            4 => Some(FrameType::InitData),
            5 => Some(FrameType::HeartBeat),
            6 => Some(FrameType::HeartBeatReply),
            _ => None,
        }
    }
}

/// `[Sync, className, objectId, function, ...args]`
pub fn sync_frame(
    class_name: &str,
    object_id: &str,
    function: &str,
    args: Vec<Value>,
) -> Value {
    let mut frame = vec![
        Value::Int(FrameType::Sync as i64),
        Value::Bytes(class_name.as_bytes().to_vec()),
        Value::Bytes(object_id.as_bytes().to_vec()),
        Value::Bytes(function.as_bytes().to_vec()),
    ];
    frame.extend(args);
    Value::List(frame)
}

/// `[RpcCall, "2" + signature, ...args]`
pub fn rpc_frame(signature: &str, args: Vec<Value>) -> Value {
    let mut frame = vec![
        Value::Int(FrameType::RpcCall as i64),
        Value::Bytes(format!("2{signature}").into_bytes()),
    ];
    frame.extend(args);
    Value::List(frame)
}

/// `[InitRequest, className, objectId]`
pub fn init_request_frame(class_name: &str, object_id: &str) -> Value {
    Value::List(vec![
        Value::Int(FrameType::InitRequest as i64),
        Value::Bytes(class_name.as_bytes().to_vec()),
        Value::Bytes(object_id.as_bytes().to_vec()),
    ])
}

/// `[HeartBeat, time-of-day]`
pub fn heartbeat_frame() -> Value {
    Value::List(vec![
        Value::Int(FrameType::HeartBeat as i64),
        Value::Time(time_of_day_ms()),
    ])
}

/// `[HeartBeatReply, echoed time]`
pub fn heartbeat_reply_frame(time: Value) -> Value {
    Value::List(vec![Value::Int(FrameType::HeartBeatReply as i64), time])
}

fn time_of_day_ms() -> u32 {
    let now = chrono::Utc::now().time();
    now.num_seconds_from_midnight() * 1000 + now.nanosecond() / 1_000_000
}

impl Client {
    pub(crate) async fn send_init_request(
        &self,
        class_name: &str,
        object_id: &str,
    ) -> Result<(), ClientError> {
        self.send_frame(init_request_frame(class_name, object_id))
            .await
    }

    /// Send a chat line to a buffer. The wire wants the full `BufferInfo`, so
    /// the buffer must still exist locally.
    pub async fn send_input(&self, buffer: BufferId, message: &str) -> Result<(), ClientError> {
        let info = {
            let state = self.state.lock().await;
            state
                .networks
                .buffer(buffer)
                .map(|b| b.info())
                .ok_or(ClientError::NotConnected)?
        };
        self.send_frame(rpc_frame(
            "sendInput(BufferInfo,QString)",
            vec![Value::BufferInfo(info), Value::from(message)],
        ))
        .await
    }

    /// Ask the backlog manager for `limit` messages of one buffer.
    /// `first`/`last` bound the range; `MsgId(-1)` leaves a bound open.
    pub async fn request_backlog(
        &self,
        buffer: BufferId,
        first: MsgId,
        last: MsgId,
        limit: i32,
        additional: i32,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BacklogManager",
            "",
            "requestBacklog",
            vec![
                Value::from(buffer),
                Value::from(first),
                Value::from(last),
                Value::Int(limit as i64),
                Value::Int(additional as i64),
            ],
        ))
        .await
    }

    pub async fn mark_buffer_as_read(&self, buffer: BufferId) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferSyncer",
            "",
            "requestMarkBufferAsRead",
            vec![Value::from(buffer)],
        ))
        .await
    }

    pub async fn set_last_seen_msg(
        &self,
        buffer: BufferId,
        msg: MsgId,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferSyncer",
            "",
            "requestSetLastSeenMsg",
            vec![Value::from(buffer), Value::from(msg)],
        ))
        .await
    }

    pub async fn set_marker_line(&self, buffer: BufferId, msg: MsgId) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferSyncer",
            "",
            "requestSetMarkerLine",
            vec![Value::from(buffer), Value::from(msg)],
        ))
        .await
    }

    pub async fn remove_buffer(&self, buffer: BufferId) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferSyncer",
            "",
            "requestRemoveBuffer",
            vec![Value::from(buffer)],
        ))
        .await
    }

    pub async fn rename_buffer(
        &self,
        buffer: BufferId,
        new_name: &str,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferSyncer",
            "",
            "requestRenameBuffer",
            vec![Value::from(buffer), Value::from(new_name)],
        ))
        .await
    }

    pub async fn merge_buffers_permanently(
        &self,
        target: BufferId,
        source: BufferId,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferSyncer",
            "",
            "requestMergeBuffersPermanently",
            vec![Value::from(target), Value::from(source)],
        ))
        .await
    }

    /// Hide a buffer in one view until the next session.
    pub async fn hide_buffer_temporarily(
        &self,
        view: i32,
        buffer: BufferId,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferViewConfig",
            &view.to_string(),
            "requestRemoveBuffer",
            vec![Value::from(buffer)],
        ))
        .await
    }

    pub async fn hide_buffer_permanently(
        &self,
        view: i32,
        buffer: BufferId,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferViewConfig",
            &view.to_string(),
            "requestRemoveBufferPermanently",
            vec![Value::from(buffer)],
        ))
        .await
    }

    /// Put a hidden buffer back into a view's visible list.
    pub async fn unhide_buffer(
        &self,
        view: i32,
        buffer: BufferId,
        position: i32,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "BufferViewConfig",
            &view.to_string(),
            "requestAddBuffer",
            vec![Value::from(buffer), Value::Int(position as i64)],
        ))
        .await
    }

    pub async fn create_network(&self, network_info: VariantMap) -> Result<(), ClientError> {
        self.send_frame(rpc_frame(
            "createNetwork(NetworkInfo)",
            vec![Value::Map(network_info)],
        ))
        .await
    }

    pub async fn remove_network(&self, network: NetworkId) -> Result<(), ClientError> {
        self.send_frame(rpc_frame(
            "removeNetwork(NetworkId)",
            vec![Value::from(network)],
        ))
        .await
    }

    pub async fn connect_network(&self, network: NetworkId) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "Network",
            &network.to_string(),
            "requestConnect",
            Vec::new(),
        ))
        .await
    }

    pub async fn disconnect_network(&self, network: NetworkId) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "Network",
            &network.to_string(),
            "requestDisconnect",
            Vec::new(),
        ))
        .await
    }

    pub async fn set_network_info(
        &self,
        network: NetworkId,
        info: VariantMap,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "Network",
            &network.to_string(),
            "requestSetNetworkInfo",
            vec![Value::Map(info)],
        ))
        .await
    }

    pub async fn create_identity(&self, identity: &Identity) -> Result<(), ClientError> {
        self.send_frame(rpc_frame(
            "createIdentity(Identity,QVariantMap)",
            vec![
                Value::Map(identity.to_wire_map()),
                Value::Map(VariantMap::new()),
            ],
        ))
        .await
    }

    pub async fn remove_identity(&self, identity: IdentityId) -> Result<(), ClientError> {
        self.send_frame(rpc_frame(
            "removeIdentity(IdentityId)",
            vec![Value::from(identity)],
        ))
        .await
    }

    pub async fn update_identity(
        &self,
        identity: IdentityId,
        fields: VariantMap,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "Identity",
            &identity.to_string(),
            "requestUpdate",
            vec![Value::Map(fields)],
        ))
        .await
    }

    pub async fn update_ignore_list(&self, list: &IgnoreList) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "IgnoreListManager",
            "",
            "requestUpdate",
            vec![Value::Map(list.to_wire_map())],
        ))
        .await
    }

    pub async fn update_aliases(&self, aliases: &AliasManager) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "AliasManager",
            "",
            "requestUpdate",
            vec![Value::Map(aliases.to_wire_map())],
        ))
        .await
    }

    pub async fn update_highlight_rules(
        &self,
        manager: &HighlightRuleManager,
    ) -> Result<(), ClientError> {
        self.send_frame(sync_frame(
            "HighlightRuleManager",
            "",
            "requestUpdate",
            vec![Value::Map(manager.to_wire_map())],
        ))
        .await
    }

    /// First-run core configuration (admin user, storage backend, ...).
    pub async fn setup_core(&self, setup_data: VariantMap) -> Result<(), ClientError> {
        self.send_frame(crate::handshake::core_setup_frame(setup_data))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_frame_shape() {
        let frame = sync_frame("BufferSyncer", "", "requestMarkBufferAsRead", vec![
            Value::from(BufferId(7)),
        ]);
        let items = frame.as_list().unwrap();
        assert_eq!(items[0].as_i64(), Some(1));
        assert_eq!(items[1].as_text().unwrap(), "BufferSyncer");
        assert_eq!(items[2].as_text().unwrap(), "");
        assert_eq!(items[3].as_text().unwrap(), "requestMarkBufferAsRead");
        assert_eq!(items[4].as_i64(), Some(7));
    }

    #[test]
    fn rpc_frame_prefixes_signature() {
        let frame = rpc_frame("sendInput(BufferInfo,QString)", Vec::new());
        let items = frame.as_list().unwrap();
        assert_eq!(items[0].as_i64(), Some(2));
        assert_eq!(items[1].as_text().unwrap(), "2sendInput(BufferInfo,QString)");
    }

    #[test]
    fn heartbeat_carries_time_of_day() {
        let frame = heartbeat_frame();
        let items = frame.as_list().unwrap();
        assert_eq!(items[0].as_i64(), Some(5));
        assert!(matches!(items[1], Value::Time(ms) if ms < 24 * 60 * 60 * 1000));
    }
}
