use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::types::events::BufferChange;
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub struct BufferSyncerHandler;

#[async_trait]
impl SyncHandler for BufferSyncerHandler {
    fn class_name(&self) -> &'static str {
        "BufferSyncer"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        let mut reader = ArgReader::new(args);
        match function {
            "markBufferAsRead" => {
                let buffer = reader.buffer_id();
                reader.finish()?;
                client.emit_buffer(buffer, BufferChange::Read);
            }
            "setLastSeenMsg" => {
                let buffer = reader.buffer_id();
                let msg = reader.msg_id();
                reader.finish()?;
                client.emit_buffer(buffer, BufferChange::LastSeen(msg));
            }
            "setMarkerLine" => {
                let buffer = reader.buffer_id();
                let msg = reader.msg_id();
                reader.finish()?;
                client.emit_buffer(buffer, BufferChange::MarkerLine(msg));
            }
            "setBufferActivity" => {
                let buffer = reader.buffer_id();
                let activity = reader.i64();
                reader.finish()?;
                client.emit_buffer(buffer, BufferChange::Activity(activity));
            }
            "removeBuffer" => {
                let buffer = reader.buffer_id();
                reader.finish()?;
                let mut state = client.state.lock().await;
                let Some(network_id) = state.networks.network_of_buffer(buffer) else {
                    warn!(target: "Session/BufferSyncer", "Remove for unknown buffer {buffer}, dropping");
                    return Ok(true);
                };
                let Some(network) = state.networks.get_mut(network_id) else {
                    return Ok(true);
                };
                network.buffers.remove_by_id(buffer);
                client.emit_buffer(buffer, BufferChange::Remove);
            }
            "renameBuffer" => {
                let buffer = reader.buffer_id();
                let new_name = reader.text();
                reader.finish()?;
                let mut state = client.state.lock().await;
                let Some(network_id) = state.networks.network_of_buffer(buffer) else {
                    warn!(target: "Session/BufferSyncer", "Rename for unknown buffer {buffer}, dropping");
                    return Ok(true);
                };
                let Some(network) = state.networks.get_mut(network_id) else {
                    return Ok(true);
                };
                if network.buffers.rename(buffer, &new_name) {
                    client.emit_buffer(buffer, BufferChange::Rename(new_name));
                }
            }
            "mergeBuffersPermanently" => {
                let target = reader.buffer_id();
                let source = reader.buffer_id();
                reader.finish()?;
                let mut state = client.state.lock().await;
                let Some(network_id) = state.networks.network_of_buffer(target) else {
                    warn!(target: "Session/BufferSyncer", "Merge into unknown buffer {target}, dropping");
                    return Ok(true);
                };
                let Some(network) = state.networks.get_mut(network_id) else {
                    return Ok(true);
                };
                if network.merge_buffers_permanently(target, source) {
                    client.emit_buffer(target, BufferChange::Merge { source });
                } else {
                    warn!(
                        target: "Session/BufferSyncer",
                        "Merge {source} into {target} failed (source missing), dropping"
                    );
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// The init snapshot carries three flat `[bufferId, value, ...]` arrays.
    async fn handle_init(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        for (buffer, msg) in id_value_pairs(&data, "LastSeenMsg") {
            client.emit_buffer(
                crate::types::BufferId(buffer as i32),
                BufferChange::LastSeen(crate::types::MsgId(msg as i32)),
            );
        }
        for (buffer, msg) in id_value_pairs(&data, "MarkerLines") {
            client.emit_buffer(
                crate::types::BufferId(buffer as i32),
                BufferChange::MarkerLine(crate::types::MsgId(msg as i32)),
            );
        }
        for (buffer, activity) in id_value_pairs(&data, "Activities") {
            client.emit_buffer(
                crate::types::BufferId(buffer as i32),
                BufferChange::Activity(activity),
            );
        }
        Ok(())
    }
}

fn id_value_pairs(data: &VariantMap, key: &str) -> Vec<(i64, i64)> {
    let Some(items) = data.get(key).and_then(Value::as_list) else {
        return Vec::new();
    };
    items
        .chunks_exact(2)
        .filter_map(|pair| Some((pair[0].as_i64()?, pair[1].as_i64()?)))
        .collect()
}
