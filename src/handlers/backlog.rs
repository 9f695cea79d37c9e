use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::IrcMessage;
use crate::types::events::BufferChange;
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub struct BacklogManagerHandler;

#[async_trait]
impl SyncHandler for BacklogManagerHandler {
    fn class_name(&self) -> &'static str {
        "BacklogManager"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        if function != "receiveBacklog" {
            return Ok(false);
        }
        let mut reader = ArgReader::new(args);
        let buffer = reader.buffer_id();
        let _first = reader.msg_id();
        let _last = reader.msg_id();
        let _limit = reader.i64();
        let _additional = reader.i64();
        let messages = reader.list();
        reader.finish()?;

        let mut count = 0usize;
        {
            let mut state = client.state.lock().await;
            for wire in messages.iter().filter_map(Value::as_message) {
                let network_id = wire.buffer.network;
                let mut message = IrcMessage::from_wire(wire.clone());
                state.update_message_flags(&mut message, network_id);
                let Some(target) = state.networks.buffer_mut(message.buffer) else {
                    warn!(
                        target: "Session/Backlog",
                        "Backlog message {} for unknown buffer {}, dropping", message.id, message.buffer
                    );
                    continue;
                };
                target.add_message(message);
                count += 1;
            }
        }
        client.emit_buffer(buffer, BufferChange::Backlog { count });
        Ok(true)
    }

    async fn handle_init(
        &self,
        _client: &Arc<Client>,
        _object_id: &str,
        _data: VariantMap,
    ) -> Result<(), ProtocolError> {
        // The backlog manager has no init snapshot; backlog always arrives
        // through receiveBacklog.
        Ok(())
    }
}
