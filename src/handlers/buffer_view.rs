use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::BufferView;
use crate::request::init_request_frame;
use crate::types::events::{BufferViewChange, HideMode};
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

/// `BufferViewManager` tracks which view configs exist; each one is then
/// synced as its own `BufferViewConfig` object.
pub struct BufferViewManagerHandler;

#[async_trait]
impl SyncHandler for BufferViewManagerHandler {
    fn class_name(&self) -> &'static str {
        "BufferViewManager"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        match function {
            "addBufferViewConfig" | "newBufferViewConfig" => {
                let mut reader = ArgReader::new(args);
                let view = reader.i64();
                reader.finish()?;
                client
                    .send_frame_logged(init_request_frame("BufferViewConfig", &view.to_string()))
                    .await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// `BufferViewIds` fans out one init request per view.
    async fn handle_init(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        let ids: Vec<i32> = data
            .get("BufferViewIds")
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(|v| v.as_i64().map(|i| i as i32)).collect())
            .unwrap_or_default();
        client.emit_buffer_view(-1, BufferViewChange::Ids(ids.clone()));
        for view in ids {
            client
                .send_frame_logged(init_request_frame("BufferViewConfig", &view.to_string()))
                .await;
        }
        Ok(())
    }
}

pub struct BufferViewConfigHandler;

#[async_trait]
impl SyncHandler for BufferViewConfigHandler {
    fn class_name(&self) -> &'static str {
        "BufferViewConfig"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        let view_id = parse_view_id(object_id)?;
        let mut reader = ArgReader::new(args);
        let mut state = client.state.lock().await;
        let Some(view) = state.buffer_views.get_mut(&view_id) else {
            warn!(target: "Session/BufferView", "Sync for unknown view {view_id}, dropping");
            return Ok(true);
        };

        match function {
            "addBuffer" => {
                let buffer = reader.buffer_id();
                let position = reader.i64();
                reader.finish()?;
                view.add_buffer(buffer, position.max(0) as usize);
                client.emit_buffer_view(view_id, BufferViewChange::BufferUnhide(buffer));
            }
            "moveBuffer" => {
                let buffer = reader.buffer_id();
                let position = reader.i64();
                reader.finish()?;
                if view.move_buffer(buffer, position.max(0) as usize) {
                    client.emit_buffer_view(view_id, BufferViewChange::OrderChanged(buffer));
                }
            }
            "removeBuffer" => {
                let buffer = reader.buffer_id();
                reader.finish()?;
                view.hide_temporarily(buffer);
                client.emit_buffer_view(
                    view_id,
                    BufferViewChange::BufferHidden(buffer, HideMode::Temporary),
                );
            }
            "removeBufferPermanently" => {
                let buffer = reader.buffer_id();
                reader.finish()?;
                view.hide_permanently(buffer);
                client.emit_buffer_view(
                    view_id,
                    BufferViewChange::BufferHidden(buffer, HideMode::Permanent),
                );
            }
            "setBufferViewName" => {
                let name = reader.text();
                reader.finish()?;
                view.buffer_view_name = name.clone();
                client.emit_buffer_view(view_id, BufferViewChange::BufferViewName(name));
            }
            "setNetworkId" => {
                let network = reader.network_id();
                reader.finish()?;
                view.network_id = network;
                client.emit_buffer_view(view_id, BufferViewChange::NetworkId(network));
            }
            "setShowSearch" => {
                let show = reader.bool();
                reader.finish()?;
                view.show_search = show;
                client.emit_buffer_view(view_id, BufferViewChange::Search(show));
            }
            "setHideInactiveBuffers" => {
                let hide = reader.bool();
                reader.finish()?;
                view.hide_inactive_buffers = hide;
                client.emit_buffer_view(view_id, BufferViewChange::HideInactiveBuffers(hide));
            }
            "setHideInactiveNetworks" => {
                let hide = reader.bool();
                reader.finish()?;
                view.hide_inactive_networks = hide;
                client.emit_buffer_view(view_id, BufferViewChange::HideInactiveNetworks(hide));
            }
            "setAllowedBufferTypes" => {
                let types = reader.i64();
                reader.finish()?;
                view.allowed_buffer_types = types as i32;
                client.emit_buffer_view(
                    view_id,
                    BufferViewChange::AllowedBufferTypes(types as i32),
                );
            }
            "setAddNewBuffersAutomatically" => {
                let automatic = reader.bool();
                reader.finish()?;
                view.add_new_buffers_automatically = automatic;
                client.emit_buffer_view(
                    view_id,
                    BufferViewChange::AddNewBuffersAutomatically(automatic),
                );
            }
            "setMinimumActivity" => {
                let activity = reader.i64();
                reader.finish()?;
                view.minimum_activity = activity as i32;
                client.emit_buffer_view(
                    view_id,
                    BufferViewChange::MinimumActivity(activity as i32),
                );
            }
            "setDisableDecoration" => {
                let disable = reader.bool();
                reader.finish()?;
                view.disable_decoration = disable;
                client.emit_buffer_view(view_id, BufferViewChange::DisableDecoration(disable));
            }
            "setSortAlphabetically" => {
                let sort = reader.bool();
                reader.finish()?;
                view.sort_alphabetically = sort;
                client.emit_buffer_view(view_id, BufferViewChange::Update);
            }
            "update" => {
                let fields = reader.map();
                reader.finish()?;
                for (key, value) in &fields {
                    view.apply_field(key, value);
                }
                client.emit_buffer_view(view_id, BufferViewChange::Update);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Construct the view from its snapshot and report the hidden state of
    /// both removal lists.
    async fn handle_init(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        let view_id = parse_view_id(object_id)?;
        let view = BufferView::from_wire_map(view_id, &data);
        for buffer in view.temporarily_removed() {
            client.emit_buffer_view(
                view_id,
                BufferViewChange::BufferHidden(*buffer, HideMode::Temporary),
            );
        }
        for buffer in view.removed() {
            client.emit_buffer_view(
                view_id,
                BufferViewChange::BufferHidden(*buffer, HideMode::Permanent),
            );
        }
        client.state.lock().await.buffer_views.insert(view_id, view);
        client.emit_buffer_view(view_id, BufferViewChange::Init);
        Ok(())
    }
}

fn parse_view_id(object_id: &str) -> Result<i32, ProtocolError> {
    object_id
        .parse::<i32>()
        .map_err(|_| ProtocolError::Malformed(format!("bad buffer view object id '{object_id}'")))
}
