//! Handlers for the whole-list rule managers (ignore rules, aliases,
//! highlight rules) and the CoreInfo snapshot. All three managers sync the
//! same way: the core pushes a complete struct-of-arrays map that replaces
//! the local rule set.

use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::{AliasManager, HighlightRuleManager, IgnoreList};
use crate::types::events::{RuleEvent, SessionEvent};
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use std::sync::Arc;

fn update_map(args: &[Value]) -> Result<VariantMap, ProtocolError> {
    let mut reader = ArgReader::new(args);
    let map = reader.map();
    reader.finish()?;
    Ok(map)
}

pub struct IgnoreListManagerHandler;

#[async_trait]
impl SyncHandler for IgnoreListManagerHandler {
    fn class_name(&self) -> &'static str {
        "IgnoreListManager"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        if function != "update" {
            return Ok(false);
        }
        let map = update_map(args)?;
        client.state.lock().await.ignore_list = IgnoreList::from_wire_map(&map);
        client.emit_rules(RuleEvent::IgnoreList);
        Ok(true)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        client.state.lock().await.ignore_list = IgnoreList::from_wire_map(&data);
        client.emit_rules(RuleEvent::IgnoreList);
        Ok(())
    }
}

pub struct AliasManagerHandler;

#[async_trait]
impl SyncHandler for AliasManagerHandler {
    fn class_name(&self) -> &'static str {
        "AliasManager"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        if function != "update" {
            return Ok(false);
        }
        let map = update_map(args)?;
        client.state.lock().await.aliases = AliasManager::from_wire_map(&map);
        client.emit_rules(RuleEvent::Aliases);
        Ok(true)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        client.state.lock().await.aliases = AliasManager::from_wire_map(&data);
        client.emit_rules(RuleEvent::Aliases);
        Ok(())
    }
}

pub struct HighlightRuleManagerHandler;

impl HighlightRuleManagerHandler {
    async fn apply(client: &Arc<Client>, map: &VariantMap) {
        let manager = HighlightRuleManager::from_wire_map(map);
        let mut state = client.state.lock().await;
        state.highlight_mode = manager.highlight_nick.as_mode();
        state.highlights = manager;
        drop(state);
        client.emit_rules(RuleEvent::HighlightRules);
    }
}

#[async_trait]
impl SyncHandler for HighlightRuleManagerHandler {
    fn class_name(&self) -> &'static str {
        "HighlightRuleManager"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        if function != "update" {
            return Ok(false);
        }
        let map = update_map(args)?;
        Self::apply(client, &map).await;
        Ok(true)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        Self::apply(client, &data).await;
        Ok(())
    }
}

/// CoreInfo only ever arrives as an init snapshot; it is surfaced verbatim.
pub struct CoreInfoHandler;

#[async_trait]
impl SyncHandler for CoreInfoHandler {
    fn class_name(&self) -> &'static str {
        "CoreInfo"
    }

    async fn handle_sync(
        &self,
        _client: &Arc<Client>,
        _object_id: &str,
        _function: &str,
        _args: &[Value],
    ) -> Result<bool, ProtocolError> {
        Ok(false)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        _object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        client.emit_session(SessionEvent::CoreInfoInit(data));
        Ok(())
    }
}
