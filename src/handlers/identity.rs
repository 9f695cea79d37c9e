use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::model::Identity;
use crate::types::IdentityId;
use crate::types::events::IdentityEvent;
use crate::value::{ArgReader, Value, VariantMap};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub struct IdentityHandler;

/// Explicit method-name → wire-field table for the single-field setters.
fn setter_field(function: &str) -> Option<&'static str> {
    Some(match function {
        "setIdentityName" => "identityName",
        "setRealName" => "realName",
        "setNicks" => "nicks",
        "setIdent" => "ident",
        "setAwayNick" => "awayNick",
        "setAwayNickEnabled" => "awayNickEnabled",
        "setAwayReason" => "awayReason",
        "setAwayReasonEnabled" => "awayReasonEnabled",
        "setAutoAwayEnabled" => "autoAwayEnabled",
        "setAutoAwayTime" => "autoAwayTime",
        "setAutoAwayReason" => "autoAwayReason",
        "setAutoAwayReasonEnabled" => "autoAwayReasonEnabled",
        "setDetachAwayEnabled" => "detachAwayEnabled",
        "setDetachAwayReason" => "detachAwayReason",
        "setDetachAwayReasonEnabled" => "detachAwayReasonEnabled",
        "setKickReason" => "kickReason",
        "setPartReason" => "partReason",
        "setQuitReason" => "quitReason",
        _ => return None,
    })
}

#[async_trait]
impl SyncHandler for IdentityHandler {
    fn class_name(&self) -> &'static str {
        "Identity"
    }

    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        let identity_id = parse_identity_id(object_id)?;
        let mut reader = ArgReader::new(args);
        let mut state = client.state.lock().await;
        let Some(identity) = state.identities.get_mut(&identity_id) else {
            warn!(target: "Session/Identity", "Sync for unknown identity {identity_id}, dropping");
            return Ok(true);
        };

        if function == "update" {
            let fields = reader.map();
            reader.finish()?;
            identity.update(&fields);
            client.emit_identity(IdentityEvent::Updated(identity_id));
            return Ok(true);
        }
        let Some(field) = setter_field(function) else {
            return Ok(false);
        };
        let Some(value) = reader.value().cloned() else {
            return Err(ProtocolError::Malformed(format!(
                "identity setter {function} without argument"
            )));
        };
        identity.apply_field(field, &value);
        client.emit_identity(IdentityEvent::Updated(identity_id));
        Ok(true)
    }

    async fn handle_init(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError> {
        let identity_id = parse_identity_id(object_id)?;
        let mut state = client.state.lock().await;
        match state.identities.get_mut(&identity_id) {
            Some(identity) => {
                identity.update(&data);
                client.emit_identity(IdentityEvent::Updated(identity_id));
            }
            None => {
                let mut identity = Identity::new(identity_id);
                identity.update(&data);
                state.identities.insert(identity_id, identity);
                client.emit_identity(IdentityEvent::New(identity_id));
            }
        }
        Ok(())
    }
}

fn parse_identity_id(object_id: &str) -> Result<IdentityId, ProtocolError> {
    object_id
        .parse::<i32>()
        .map(IdentityId)
        .map_err(|_| ProtocolError::Malformed(format!("bad identity object id '{object_id}'")))
}
