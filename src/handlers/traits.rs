use crate::client::Client;
use crate::error::ProtocolError;
use crate::value::{Value, VariantMap};
use async_trait::async_trait;
use std::sync::Arc;

/// Handles sync and init-data frames for one protocol class.
///
/// One implementation per synced class (`Network`, `BufferSyncer`, ...).
/// Handlers parse the frame's arguments, mutate the entity model and emit
/// events; they never answer frames except by issuing follow-up requests.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// The protocol class name this handler is registered under.
    fn class_name(&self) -> &'static str;

    /// Apply one incremental sync call.
    ///
    /// Returns `Ok(false)` for an unknown method name — the router logs it
    /// and reports the frame as unhandled, never fatal. A referential miss
    /// (the object id no longer exists locally) is logged inside the handler
    /// and counts as handled.
    async fn handle_sync(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError>;

    /// Apply a full-state init snapshot for one object of this class.
    async fn handle_init(
        &self,
        client: &Arc<Client>,
        object_id: &str,
        data: VariantMap,
    ) -> Result<(), ProtocolError>;
}
