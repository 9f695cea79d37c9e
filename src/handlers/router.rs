use super::traits::SyncHandler;
use crate::client::Client;
use crate::error::ProtocolError;
use crate::value::{Value, VariantMap};
use std::collections::HashMap;
use std::sync::Arc;

/// Routes sync and init-data frames to the handler registered for their
/// protocol class. Unknown classes are reported back to the caller, never
/// treated as fatal.
pub struct ClassRouter {
    handlers: HashMap<&'static str, Arc<dyn SyncHandler>>,
}

impl ClassRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for its class name.
    ///
    /// # Panics
    /// Panics if a handler is already registered for the same class, to catch
    /// accidental overwrites during initialization.
    pub fn register(&mut self, handler: Arc<dyn SyncHandler>) {
        let class_name = handler.class_name();
        if self.handlers.insert(class_name, handler).is_some() {
            panic!("Handler for class '{class_name}' already registered");
        }
    }

    /// Dispatch a sync call. `Ok(false)` means no handler took the frame
    /// (unknown class or unknown method).
    pub async fn dispatch_sync(
        &self,
        client: &Arc<Client>,
        class_name: &str,
        object_id: &str,
        function: &str,
        args: &[Value],
    ) -> Result<bool, ProtocolError> {
        match self.handlers.get(class_name) {
            Some(handler) => handler.handle_sync(client, object_id, function, args).await,
            None => Ok(false),
        }
    }

    /// Dispatch an init-data snapshot. `Ok(false)` means the class is
    /// unknown.
    pub async fn dispatch_init(
        &self,
        client: &Arc<Client>,
        class_name: &str,
        object_id: &str,
        data: VariantMap,
    ) -> Result<bool, ProtocolError> {
        match self.handlers.get(class_name) {
            Some(handler) => {
                handler.handle_init(client, object_id, data).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for ClassRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct MockHandler {
        class_name: &'static str,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl MockHandler {
        fn new(class_name: &'static str) -> Self {
            Self {
                class_name,
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SyncHandler for MockHandler {
        fn class_name(&self) -> &'static str {
            self.class_name
        }

        async fn handle_sync(
            &self,
            _client: &Arc<Client>,
            _object_id: &str,
            _function: &str,
            _args: &[Value],
        ) -> Result<bool, ProtocolError> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(true)
        }

        async fn handle_init(
            &self,
            _client: &Arc<Client>,
            _object_id: &str,
            _data: VariantMap,
        ) -> Result<(), ProtocolError> {
            Ok(())
        }
    }

    #[test]
    fn registration_is_counted() {
        let mut router = ClassRouter::new();
        router.register(Arc::new(MockHandler::new("Network")));
        router.register(Arc::new(MockHandler::new("BufferSyncer")));
        assert_eq!(router.handler_count(), 2);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut router = ClassRouter::new();
        router.register(Arc::new(MockHandler::new("Network")));
        router.register(Arc::new(MockHandler::new("Network")));
    }
}
