//! Transport abstraction: an already-connected duplex byte stream.
//!
//! The session core never opens sockets itself; a [`TransportFactory`] hands
//! it a connected [`Transport`] plus the receiving end of its event channel.
//! TLS, when negotiated, is an in-place upgrade of the same stream — every
//! frame after the upgrade must travel over the upgraded stream.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    DataReceived(Vec<u8>),
    Disconnected,
    Error(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, data: &[u8]) -> Result<(), anyhow::Error>;

    /// Upgrade the stream to TLS in place. Called exactly once, between the
    /// magic-number acknowledgment and the client-init frame.
    async fn upgrade_tls(&self) -> Result<(), anyhow::Error>;

    async fn disconnect(&self);
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create_transport(
        &self,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error>;
}

pub mod mock {
    //! Recording transport used by the tests.

    use super::*;
    use std::sync::Mutex;

    pub struct MockTransport {
        pub sent: Mutex<Vec<Vec<u8>>>,
        pub tls_upgraded: Mutex<bool>,
        pub disconnected: Mutex<bool>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                tls_upgraded: Mutex::new(false),
                disconnected: Mutex::new(false),
            }
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, data: &[u8]) -> Result<(), anyhow::Error> {
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn upgrade_tls(&self) -> Result<(), anyhow::Error> {
            *self.tls_upgraded.lock().unwrap() = true;
            Ok(())
        }

        async fn disconnect(&self) {
            *self.disconnected.lock().unwrap() = true;
        }
    }

    pub struct MockTransportFactory {
        transport: Arc<MockTransport>,
        events: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
        pub event_tx: mpsc::Sender<TransportEvent>,
    }

    impl MockTransportFactory {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::channel(64);
            Self {
                transport: Arc::new(MockTransport::new()),
                events: Mutex::new(Some(rx)),
                event_tx: tx,
            }
        }

        pub fn transport(&self) -> Arc<MockTransport> {
            self.transport.clone()
        }
    }

    impl Default for MockTransportFactory {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl TransportFactory for MockTransportFactory {
        async fn create_transport(
            &self,
        ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error> {
            let rx = self
                .events
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| anyhow::anyhow!("transport already created"))?;
            Ok((self.transport.clone(), rx))
        }
    }
}
