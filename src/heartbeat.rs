use crate::client::Client;
use crate::request::heartbeat_frame;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

impl Client {
    /// Periodic heartbeat, spawned once the session is bootstrapped. Writes
    /// are fire-and-forget and independent of inbound frame processing; the
    /// loop exits on shutdown or once the connection drops.
    pub(crate) async fn heartbeat_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    if !self.is_connected() {
                        debug!(target: "Client/Heartbeat", "Not connected, exiting heartbeat loop");
                        return;
                    }
                    *self.last_heartbeat.lock().await = Some(Instant::now());
                    if let Err(e) = self.send_frame(heartbeat_frame()).await {
                        warn!(target: "Client/Heartbeat", "Heartbeat send failed: {e}");
                    }
                },
                _ = self.shutdown_notifier.notified() => {
                    debug!(target: "Client/Heartbeat", "Shutdown signaled, exiting heartbeat loop");
                    return;
                }
            }
        }
    }

    /// The core echoed one of our heartbeats. Round-trip time is only logged;
    /// per-network latency comes in through the Network sync channel.
    pub(crate) async fn handle_heartbeat_reply(&self) {
        if let Some(sent_at) = self.last_heartbeat.lock().await.take() {
            debug!(
                target: "Client/Heartbeat",
                "Heartbeat round-trip: {} ms", sent_at.elapsed().as_millis()
            );
        }
    }
}
