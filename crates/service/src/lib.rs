//! Long-running services: the refresh timer that drives the pinned tab and
//! the report handler that turns scan results into notifications.

pub mod refresh;
pub mod report;

pub use refresh::RefreshService;
pub use report::ReportService;

use taskwatch_core::ScanEvent;
use tokio::sync::oneshot;

/// Envelope for scanner-to-store messages. The optional `ack` carries a
/// boolean success flag back to the sender.
pub struct ScanMessage {
    pub event: ScanEvent,
    pub ack: Option<oneshot::Sender<bool>>,
}

impl ScanMessage {
    pub fn new(event: ScanEvent) -> (Self, oneshot::Receiver<bool>) {
        let (ack_tx, ack_rx) = oneshot::channel();
        (
            Self {
                event,
                ack: Some(ack_tx),
            },
            ack_rx,
        )
    }
}
