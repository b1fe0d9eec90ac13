//! In-process host channel backed by a tokio mpsc queue.
//!
//! Stands in for the webview message handler in tests and for hosts that
//! drain envelopes from a task.

use crate::ports::outbound::{ChannelError, HostChannel};
use tokio::sync::mpsc;

pub struct MpscChannel {
    tx: mpsc::UnboundedSender<String>,
}

impl MpscChannel {
    /// Create a channel and the receiver the host reads envelopes from.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HostChannel for MpscChannel {
    fn post_message(&self, message: &str) -> Result<(), ChannelError> {
        self.tx
            .send(message.to_string())
            .map_err(|_| ChannelError::Closed)
    }
}
