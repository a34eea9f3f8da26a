//! Progress relay: forwards backend progress lines to the caller.

use msmbench_compute::Progress;
use msmbench_core::OutboundMessage;
use tokio::sync::mpsc;

/// Forwards each backend progress line to the caller as a `log`
/// message, in emission order, without buffering delay.
///
/// Delivery is best-effort: if the outbound side is gone the line is
/// dropped silently. Progress reporting must never abort the job.
pub struct ProgressRelay {
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl ProgressRelay {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { outbound }
    }
}

impl Progress for ProgressRelay {
    fn log(&self, message: &str) {
        // Ignore the SendError — it only means the caller is gone.
        let _ = self.outbound.send(OutboundMessage::Log {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn relays_lines_in_emission_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let relay = ProgressRelay::new(tx);

        relay.log("first");
        relay.log("second");

        assert_matches!(rx.recv().await, Some(OutboundMessage::Log { message }) if message == "first");
        assert_matches!(rx.recv().await, Some(OutboundMessage::Log { message }) if message == "second");
    }

    #[tokio::test]
    async fn closed_channel_is_swallowed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let relay = ProgressRelay::new(tx);

        // Must not panic or error.
        relay.log("nobody listening");
    }
}
