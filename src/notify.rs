use std::fmt::Debug;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// User-facing toast port. Calls must return immediately; delivery is best effort.
pub trait Notifier: Send + Sync + Debug {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Default notifier for hosts without a UI: notifications become log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        info!(message, "success notification");
    }

    fn notify_error(&self, message: &str) {
        warn!(message, "error notification");
    }
}

/// Hands notifications to a UI event loop through an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, notification: Notification) {
        // a closed receiver means nobody is displaying toasts anymore
        if self.tx.send(notification).is_err() {
            warn!("notification dropped, receiver closed");
        }
    }
}

impl Notifier for ChannelNotifier {
    fn notify_success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify_success("created");
        notifier.notify_error("bad email");
        assert_eq!(rx.recv().await, Some(Notification::Success("created".into())));
        assert_eq!(rx.recv().await, Some(Notification::Error("bad email".into())));
    }

    #[test]
    fn test_channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify_error("nobody listening");
    }
}
