//! Change notifications for observers.

use crate::{EventRecord, LocalId, Session};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// A state change an observer may want to re-render on.
#[derive(Debug, Clone)]
pub enum Notification {
    /// The session moved to a new state.
    Session(Session),
    /// A signup request was accepted; the user still has to log in.
    SignedUp { email: String },
    /// A record was inserted or changed.
    Event(EventRecord),
    /// A failed record was dismissed and removed.
    EventDismissed(LocalId),
}

/// Broadcast sender shared by the controllers.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish a notification. Having no observers is fine.
    pub(crate) fn emit(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }
}
