//! Events flowing from the tray loop to the application.

use std::sync::mpsc;

/// Events emitted by a running tray icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayEvent {
    /// Primary (left) click on the icon.
    Activated,
    /// Middle click on the icon, when the policy is to report it.
    SecondaryActivated,
    /// A menu item with an `Emit` action was activated.
    MenuItem {
        index: usize,
        key: String,
        checked: Option<bool>,
    },
    /// The shell was restarted and the icon was added again.
    IconRestored,
    /// The tray loop is terminating.
    QuitRequested,
}

/// Sending side of the event channel.
///
/// Without a subscriber events are only logged. Cloning shares the
/// underlying channel, so menu closures can hold their own copy.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<TrayEvent>>,
}

impl EventSink {
    /// Creates a sink connected to a fresh channel.
    pub fn channel() -> (Self, mpsc::Receiver<TrayEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Replaces the current subscriber and returns its receiver.
    pub fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent> {
        let (sink, rx) = Self::channel();
        *self = sink;
        rx
    }

    pub fn is_subscribed(&self) -> bool {
        self.tx.is_some()
    }

    pub fn emit(&self, event: TrayEvent) {
        tracing::debug!(?event, "tray event");
        if let Some(tx) = &self.tx
            && tx.send(event).is_err()
        {
            tracing::trace!("tray event dropped, subscriber is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubscribed_sink_drops_events() {
        let sink = EventSink::default();
        assert!(!sink.is_subscribed());
        sink.emit(TrayEvent::Activated);
    }

    #[test]
    fn subscribed_sink_delivers_in_order() {
        let mut sink = EventSink::default();
        let rx = sink.subscribe();

        sink.emit(TrayEvent::Activated);
        sink.emit(TrayEvent::QuitRequested);

        assert_eq!(rx.try_recv().unwrap(), TrayEvent::Activated);
        assert_eq!(rx.try_recv().unwrap(), TrayEvent::QuitRequested);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn resubscribe_replaces_receiver() {
        let mut sink = EventSink::default();
        let old = sink.subscribe();
        let new = sink.subscribe();

        sink.emit(TrayEvent::IconRestored);
        assert!(old.try_recv().is_err());
        assert_eq!(new.try_recv().unwrap(), TrayEvent::IconRestored);
    }

    #[test]
    fn clones_share_channel() {
        let (sink, rx) = EventSink::channel();
        let clone = sink.clone();
        clone.emit(TrayEvent::SecondaryActivated);
        assert_eq!(rx.try_recv().unwrap(), TrayEvent::SecondaryActivated);
    }

    #[test]
    fn emit_after_receiver_dropped_is_harmless() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(TrayEvent::Activated);
    }
}
