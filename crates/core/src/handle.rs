//! Control handle for a running tray.
//!
//! The tray loop owns every native object and runs on one thread. Other
//! threads talk to it through [`TrayHandle`], which queues a
//! [`TrayCommand`] and then wakes the loop so it drains the queue on its
//! own thread.

use std::fmt;
use std::sync::{Arc, mpsc};

use crate::config::IconSource;
use crate::menu::MenuItem;

/// Commands sent from the application to the tray loop.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Terminate the loop.
    Quit,
    /// Replace the tooltip/title text.
    SetTooltip(String),
    /// Replace the icon image.
    SetIcon(IconSource),
    /// Replace the menu items.
    SetMenu(Vec<MenuItem>),
    /// Show a balloon notification (where supported).
    Notify { title: String, message: String },
    /// Remove the current balloon notification.
    RemoveNotification,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cloneable, thread-safe handle to a tray loop.
#[derive(Clone)]
pub struct TrayHandle {
    tx: mpsc::Sender<TrayCommand>,
    waker: Waker,
}

impl fmt::Debug for TrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrayHandle").finish_non_exhaustive()
    }
}

impl TrayHandle {
    /// Creates a handle and the receiver the loop drains.
    ///
    /// `waker` is called after every queued command; backends whose loop
    /// blocks on the receiver itself pass a no-op.
    pub fn new<W>(waker: W) -> (Self, mpsc::Receiver<TrayCommand>)
    where
        W: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = Self {
            tx,
            waker: Arc::new(waker),
        };
        (handle, rx)
    }

    /// Creates a handle whose loop blocks on the receiver.
    pub fn unwoken() -> (Self, mpsc::Receiver<TrayCommand>) {
        Self::new(|| {})
    }

    /// Asks the loop to terminate. Observed on its next iteration.
    pub fn quit(&self) {
        self.send(TrayCommand::Quit);
    }

    pub fn set_tooltip(&self, tooltip: impl Into<String>) {
        self.send(TrayCommand::SetTooltip(tooltip.into()));
    }

    pub fn set_icon(&self, icon: IconSource) {
        self.send(TrayCommand::SetIcon(icon));
    }

    pub fn set_menu(&self, items: Vec<MenuItem>) {
        self.send(TrayCommand::SetMenu(items));
    }

    pub fn notify(&self, title: impl Into<String>, message: impl Into<String>) {
        self.send(TrayCommand::Notify {
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn remove_notification(&self) {
        self.send(TrayCommand::RemoveNotification);
    }

    fn send(&self, command: TrayCommand) {
        if self.tx.send(command).is_err() {
            tracing::debug!("tray loop already exited, command dropped");
            return;
        }
        (self.waker)();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn commands_arrive_in_order() {
        let (handle, rx) = TrayHandle::unwoken();

        handle.set_tooltip("Hello");
        handle.notify("Title", "Body");
        handle.quit();

        assert!(matches!(rx.recv().unwrap(), TrayCommand::SetTooltip(t) if t == "Hello"));
        assert!(matches!(
            rx.recv().unwrap(),
            TrayCommand::Notify { title, message } if title == "Title" && message == "Body"
        ));
        assert!(matches!(rx.recv().unwrap(), TrayCommand::Quit));
    }

    #[test]
    fn waker_runs_once_per_command() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (handle, _rx) = TrayHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handle.quit();
        handle.remove_notification();
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closed_loop_skips_waker() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (handle, rx) = TrayHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(rx);

        handle.quit();
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handle_is_usable_from_other_threads() {
        let (handle, rx) = TrayHandle::unwoken();
        let remote = handle.clone();
        std::thread::spawn(move || remote.quit()).join().unwrap();
        assert!(matches!(rx.recv().unwrap(), TrayCommand::Quit));
    }
}
