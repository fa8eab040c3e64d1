//! Routing from the window procedure to the owning icon.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::icon::NotifyIcon;
use crate::message::{Message, MessageIds};
use crate::registry::{Registry, Token};
use crate::shell::Shell;

/// One registered icon plus the messages that arrived while it was busy.
pub struct Slot<S: Shell> {
    icon: RefCell<NotifyIcon<S>>,
    ids: MessageIds,
    deferred: RefCell<VecDeque<(u32, usize, isize)>>,
}

impl<S: Shell> Slot<S> {
    pub fn new(icon: NotifyIcon<S>) -> Self {
        Self {
            ids: icon.ids(),
            icon: RefCell::new(icon),
            deferred: RefCell::new(VecDeque::new()),
        }
    }

    pub fn icon(&self) -> &RefCell<NotifyIcon<S>> {
        &self.icon
    }

    pub fn into_icon(self) -> NotifyIcon<S> {
        self.icon.into_inner()
    }

    /// Queues a message for a busy icon. Stop, shell restart and wake-up
    /// must not be lost; mouse messages during a popup are stale anyway.
    fn defer(&self, msg: u32, wparam: usize, lparam: isize) -> Routed {
        match Message::decode(self.ids, msg, lparam) {
            Message::Stop | Message::TaskbarCreated | Message::Wake => {
                tracing::trace!(msg, "tray icon busy, message deferred");
                self.deferred.borrow_mut().push_back((msg, wparam, lparam));
                Routed::Handled(0)
            }
            Message::Notify(_) | Message::Unhandled(_) => Routed::Default,
        }
    }

    /// Dispatches everything deferred while `icon` was borrowed.
    pub fn replay(&self, icon: &mut NotifyIcon<S>) {
        loop {
            let next = self.deferred.borrow_mut().pop_front();
            let Some((msg, wparam, lparam)) = next else {
                break;
            };
            icon.dispatch(msg, wparam, lparam);
        }
    }
}

/// Registry entry: the loop thread's shared handle to one icon.
pub type Shared<S> = Rc<Slot<S>>;

/// What the window procedure should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Handled(isize),
    /// Call `DefWindowProcW`.
    Default,
}

/// Resolves `token` and dispatches the message to its icon.
///
/// Unknown tokens go to the default window procedure. An icon already busy
/// with an outer message (the popup menu runs a nested modal loop) defers
/// control messages until the outer message returns.
pub fn route<S: Shell>(
    registry: &RefCell<Registry<Shared<S>>>,
    token: Option<Token>,
    msg: u32,
    wparam: usize,
    lparam: isize,
) -> Routed {
    let Some(entry) = token.and_then(|token| registry.borrow().get(token).cloned()) else {
        return Routed::Default;
    };
    let Ok(mut icon) = entry.icon.try_borrow_mut() else {
        return entry.defer(msg, wparam, lparam);
    };
    let result = icon.dispatch(msg, wparam, lparam);
    entry.replay(&mut icon);
    match result {
        Some(result) => Routed::Handled(result),
        None => Routed::Default,
    }
}
