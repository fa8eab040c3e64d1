//! Window messages understood by the tray window.
//!
//! The numeric values mirror `winuser.h` so this module (and the state
//! machine built on it) compiles and tests on every host.

/// `WM_USER`: first id available for private messages.
pub const WM_USER: u32 = 0x0400;

/// Private: stop the loop.
pub const WM_STOP: u32 = WM_USER + 10;

/// Private: callback message registered with the shell icon.
pub const WM_NOTIFYICON: u32 = WM_USER + 11;

/// Private: commands are waiting on the control channel.
pub const WM_WAKE: u32 = WM_USER + 12;

pub const WM_NULL: u32 = 0x0000;
pub const WM_CREATE: u32 = 0x0001;
pub const WM_NCCREATE: u32 = 0x0081;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_MBUTTONUP: u32 = 0x0208;

/// Name of the message the shell broadcasts after (re)starting.
pub const TASKBAR_CREATED: &str = "TaskbarCreated";

/// Message ids resolved at runtime.
///
/// `WM_TASKBARCREATED` comes from `RegisterWindowMessageW`, so it is not
/// a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageIds {
    pub taskbar_created: u32,
}

/// Mouse action reported through [`WM_NOTIFYICON`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    LeftUp,
    MiddleUp,
    RightUp,
    Other(u32),
}

impl MouseEvent {
    /// Decodes the `lParam` of a [`WM_NOTIFYICON`] message. Without
    /// `NOTIFYICON_VERSION_4` the mouse message sits in the low word.
    pub fn from_lparam(lparam: isize) -> Self {
        match (lparam as usize & 0xFFFF) as u32 {
            WM_LBUTTONUP => Self::LeftUp,
            WM_MBUTTONUP => Self::MiddleUp,
            WM_RBUTTONUP => Self::RightUp,
            other => Self::Other(other),
        }
    }
}

/// A message after decoding, as the dispatch table sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Stop,
    Notify(MouseEvent),
    TaskbarCreated,
    Wake,
    Unhandled(u32),
}

impl Message {
    pub fn decode(ids: MessageIds, msg: u32, lparam: isize) -> Self {
        match msg {
            WM_STOP => Self::Stop,
            WM_NOTIFYICON => Self::Notify(MouseEvent::from_lparam(lparam)),
            WM_WAKE => Self::Wake,
            m if m == ids.taskbar_created => Self::TaskbarCreated,
            other => Self::Unhandled(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: MessageIds = MessageIds {
        taskbar_created: 0xC123,
    };

    #[test]
    fn decodes_private_messages() {
        assert_eq!(Message::decode(IDS, WM_STOP, 0), Message::Stop);
        assert_eq!(Message::decode(IDS, WM_WAKE, 0), Message::Wake);
        assert_eq!(
            Message::decode(IDS, WM_NOTIFYICON, WM_RBUTTONUP as isize),
            Message::Notify(MouseEvent::RightUp)
        );
    }

    #[test]
    fn decodes_registered_taskbar_message() {
        assert_eq!(Message::decode(IDS, 0xC123, 0), Message::TaskbarCreated);
        assert_eq!(Message::decode(IDS, 0xC124, 0), Message::Unhandled(0xC124));
    }

    #[test]
    fn mouse_event_uses_low_word() {
        let lparam = ((7usize << 16) | WM_LBUTTONUP as usize) as isize;
        assert_eq!(MouseEvent::from_lparam(lparam), MouseEvent::LeftUp);
        assert_eq!(
            MouseEvent::from_lparam(WM_MBUTTONUP as isize),
            MouseEvent::MiddleUp
        );
        assert_eq!(MouseEvent::from_lparam(0x0200), MouseEvent::Other(0x0200));
    }
}
