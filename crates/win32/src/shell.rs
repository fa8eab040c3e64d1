//! The native operations the tray state machine needs.
//!
//! [`crate::NotifyIcon`] is written against this trait; the Win32
//! implementation lives in `native.rs`, and tests drive the same state
//! machine with a recording fake.

use ultrasystray_core::{IconSource, Result};

use crate::menu::MenuEntry;

pub const NIF_MESSAGE: u32 = 0x0000_0001;
pub const NIF_ICON: u32 = 0x0000_0002;
pub const NIF_TIP: u32 = 0x0000_0004;
pub const NIF_INFO: u32 = 0x0000_0010;

/// Opaque native icon handle (`HICON`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconHandle(pub isize);

/// `NIM_ADD` / `NIM_MODIFY` / `NIM_DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOp {
    Add,
    Modify,
    Delete,
}

/// Balloon notification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balloon {
    pub title: String,
    pub message: String,
}

/// Payload of a `Shell_NotifyIconW` call. Only fields named in `flags`
/// are meaningful to the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyData {
    pub flags: u32,
    pub callback_message: u32,
    pub icon: Option<IconHandle>,
    pub tip: Option<String>,
    pub balloon: Option<Balloon>,
}

pub trait Shell {
    /// Adds, modifies or deletes the notification icon.
    fn notify_icon(&mut self, op: NotifyOp, data: &NotifyData) -> Result<()>;

    fn load_icon(&mut self, source: &IconSource) -> Result<IconHandle>;

    fn destroy_icon(&mut self, icon: IconHandle);

    /// Replaces the popup menu, destroying the previous one.
    fn set_menu(&mut self, entries: &[MenuEntry]) -> Result<()>;

    /// Shows the popup menu at the cursor and blocks until it closes.
    /// Returns the chosen command id, 0 when dismissed.
    fn track_menu(&mut self) -> Result<u32>;

    /// Makes the message loop exit after the current message.
    fn post_quit(&mut self);
}
