//! Win32 shell notification icon backend for UltraSystray.
//!
//! A pair of hidden popup windows receives the icon's callback messages.
//! Their window procedure resolves the owning icon through a token stored
//! in `GWLP_USERDATA` and a loop-thread-local [`registry::Registry`], then
//! hands the message to [`NotifyIcon`], which holds all dispatch logic.
//!
//! Everything except `native` is platform independent, so the dispatch
//! table is tested on every host against a fake [`Shell`].

mod icon;
pub mod menu;
pub mod message;
pub mod registry;
mod shell;
#[cfg(any(windows, test))]
mod wide;
mod window;

#[cfg(windows)]
mod native;

pub use icon::NotifyIcon;
pub use shell::{Balloon, IconHandle, NotifyData, NotifyOp, Shell};
pub use window::{Routed, Shared, Slot, route};

#[cfg(windows)]
pub use native::{NativeShell, Win32TrayIcon};
