//! Shared model for UltraSystray tray icons.
//!
//! Every backend (Win32, GTK, AppIndicator) consumes the same pieces:
//! - [`TrayConfig`] — icon, tooltip, identifier and menu items
//! - [`MenuItem`] — tagged menu entries, activated through [`menu::activate`]
//! - [`TrayEvent`] — events from the tray loop to the application
//! - [`TrayHandle`] — commands from the application to the tray loop
//! - [`TrayIcon`] — the uniform lifecycle surface (`show`, `run`, `quit`)
//!
//! # Threading
//! A backend is created and run on one thread. Only [`TrayHandle`] and the
//! receiver returned by [`TrayIcon::subscribe`] cross thread boundaries.

pub mod config;
pub mod error;
pub mod event;
pub mod handle;
pub mod id;
pub mod menu;
pub mod tray;

pub use config::{IconSource, MenuItemSettings, MiddleClick, TrayConfig, TraySettings};
pub use error::{Result, TrayError};
pub use event::{EventSink, TrayEvent};
pub use handle::{TrayCommand, TrayHandle};
pub use id::generate_id;
pub use menu::{Activation, Callback, MenuAction, MenuActivation, MenuItem, MenuVariant};
pub use tray::{LifecycleState, TrayIcon};
