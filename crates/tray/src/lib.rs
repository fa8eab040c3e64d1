//! Cross-platform system tray icon.
//!
//! Pick a backend once at startup with [`create`] (or [`create_with`]) and
//! drive the returned [`TrayIcon`] the same way on every platform:
//!
//! ```no_run
//! use ultrasystray::{IconSource, MenuItem, TrayConfig};
//!
//! let config = TrayConfig::new(IconSource::named("mail-unread"))
//!     .with_tooltip("Mail")
//!     .with_menu(vec![
//!         MenuItem::emit("Open", "open"),
//!         MenuItem::separator(),
//!         MenuItem::quit("Quit"),
//!     ]);
//! let mut tray = ultrasystray::create(config)?;
//! let events = tray.subscribe();
//! std::thread::spawn(move || {
//!     for event in events {
//!         println!("{event:?}");
//!     }
//! });
//! tray.run()?;
//! # Ok::<(), ultrasystray::TrayError>(())
//! ```
//!
//! # Platform notes
//! - Windows: Win32 `Shell_NotifyIconW`
//! - Linux: StatusNotifierItem (AppIndicator/Ayatana) by default; GTK
//!   `GtkStatusIcon` with the `gtk` feature
//! - macOS and others: a stub whose `show`/`run` report
//!   [`TrayError::Unsupported`]
//! - `run` must be called on the thread that created the icon

mod backend;
mod factory;
mod stub;

pub use backend::{BACKEND_ENV, Backend};
pub use factory::{create, create_with};
pub use stub::StubTrayIcon;

pub use ultrasystray_core::{
    Activation, Callback, EventSink, IconSource, LifecycleState, MenuAction, MenuActivation,
    MenuItem, MenuItemSettings, MenuVariant, MiddleClick, Result, TrayCommand, TrayConfig,
    TrayError, TrayEvent, TrayHandle, TrayIcon, TraySettings, generate_id, menu,
};
