//! StatusNotifierItem backend for UltraSystray.
//!
//! Exports the icon and its menu over D-Bus (the protocol behind
//! KDE/Ayatana AppIndicators) using `ksni`. Desktop hosts that speak the
//! protocol render the icon; the DBusMenu layout is derived from the
//! shared menu model by [`plan`].

pub mod plan;

#[cfg(target_os = "linux")]
mod indicator;

#[cfg(target_os = "linux")]
pub use indicator::AppIndicatorTrayIcon;
