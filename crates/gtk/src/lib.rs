//! GTK 3 status icon backend for UltraSystray.
//!
//! The widget layout in [`plan`] is always available. The `GtkStatusIcon`
//! implementation needs the `native` feature, which links the GTK system
//! libraries.

pub mod plan;

#[cfg(all(target_os = "linux", feature = "native"))]
mod status_icon;

#[cfg(all(target_os = "linux", feature = "native"))]
pub use status_icon::GtkTrayIcon;
