//! Construction of backend instances behind `dyn TrayIcon`.

use ultrasystray_core::{Result, TrayConfig, TrayError, TrayIcon};

use crate::backend::Backend;
use crate::stub::StubTrayIcon;

/// Creates a tray icon with the backend picked by [`Backend::detect`].
pub fn create(config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    create_with(Backend::detect(), config)
}

/// Creates a tray icon with an explicit backend.
///
/// Fails with [`TrayError::Unsupported`] when `backend` is not compiled in
/// for this target.
pub fn create_with(backend: Backend, config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    if !backend.is_available() {
        return Err(TrayError::Unsupported(backend.name()));
    }
    tracing::debug!(%backend, "creating tray icon");
    match backend {
        Backend::Win32 => win32(config),
        Backend::Gtk => gtk(config),
        Backend::AppIndicator => appindicator(config),
        Backend::Stub => Ok(Box::new(StubTrayIcon::new(config))),
    }
}

#[cfg(windows)]
fn win32(config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    Ok(Box::new(ultrasystray_win32::Win32TrayIcon::new(config)))
}

#[cfg(not(windows))]
fn win32(_config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    Err(TrayError::Unsupported(Backend::Win32.name()))
}

#[cfg(target_os = "linux")]
fn appindicator(config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    Ok(Box::new(
        ultrasystray_appindicator::AppIndicatorTrayIcon::new(config),
    ))
}

#[cfg(not(target_os = "linux"))]
fn appindicator(_config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    Err(TrayError::Unsupported(Backend::AppIndicator.name()))
}

#[cfg(all(target_os = "linux", feature = "gtk"))]
fn gtk(config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    Ok(Box::new(ultrasystray_gtk::GtkTrayIcon::new(config)))
}

#[cfg(not(all(target_os = "linux", feature = "gtk")))]
fn gtk(_config: TrayConfig) -> Result<Box<dyn TrayIcon>> {
    Err(TrayError::Unsupported(Backend::Gtk.name()))
}

#[cfg(test)]
mod tests {
    use ultrasystray_core::{IconSource, LifecycleState};

    use super::*;

    fn config() -> TrayConfig {
        TrayConfig::new(IconSource::named("tray")).with_tooltip("Tray")
    }

    #[test]
    fn stub_is_always_available() {
        let tray = create_with(Backend::Stub, config()).unwrap();
        assert_eq!(tray.backend(), "stub");
        assert_eq!(tray.tooltip(), Some("Tray"));
    }

    #[test]
    fn tooltip_round_trips_on_every_available_backend() {
        for backend in [Backend::Win32, Backend::Gtk, Backend::AppIndicator, Backend::Stub] {
            let Ok(mut tray) = create_with(backend, config()) else {
                assert!(!backend.is_available());
                continue;
            };
            tray.set_tooltip("Updated").unwrap();
            assert_eq!(tray.tooltip(), Some("Updated"), "{backend}");
            assert_eq!(tray.state(), LifecycleState::NotShown, "{backend}");
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn win32_is_unsupported_off_windows() {
        assert!(matches!(
            create_with(Backend::Win32, config()),
            Err(TrayError::Unsupported("win32"))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn appindicator_is_created_on_linux() {
        let tray = create_with(Backend::AppIndicator, config()).unwrap();
        assert_eq!(tray.backend(), "appindicator");
    }
}
