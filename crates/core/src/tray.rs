//! The uniform surface every backend implements.

use std::fmt;
use std::sync::mpsc;

use crate::config::TrayConfig;
use crate::error::{Result, TrayError};
use crate::event::TrayEvent;
use crate::handle::TrayHandle;

/// Lifecycle of a tray icon. `Hidden` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    NotShown,
    Shown,
    Hidden,
}

impl LifecycleState {
    /// Moves to `Shown`. Showing twice is allowed; showing after the icon
    /// was hidden is not.
    pub fn show(&mut self) -> Result<()> {
        match self {
            Self::Hidden => Err(TrayError::InvalidState(
                "tray icon was already hidden".into(),
            )),
            _ => {
                *self = Self::Shown;
                Ok(())
            }
        }
    }

    pub fn hide(&mut self) {
        *self = Self::Hidden;
    }

    pub fn is_shown(&self) -> bool {
        *self == Self::Shown
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotShown => "not-shown",
            Self::Shown => "shown",
            Self::Hidden => "hidden",
        })
    }
}

/// A tray icon backed by one native toolkit.
///
/// Configuration is mutated through [`TrayIcon::config_mut`] before
/// [`TrayIcon::show`]/[`TrayIcon::run`]; once running, use the
/// [`TrayHandle`] from [`TrayIcon::handle`].
pub trait TrayIcon {
    /// Short backend name, used in logs.
    fn backend(&self) -> &'static str;

    fn config(&self) -> &TrayConfig;

    fn config_mut(&mut self) -> &mut TrayConfig;

    fn state(&self) -> LifecycleState;

    /// Materializes the native icon and menu without blocking.
    fn show(&mut self) -> Result<()>;

    /// Shows the icon and blocks in the native event loop until quit.
    fn run(&mut self) -> Result<()>;

    /// Thread-safe control handle for the running loop.
    fn handle(&self) -> TrayHandle;

    /// Routes tray events to a new receiver, replacing any previous one.
    fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent>;

    /// Asks the loop to terminate.
    fn quit(&self) {
        self.handle().quit();
    }

    fn tooltip(&self) -> Option<&str> {
        self.config().tooltip.as_deref()
    }

    /// Replaces the tooltip; a shown icon is updated in place.
    fn set_tooltip(&mut self, tooltip: &str) -> Result<()> {
        self.config_mut().tooltip = Some(tooltip.to_string());
        Ok(())
    }
}
