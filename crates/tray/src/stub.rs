//! Backend for platforms without a native tray implementation.

use std::sync::mpsc;

use ultrasystray_core::{
    EventSink, LifecycleState, Result, TrayConfig, TrayError, TrayEvent, TrayHandle, TrayIcon,
};

/// Keeps the configuration so the rest of the API works, but cannot show
/// anything: [`TrayIcon::show`] and [`TrayIcon::run`] return
/// [`TrayError::Unsupported`].
pub struct StubTrayIcon {
    config: TrayConfig,
    events: EventSink,
    handle: TrayHandle,
}

impl StubTrayIcon {
    pub fn new(config: TrayConfig) -> Self {
        let (handle, _commands) = TrayHandle::unwoken();
        Self {
            config,
            events: EventSink::default(),
            handle,
        }
    }
}

impl TrayIcon for StubTrayIcon {
    fn backend(&self) -> &'static str {
        "stub"
    }

    fn config(&self) -> &TrayConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut TrayConfig {
        &mut self.config
    }

    fn state(&self) -> LifecycleState {
        LifecycleState::NotShown
    }

    fn show(&mut self) -> Result<()> {
        Err(TrayError::Unsupported(self.backend()))
    }

    fn run(&mut self) -> Result<()> {
        Err(TrayError::Unsupported(self.backend()))
    }

    fn handle(&self) -> TrayHandle {
        self.handle.clone()
    }

    fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_and_run_are_unsupported() {
        let mut tray = StubTrayIcon::new(TrayConfig::default());
        assert!(matches!(tray.show(), Err(TrayError::Unsupported("stub"))));
        assert!(matches!(tray.run(), Err(TrayError::Unsupported("stub"))));
        assert_eq!(tray.state(), LifecycleState::NotShown);
    }

    #[test]
    fn configuration_still_works() {
        let mut tray = StubTrayIcon::new(TrayConfig::default());
        tray.set_tooltip("Hello").unwrap();
        assert_eq!(tray.tooltip(), Some("Hello"));
        tray.config_mut().id = Some("ABC".into());
        assert_eq!(tray.config().id.as_deref(), Some("ABC"));
    }

    #[test]
    fn quit_without_loop_is_harmless() {
        let tray = StubTrayIcon::new(TrayConfig::default());
        tray.quit();
    }
}
