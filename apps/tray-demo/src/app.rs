//! Demo orchestrator: builds the tray, logs its events, runs the loop.

use std::thread;

use ultrasystray::{Backend, TrayEvent, TrayHandle};

use crate::config::DemoConfig;

/// Runs the tray on the current thread until it quits.
pub fn run(config: DemoConfig) -> anyhow::Result<()> {
    let backend = config.backend.unwrap_or_else(Backend::detect);
    let tray_config = config.tray.into_config()?;

    let mut tray = ultrasystray::create_with(backend, tray_config)?;
    tracing::info!(backend = tray.backend(), "tray created");

    let events = tray.subscribe();
    let handle = tray.handle();
    let listener = thread::Builder::new()
        .name("tray-events".into())
        .spawn(move || {
            for event in events {
                if !on_event(&handle, &event) {
                    break;
                }
            }
        })?;

    let result = tray.run();
    drop(tray);

    if listener.join().is_err() {
        tracing::warn!("event listener panicked");
    }
    result?;
    Ok(())
}

/// Reacts to one tray event; `false` once the tray is going away.
fn on_event(handle: &TrayHandle, event: &TrayEvent) -> bool {
    match event {
        TrayEvent::Activated => {
            tracing::info!("icon clicked");
            handle.notify("UltraSystray", "Icon clicked");
        }
        TrayEvent::SecondaryActivated => tracing::info!("icon middle-clicked"),
        TrayEvent::MenuItem { key, checked, .. } => {
            tracing::info!(%key, ?checked, "menu item activated");
            match (key.as_str(), checked) {
                ("open", _) => handle.notify("UltraSystray", "Open selected"),
                ("mute", Some(true)) => handle.set_tooltip("UltraSystray demo (muted)"),
                ("mute", _) => handle.set_tooltip("UltraSystray demo"),
                _ => {}
            }
        }
        TrayEvent::IconRestored => tracing::info!("icon restored after shell restart"),
        TrayEvent::QuitRequested => {
            tracing::info!("quit requested via tray");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use ultrasystray::TrayCommand;

    use super::*;

    fn handle() -> (TrayHandle, mpsc::Receiver<TrayCommand>) {
        TrayHandle::unwoken()
    }

    #[test]
    fn mute_toggles_tooltip() {
        let (handle, commands) = handle();
        let event = TrayEvent::MenuItem {
            index: 1,
            key: "mute".into(),
            checked: Some(true),
        };
        assert!(on_event(&handle, &event));
        assert!(matches!(
            commands.try_recv(),
            Ok(TrayCommand::SetTooltip(t)) if t.contains("muted")
        ));
    }

    #[test]
    fn quit_stops_listener() {
        let (handle, commands) = handle();
        assert!(!on_event(&handle, &TrayEvent::QuitRequested));
        assert!(commands.try_recv().is_err());
    }

    #[test]
    fn stub_backend_reports_unsupported() {
        let config = DemoConfig {
            backend: Some(Backend::Stub),
            ..DemoConfig::default()
        };
        let err = run(config).unwrap_err();
        assert!(err.to_string().contains("stub"));
    }
}
