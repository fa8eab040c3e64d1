//! The StatusNotifierItem service, exported through ksni.

use std::path::Path;
use std::sync::mpsc;

use ksni::blocking::{Handle, TrayMethods};
use ksni::menu::{CheckmarkItem, RadioGroup, RadioItem, StandardItem};

use ultrasystray_core::menu::{self, Activation};
use ultrasystray_core::{
    EventSink, LifecycleState, MenuItem, MiddleClick, Result, TrayCommand, TrayConfig, TrayError,
    TrayEvent, TrayHandle, TrayIcon,
};

use crate::plan::{Entry, plan};

/// State exported over D-Bus. ksni owns it on its service thread.
struct Indicator {
    id: String,
    config: TrayConfig,
    events: EventSink,
    handle: TrayHandle,
}

impl Indicator {
    fn new(id: String, mut config: TrayConfig, events: EventSink, handle: TrayHandle) -> Self {
        // Hosts hide an indicator without a menu.
        if config.menu_items.is_empty() {
            config.menu_items = menu::default_menu();
        }
        Self {
            id,
            config,
            events,
            handle,
        }
    }

    fn set_menu(&mut self, items: Vec<MenuItem>) {
        self.config.menu_items = if items.is_empty() {
            menu::default_menu()
        } else {
            items
        };
    }

    fn activate_item(&mut self, index: usize) {
        tracing::debug!(id = %self.id, index, "item-activated");
        match menu::activate(&mut self.config.menu_items, index, &self.events) {
            Ok(Activation::Quit) => self.handle.quit(),
            Ok(Activation::Continue | Activation::Ignored) => {}
            Err(e) => tracing::warn!(error = %e, index, "menu activation failed"),
        }
    }

    fn icon_parts(&self) -> (String, String) {
        let (theme_path, name) = self.config.icon.theme_parts();
        let theme_path = theme_path
            .map(Path::to_string_lossy)
            .unwrap_or_default()
            .into_owned();
        (theme_path, name)
    }

    fn title_text(&self) -> String {
        self.config.tooltip.clone().unwrap_or_default()
    }
}

impl ksni::Tray for Indicator {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn status(&self) -> ksni::Status {
        ksni::Status::Active
    }

    fn title(&self) -> String {
        self.title_text()
    }

    fn icon_name(&self) -> String {
        self.icon_parts().1
    }

    fn icon_theme_path(&self) -> String {
        self.icon_parts().0
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.title_text(),
            ..Default::default()
        }
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        tracing::debug!(id = %self.id, "event: activate");
        self.events.emit(TrayEvent::Activated);
    }

    fn secondary_activate(&mut self, _x: i32, _y: i32) {
        tracing::debug!(id = %self.id, "event: secondary-activate");
        match self.config.middle_click_or(MiddleClick::LastItem) {
            MiddleClick::LastItem => {
                if let Some(index) = menu::middle_click_target(&self.config.menu_items) {
                    self.activate_item(index);
                }
            }
            MiddleClick::Emit => self.events.emit(TrayEvent::SecondaryActivated),
            MiddleClick::Quit => self.handle.quit(),
        }
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        tracing::debug!(id = %self.id, items = self.config.menu_items.len(), "about-to-show");
        plan(&self.config.menu_items)
            .into_iter()
            .map(native_item)
            .collect()
    }
}

fn native_item(entry: Entry) -> ksni::MenuItem<Indicator> {
    match entry {
        Entry::Separator => ksni::MenuItem::Separator,
        Entry::Standard {
            index,
            label,
            enabled,
        } => StandardItem {
            label,
            enabled,
            activate: Box::new(move |this: &mut Indicator| this.activate_item(index)),
            ..Default::default()
        }
        .into(),
        Entry::Check {
            index,
            label,
            checked,
            enabled,
        } => CheckmarkItem {
            label,
            enabled,
            checked,
            activate: Box::new(move |this: &mut Indicator| this.activate_item(index)),
            ..Default::default()
        }
        .into(),
        Entry::RadioGroup { selected, options } => {
            let indices: Vec<usize> = options.iter().map(|option| option.index).collect();
            RadioGroup {
                selected,
                select: Box::new(move |this: &mut Indicator, position| {
                    if let Some(&index) = indices.get(position) {
                        this.activate_item(index);
                    }
                }),
                options: options
                    .into_iter()
                    .map(|option| RadioItem {
                        label: option.label,
                        enabled: option.enabled,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }
            .into()
        }
    }
}

/// Tray icon exported as a StatusNotifierItem with a DBusMenu.
///
/// [`TrayIcon::show`] registers the item and returns; [`TrayIcon::run`]
/// then blocks on the control channel until quit.
pub struct AppIndicatorTrayIcon {
    config: TrayConfig,
    state: LifecycleState,
    events: EventSink,
    handle: TrayHandle,
    commands: mpsc::Receiver<TrayCommand>,
    service: Option<Handle<Indicator>>,
}

impl AppIndicatorTrayIcon {
    pub fn new(config: TrayConfig) -> Self {
        let (handle, commands) = TrayHandle::unwoken();
        Self {
            config,
            state: LifecycleState::NotShown,
            events: EventSink::default(),
            handle,
            commands,
            service: None,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Indicator) + Send + 'static) {
        if let Some(service) = &self.service {
            service.update(f);
        }
    }

    fn apply(&mut self, command: TrayCommand) -> bool {
        tracing::debug!(?command, "tray command");
        match command {
            TrayCommand::Quit => return false,
            TrayCommand::SetTooltip(tooltip) => {
                self.config.tooltip = Some(tooltip.clone());
                self.update(move |indicator| indicator.config.tooltip = Some(tooltip));
            }
            TrayCommand::SetIcon(icon) => {
                self.config.icon = icon.clone();
                self.update(move |indicator| indicator.config.icon = icon);
            }
            TrayCommand::SetMenu(items) => {
                self.config.menu_items = items.clone();
                self.update(move |indicator| indicator.set_menu(items));
            }
            TrayCommand::Notify { title, .. } => {
                tracing::debug!(%title, "notifications are not part of StatusNotifierItem, dropped");
            }
            TrayCommand::RemoveNotification => {}
        }
        true
    }

    fn shutdown(&mut self) {
        let Some(service) = self.service.take() else {
            return;
        };
        // Keep check/radio state toggled from the menu.
        if let Some(items) = service.update(|indicator| indicator.config.menu_items.clone()) {
            self.config.menu_items = items;
        }
        // Returns once the item is gone from the session bus.
        service.shutdown().wait();
        self.state.hide();
        self.events.emit(TrayEvent::QuitRequested);
        tracing::info!("status notifier item stopped");
    }
}

impl TrayIcon for AppIndicatorTrayIcon {
    fn backend(&self) -> &'static str {
        "appindicator"
    }

    fn config(&self) -> &TrayConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut TrayConfig {
        &mut self.config
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn show(&mut self) -> Result<()> {
        self.state.show()?;
        if self.service.is_some() {
            return Ok(());
        }
        let id = self.config.ensure_id().to_string();
        let indicator = Indicator::new(
            id.clone(),
            self.config.clone(),
            self.events.clone(),
            self.handle.clone(),
        );
        let service = indicator
            .spawn()
            .map_err(|e| TrayError::Toolkit(format!("StatusNotifierItem registration: {e}")))?;
        self.service = Some(service);
        tracing::info!(%id, "status notifier item registered");
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.show()?;
        while let Ok(command) = self.commands.recv() {
            if !self.apply(command) {
                break;
            }
        }
        self.shutdown();
        Ok(())
    }

    fn handle(&self) -> TrayHandle {
        self.handle.clone()
    }

    fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent> {
        let rx = self.events.subscribe();
        let events = self.events.clone();
        self.update(move |indicator| indicator.events = events);
        rx
    }

    fn set_tooltip(&mut self, tooltip: &str) -> Result<()> {
        self.apply(TrayCommand::SetTooltip(tooltip.to_string()));
        Ok(())
    }
}

impl Drop for AppIndicatorTrayIcon {
    fn drop(&mut self) {
        if let Some(service) = self.service.take() {
            let _ = service.shutdown();
        }
    }
}
