//! `GtkStatusIcon` with a `GtkMenu` popup.

#![allow(deprecated)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc;
use std::time::Duration;

use gtk::prelude::*;

use ultrasystray_core::menu::{self, Activation};
use ultrasystray_core::{
    EventSink, IconSource, LifecycleState, MiddleClick, Result, TrayCommand, TrayConfig,
    TrayError, TrayEvent, TrayHandle, TrayIcon,
};

use crate::plan::{Widget, is_middle_click, plan};

/// How often the GTK loop drains the control channel.
const COMMAND_POLL: Duration = Duration::from_millis(100);

const SIGINT: i32 = 2;

/// Native objects of a shown icon. Lives on the GTK thread.
struct Session {
    config: RefCell<TrayConfig>,
    events: RefCell<EventSink>,
    status_icon: gtk::StatusIcon,
    menu: RefCell<gtk::Menu>,
}

impl Session {
    fn create(config: TrayConfig, events: EventSink) -> Result<Rc<Self>> {
        let session = Rc::new(Self {
            config: RefCell::new(config),
            events: RefCell::new(events),
            status_icon: gtk::StatusIcon::new(),
            menu: RefCell::new(gtk::Menu::new()),
        });
        session.apply_icon()?;
        session.apply_tooltip();
        session.rebuild_menu();
        session.connect_signals();
        session.status_icon.set_visible(true);
        Ok(session)
    }

    fn connect_signals(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.status_icon.connect_activate(move |_| {
            if let Some(session) = weak.upgrade() {
                session.emit(TrayEvent::Activated);
            }
        });

        let weak = Rc::downgrade(self);
        self.status_icon
            .connect_popup_menu(move |_, button, activate_time| {
                if let Some(session) = weak.upgrade() {
                    session.menu.borrow().popup_easy(button, activate_time);
                }
            });

        let weak = Rc::downgrade(self);
        self.status_icon
            .connect_button_release_event(move |_, event| {
                if is_middle_click(event.button())
                    && let Some(session) = weak.upgrade()
                {
                    session.on_middle_click();
                }
                glib::Propagation::Proceed
            });
    }

    fn emit(&self, event: TrayEvent) {
        self.events.borrow().emit(event);
    }

    fn apply_icon(&self) -> Result<()> {
        match &self.config.borrow().icon {
            IconSource::File(path) => {
                if !path.is_file() {
                    return Err(TrayError::Icon(path.display().to_string()));
                }
                self.status_icon.set_from_file(path);
            }
            IconSource::Named(name) => self.status_icon.set_from_icon_name(name),
        }
        Ok(())
    }

    /// The tooltip doubles as the icon title.
    fn apply_tooltip(&self) {
        let config = self.config.borrow();
        let Some(tooltip) = config.tooltip.as_deref() else {
            return;
        };
        self.status_icon.set_tooltip_text(Some(tooltip));
        self.status_icon.set_title(tooltip);
    }

    fn rebuild_menu(self: &Rc<Self>) {
        let items = {
            let mut config = self.config.borrow_mut();
            if config.menu_items.is_empty() {
                config.menu_items = menu::default_menu();
            }
            plan(&config.menu_items)
        };

        let popup = gtk::Menu::new();
        for widget in items {
            let item: gtk::MenuItem = match widget {
                Widget::Separator => {
                    popup.append(&gtk::SeparatorMenuItem::new());
                    continue;
                }
                Widget::Check {
                    index,
                    label,
                    active,
                    sensitive,
                } => {
                    let check = gtk::CheckMenuItem::with_label(&label);
                    check.set_active(active);
                    check.set_sensitive(sensitive);
                    self.connect_item(check.upcast_ref(), index);
                    check.upcast()
                }
                Widget::Item {
                    index,
                    label,
                    sensitive,
                } => {
                    let item = gtk::MenuItem::with_label(&label);
                    item.set_sensitive(sensitive);
                    self.connect_item(&item, index);
                    item
                }
            };
            popup.append(&item);
        }
        popup.show_all();
        self.menu.replace(popup);
    }

    fn connect_item(self: &Rc<Self>, item: &gtk::MenuItem, index: usize) {
        let weak: Weak<Self> = Rc::downgrade(self);
        item.connect_activate(move |_| {
            if let Some(session) = weak.upgrade() {
                session.activate(index);
            }
        });
    }

    fn activate(&self, index: usize) {
        let activation = {
            let mut config = self.config.borrow_mut();
            menu::activate(&mut config.menu_items, index, &self.events.borrow())
        };
        match activation {
            Ok(Activation::Quit) => gtk::main_quit(),
            Ok(Activation::Continue | Activation::Ignored) => {}
            Err(e) => tracing::warn!(error = %e, index, "menu activation failed"),
        }
    }

    fn on_middle_click(&self) {
        let policy = self.config.borrow().middle_click_or(MiddleClick::Emit);
        match policy {
            MiddleClick::Emit => self.emit(TrayEvent::SecondaryActivated),
            MiddleClick::Quit => gtk::main_quit(),
            MiddleClick::LastItem => {
                let last = menu::middle_click_target(&self.config.borrow().menu_items);
                if let Some(index) = last {
                    self.activate(index);
                }
            }
        }
    }

    /// Applies one control command; `false` means quit.
    fn apply(self: &Rc<Self>, command: TrayCommand) -> Result<bool> {
        tracing::debug!(?command, "tray command");
        match command {
            TrayCommand::Quit => return Ok(false),
            TrayCommand::SetTooltip(tooltip) => {
                self.config.borrow_mut().tooltip = Some(tooltip);
                self.apply_tooltip();
            }
            TrayCommand::SetIcon(icon) => {
                self.config.borrow_mut().icon = icon;
                self.apply_icon()?;
            }
            TrayCommand::SetMenu(items) => {
                self.config.borrow_mut().menu_items = items;
                self.rebuild_menu();
            }
            TrayCommand::Notify { title, .. } => {
                tracing::debug!(%title, "GtkStatusIcon has no notifications, dropped");
            }
            TrayCommand::RemoveNotification => {}
        }
        Ok(true)
    }
}

/// Tray icon backed by `GtkStatusIcon`.
pub struct GtkTrayIcon {
    config: TrayConfig,
    state: LifecycleState,
    events: EventSink,
    handle: TrayHandle,
    commands: Rc<mpsc::Receiver<TrayCommand>>,
    session: Option<Rc<Session>>,
}

impl GtkTrayIcon {
    pub fn new(config: TrayConfig) -> Self {
        let (handle, commands) = TrayHandle::unwoken();
        Self {
            config,
            state: LifecycleState::NotShown,
            events: EventSink::default(),
            handle,
            commands: Rc::new(commands),
            session: None,
        }
    }

    fn drain(session: &Rc<Session>, commands: &mpsc::Receiver<TrayCommand>) -> glib::ControlFlow {
        while let Ok(command) = commands.try_recv() {
            match session.apply(command) {
                Ok(true) => {}
                Ok(false) => {
                    gtk::main_quit();
                    break;
                }
                Err(e) => tracing::warn!(error = %e, "tray command failed"),
            }
        }
        glib::ControlFlow::Continue
    }
}

impl TrayIcon for GtkTrayIcon {
    fn backend(&self) -> &'static str {
        "gtk"
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
        if self.session.is_some() {
            return Ok(());
        }
        if !gtk::is_initialized() {
            gtk::init().map_err(|e| TrayError::Toolkit(format!("gtk::init: {e}")))?;
        }
        self.session = Some(Session::create(self.config.clone(), self.events.clone())?);
        tracing::info!("gtk status icon shown");
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.show()?;
        let Some(session) = self.session.clone() else {
            return Err(TrayError::InvalidState("gtk session missing".into()));
        };

        let sigint = glib::unix_signal_add_local(SIGINT, || {
            tracing::info!("interrupted, leaving gtk main loop");
            gtk::main_quit();
            glib::ControlFlow::Continue
        });

        let commands = Rc::clone(&self.commands);
        let poll_session = Rc::clone(&session);
        let poll = glib::timeout_add_local(COMMAND_POLL, move || {
            GtkTrayIcon::drain(&poll_session, &commands)
        });

        gtk::main();

        poll.remove();
        sigint.remove();

        session.status_icon.set_visible(false);
        self.config = session.config.borrow().clone();
        self.session = None;
        self.state.hide();
        self.events.emit(TrayEvent::QuitRequested);
        tracing::info!("gtk status icon stopped");
        Ok(())
    }

    fn handle(&self) -> TrayHandle {
        self.handle.clone()
    }

    fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent> {
        let rx = self.events.subscribe();
        if let Some(session) = &self.session {
            session.events.replace(self.events.clone());
        }
        rx
    }

    fn set_tooltip(&mut self, tooltip: &str) -> Result<()> {
        self.config.tooltip = Some(tooltip.to_string());
        if let Some(session) = &self.session {
            session.apply(TrayCommand::SetTooltip(tooltip.to_string()))?;
        }
        Ok(())
    }
}
