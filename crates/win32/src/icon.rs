//! Per-icon state and the message dispatch table.
//!
//! [`NotifyIcon`] owns everything one tray icon needs on the loop thread:
//! its configuration, lifecycle state, cached native icon, event sink and
//! the receiving end of its control channel. All native calls go through
//! a [`Shell`], so the dispatch logic is identical with the real Win32
//! layer and with the test fake.

use std::sync::mpsc;

use ultrasystray_core::menu::{self, Activation};
use ultrasystray_core::{
    EventSink, IconSource, LifecycleState, MenuItem, MiddleClick, Result, TrayCommand,
    TrayConfig, TrayError, TrayEvent, TrayHandle,
};

use crate::menu::{index_for_command, plan};
use crate::message::{Message, MessageIds, MouseEvent, WM_NOTIFYICON};
use crate::shell::{
    Balloon, IconHandle, NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NotifyData, NotifyOp, Shell,
};

pub struct NotifyIcon<S: Shell> {
    shell: S,
    config: TrayConfig,
    state: LifecycleState,
    /// Whether the icon should be in the notification area. Survives
    /// shell restarts so `TaskbarCreated` knows to add it back.
    visible: bool,
    icon: Option<IconHandle>,
    events: EventSink,
    commands: mpsc::Receiver<TrayCommand>,
    handle: TrayHandle,
    ids: MessageIds,
    failure: Option<TrayError>,
}

impl<S: Shell> NotifyIcon<S> {
    pub fn new(
        shell: S,
        config: TrayConfig,
        handle: TrayHandle,
        commands: mpsc::Receiver<TrayCommand>,
        ids: MessageIds,
    ) -> Self {
        Self {
            shell,
            config,
            state: LifecycleState::NotShown,
            visible: false,
            icon: None,
            events: EventSink::default(),
            commands,
            handle,
            ids,
            failure: None,
        }
    }

    /// Routes events to an existing sink instead of an unsubscribed one.
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn into_config(self) -> TrayConfig {
        self.config
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TrayConfig {
        &mut self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn handle(&self) -> TrayHandle {
        self.handle.clone()
    }

    pub fn ids(&self) -> MessageIds {
        self.ids
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<TrayEvent> {
        self.events.subscribe()
    }

    /// Builds the popup menu and adds the icon to the notification area.
    pub fn start(&mut self) -> Result<()> {
        self.rebuild_menu()?;
        self.show()
    }

    pub fn show(&mut self) -> Result<()> {
        self.state.show()?;
        self.visible = true;
        self.add()
    }

    /// Removes the icon from the notification area. Terminal.
    pub fn hide(&mut self) -> Result<()> {
        let was_shown = self.state.is_shown();
        self.visible = false;
        self.state.hide();
        if was_shown {
            self.shell.notify_icon(NotifyOp::Delete, &NotifyData::default())?;
        }
        Ok(())
    }

    fn add(&mut self) -> Result<()> {
        let icon = self.icon_handle()?;
        let data = NotifyData {
            flags: NIF_MESSAGE | NIF_ICON | NIF_TIP,
            callback_message: WM_NOTIFYICON,
            icon: Some(icon),
            tip: self.config.tooltip.clone(),
            balloon: None,
        };
        self.shell.notify_icon(NotifyOp::Add, &data)
    }

    fn icon_handle(&mut self) -> Result<IconHandle> {
        if let Some(icon) = self.icon {
            return Ok(icon);
        }
        let icon = self.shell.load_icon(&self.config.icon)?;
        self.icon = Some(icon);
        Ok(icon)
    }

    fn release_icon(&mut self) {
        if let Some(icon) = self.icon.take() {
            self.shell.destroy_icon(icon);
        }
    }

    pub fn set_icon(&mut self, icon: IconSource) -> Result<()> {
        self.config.icon = icon;
        self.release_icon();
        if !self.state.is_shown() {
            return Ok(());
        }
        let icon = self.icon_handle()?;
        self.modify(NotifyData {
            flags: NIF_ICON,
            icon: Some(icon),
            ..NotifyData::default()
        })
    }

    pub fn set_tooltip(&mut self, tooltip: &str) -> Result<()> {
        self.config.tooltip = Some(tooltip.to_string());
        if !self.state.is_shown() {
            return Ok(());
        }
        self.modify(NotifyData {
            flags: NIF_TIP,
            tip: self.config.tooltip.clone(),
            ..NotifyData::default()
        })
    }

    pub fn set_menu(&mut self, items: Vec<MenuItem>) -> Result<()> {
        self.config.menu_items = items;
        self.rebuild_menu()
    }

    pub fn rebuild_menu(&mut self) -> Result<()> {
        self.shell.set_menu(&plan(&self.config.menu_items))
    }

    /// Shows a balloon notification over the icon. An empty title falls
    /// back to the tooltip.
    pub fn notify(&mut self, title: &str, message: &str) -> Result<()> {
        let title = match (title, &self.config.tooltip) {
            ("", Some(tooltip)) => tooltip.clone(),
            _ => title.to_string(),
        };
        self.balloon(&title, message)
    }

    pub fn remove_notification(&mut self) -> Result<()> {
        self.balloon("", "")
    }

    fn balloon(&mut self, title: &str, message: &str) -> Result<()> {
        if !self.state.is_shown() {
            tracing::debug!("notification skipped, icon not shown");
            return Ok(());
        }
        self.modify(NotifyData {
            flags: NIF_INFO,
            balloon: Some(Balloon {
                title: title.to_string(),
                message: message.to_string(),
            }),
            ..NotifyData::default()
        })
    }

    fn modify(&mut self, data: NotifyData) -> Result<()> {
        self.shell.notify_icon(NotifyOp::Modify, &data)
    }

    pub fn quit(&mut self) {
        tracing::debug!("tray quit requested");
        self.shell.post_quit();
    }

    /// Handles one window message. `None` means the message is not ours
    /// and belongs to the default window procedure.
    pub fn handle_message(
        &mut self,
        msg: u32,
        _wparam: usize,
        lparam: isize,
    ) -> Result<Option<isize>> {
        match Message::decode(self.ids, msg, lparam) {
            Message::Stop => self.quit(),
            Message::Notify(mouse) => self.on_mouse(mouse)?,
            Message::TaskbarCreated => self.on_taskbar_created()?,
            Message::Wake => self.drain_commands()?,
            Message::Unhandled(_) => return Ok(None),
        }
        Ok(Some(0))
    }

    /// [`Self::handle_message`] for use inside the window procedure: a
    /// failing handler is logged, remembered for [`Self::take_failure`],
    /// and stops the loop.
    pub fn dispatch(&mut self, msg: u32, wparam: usize, lparam: isize) -> Option<isize> {
        match self.handle_message(msg, wparam, lparam) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, msg, "tray message handler failed");
                self.failure.get_or_insert(e);
                self.shell.post_quit();
                Some(0)
            }
        }
    }

    pub fn take_failure(&mut self) -> Option<TrayError> {
        self.failure.take()
    }

    fn on_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        match mouse {
            MouseEvent::LeftUp => self.events.emit(TrayEvent::Activated),
            MouseEvent::MiddleUp => self.on_middle_click()?,
            MouseEvent::RightUp => self.on_right_click()?,
            MouseEvent::Other(_) => {}
        }
        Ok(())
    }

    fn on_middle_click(&mut self) -> Result<()> {
        match self.config.middle_click_or(MiddleClick::Quit) {
            MiddleClick::Quit => self.quit(),
            MiddleClick::Emit => self.events.emit(TrayEvent::SecondaryActivated),
            MiddleClick::LastItem => {
                if let Some(index) = menu::middle_click_target(&self.config.menu_items) {
                    self.activate_item(index)?;
                }
            }
        }
        Ok(())
    }

    fn on_right_click(&mut self) -> Result<()> {
        if self.config.menu_items.is_empty() {
            return Ok(());
        }
        let command = self.shell.track_menu()?;
        match index_for_command(command) {
            Some(index) => self.activate_item(index),
            None => {
                tracing::trace!("popup menu dismissed");
                Ok(())
            }
        }
    }

    fn activate_item(&mut self, index: usize) -> Result<()> {
        match menu::activate(&mut self.config.menu_items, index, &self.events)? {
            Activation::Quit => self.quit(),
            Activation::Continue if self.config.menu_items[index].is_active().is_some() => {
                self.rebuild_menu()?;
            }
            Activation::Continue | Activation::Ignored => {}
        }
        Ok(())
    }

    fn on_taskbar_created(&mut self) -> Result<()> {
        if !(self.visible && self.state.is_shown()) {
            return Ok(());
        }
        tracing::info!("taskbar recreated, restoring tray icon");
        self.add()?;
        self.events.emit(TrayEvent::IconRestored);
        Ok(())
    }

    /// Applies every queued control command.
    pub fn drain_commands(&mut self) -> Result<()> {
        while let Ok(command) = self.commands.try_recv() {
            tracing::debug!(?command, "tray command");
            match command {
                TrayCommand::Quit => self.quit(),
                TrayCommand::SetTooltip(tooltip) => self.set_tooltip(&tooltip)?,
                TrayCommand::SetIcon(icon) => self.set_icon(icon)?,
                TrayCommand::SetMenu(items) => self.set_menu(items)?,
                TrayCommand::Notify { title, message } => self.notify(&title, &message)?,
                TrayCommand::RemoveNotification => self.remove_notification()?,
            }
        }
        Ok(())
    }

    /// Tears the icon down after the loop exits.
    pub fn finish(&mut self) -> Result<()> {
        let hidden = self.hide();
        self.release_icon();
        self.events.emit(TrayEvent::QuitRequested);
        hidden
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ultrasystray_core::MenuAction;

    use super::*;
    use crate::menu::{MenuEntry, command_id};
    use crate::message::{WM_LBUTTONUP, WM_MBUTTONUP, WM_RBUTTONUP, WM_STOP, WM_WAKE};

    pub(crate) const IDS: MessageIds = MessageIds {
        taskbar_created: 0xC0DE,
    };

    /// Records every native call; `track_menu` returns `selection`.
    #[derive(Debug, Default)]
    pub(crate) struct FakeShell {
        pub calls: Vec<(NotifyOp, NotifyData)>,
        pub menus: Vec<Vec<MenuEntry>>,
        pub loaded: usize,
        pub destroyed: Vec<IconHandle>,
        pub selection: u32,
        pub quit_posted: usize,
        pub fail_icon: bool,
    }

    impl FakeShell {
        pub fn ops(&self) -> Vec<NotifyOp> {
            self.calls.iter().map(|(op, _)| *op).collect()
        }
    }

    impl Shell for FakeShell {
        fn notify_icon(&mut self, op: NotifyOp, data: &NotifyData) -> Result<()> {
            self.calls.push((op, data.clone()));
            Ok(())
        }

        fn load_icon(&mut self, source: &IconSource) -> Result<IconHandle> {
            if self.fail_icon {
                return Err(TrayError::Icon(format!("{source:?}")));
            }
            self.loaded += 1;
            Ok(IconHandle(self.loaded as isize))
        }

        fn destroy_icon(&mut self, icon: IconHandle) {
            self.destroyed.push(icon);
        }

        fn set_menu(&mut self, entries: &[MenuEntry]) -> Result<()> {
            self.menus.push(entries.to_vec());
            Ok(())
        }

        fn track_menu(&mut self) -> Result<u32> {
            Ok(self.selection)
        }

        fn post_quit(&mut self) {
            self.quit_posted += 1;
        }
    }

    pub(crate) fn icon_with(items: Vec<MenuItem>) -> NotifyIcon<FakeShell> {
        let (handle, commands) = TrayHandle::unwoken();
        let config = TrayConfig::new(IconSource::named("tray"))
            .with_tooltip("Tray")
            .with_menu(items);
        NotifyIcon::new(FakeShell::default(), config, handle, commands, IDS)
    }

    fn right_click(icon: &mut NotifyIcon<FakeShell>, index: Option<usize>) -> Option<isize> {
        icon.shell_mut().selection = index.map_or(0, command_id);
        icon.dispatch(WM_NOTIFYICON, 0, WM_RBUTTONUP as isize)
    }

    fn counting_items() -> (Vec<MenuItem>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let items = vec![
            MenuItem::callback("A", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            MenuItem::separator(),
            MenuItem::quit("Quit"),
        ];
        (items, calls)
    }

    #[test]
    fn start_builds_menu_and_adds_icon() {
        let mut icon = icon_with(vec![MenuItem::quit("Quit")]);
        icon.start().unwrap();

        assert_eq!(icon.state(), LifecycleState::Shown);
        assert_eq!(icon.shell().menus.len(), 1);
        let (op, data) = &icon.shell().calls[0];
        assert_eq!(*op, NotifyOp::Add);
        assert_eq!(data.flags, NIF_MESSAGE | NIF_ICON | NIF_TIP);
        assert_eq!(data.callback_message, WM_NOTIFYICON);
        assert_eq!(data.tip.as_deref(), Some("Tray"));
    }

    #[test]
    fn selecting_quit_entry_stops_the_loop() {
        let (items, calls) = counting_items();
        let mut icon = icon_with(items);
        icon.start().unwrap();

        assert_eq!(right_click(&mut icon, Some(2)), Some(0));
        assert_eq!(icon.shell().quit_posted, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn selecting_first_entry_runs_only_its_callback() {
        let (items, calls) = counting_items();
        let mut icon = icon_with(items);
        icon.start().unwrap();

        right_click(&mut icon, Some(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(icon.shell().quit_posted, 0);
    }

    #[test]
    fn dismissed_popup_does_nothing() {
        let (items, calls) = counting_items();
        let mut icon = icon_with(items);
        icon.start().unwrap();

        right_click(&mut icon, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(icon.shell().quit_posted, 0);
    }

    #[test]
    fn taskbar_created_re_adds_exactly_once() {
        let mut icon = icon_with(vec![MenuItem::quit("Quit")]);
        let events = icon.subscribe();
        icon.start().unwrap();

        icon.dispatch(IDS.taskbar_created, 0, 0);
        assert_eq!(icon.shell().ops(), vec![NotifyOp::Add, NotifyOp::Add]);
        assert_eq!(events.try_recv().unwrap(), TrayEvent::IconRestored);
        // Cached handle is reused.
        assert_eq!(icon.shell().loaded, 1);
    }

    #[test]
    fn taskbar_created_before_show_is_ignored() {
        let mut icon = icon_with(vec![]);
        icon.dispatch(IDS.taskbar_created, 0, 0);
        assert!(icon.shell().calls.is_empty());
    }

    #[test]
    fn left_click_emits_activated() {
        let mut icon = icon_with(vec![]);
        let events = icon.subscribe();
        icon.start().unwrap();

        icon.dispatch(WM_NOTIFYICON, 0, WM_LBUTTONUP as isize);
        assert_eq!(events.try_recv().unwrap(), TrayEvent::Activated);
    }

    #[test]
    fn middle_click_quits_by_default() {
        let mut icon = icon_with(vec![]);
        icon.start().unwrap();
        icon.dispatch(WM_NOTIFYICON, 0, WM_MBUTTONUP as isize);
        assert_eq!(icon.shell().quit_posted, 1);
    }

    #[test]
    fn middle_click_policy_can_emit_or_use_last_item() {
        let mut icon = icon_with(vec![MenuItem::emit("A", "a"), MenuItem::emit("B", "b")]);
        icon.config_mut().middle_click = Some(MiddleClick::Emit);
        let events = icon.subscribe();
        icon.start().unwrap();

        icon.dispatch(WM_NOTIFYICON, 0, WM_MBUTTONUP as isize);
        assert_eq!(events.try_recv().unwrap(), TrayEvent::SecondaryActivated);

        icon.config_mut().middle_click = Some(MiddleClick::LastItem);
        icon.dispatch(WM_NOTIFYICON, 0, WM_MBUTTONUP as isize);
        assert_eq!(
            events.try_recv().unwrap(),
            TrayEvent::MenuItem {
                index: 1,
                key: "b".into(),
                checked: None,
            }
        );
        assert_eq!(icon.shell().quit_posted, 0);
    }

    #[test]
    fn stop_message_posts_quit() {
        let mut icon = icon_with(vec![]);
        assert_eq!(icon.dispatch(WM_STOP, 0, 0), Some(0));
        assert_eq!(icon.shell().quit_posted, 1);
    }

    #[test]
    fn unknown_messages_fall_through() {
        let mut icon = icon_with(vec![]);
        assert_eq!(icon.dispatch(0x0010, 0, 0), None);
    }

    #[test]
    fn checking_an_item_rebuilds_the_menu() {
        let mut icon = icon_with(vec![MenuItem::check("C", false, MenuAction::Emit("c".into()))]);
        icon.start().unwrap();

        right_click(&mut icon, Some(0));
        let menus = &icon.shell().menus;
        assert_eq!(menus.len(), 2);
        assert!(matches!(menus[1][0], MenuEntry::Item { checked: true, .. }));
    }

    #[test]
    fn wake_drains_commands() {
        let mut icon = icon_with(vec![]);
        icon.start().unwrap();
        let handle = icon.handle();

        handle.set_tooltip("Busy");
        handle.notify("Title", "Body");
        handle.set_icon(IconSource::named("other"));
        handle.quit();
        icon.dispatch(WM_WAKE, 0, 0);

        assert_eq!(icon.config().tooltip.as_deref(), Some("Busy"));
        let calls = &icon.shell().calls;
        assert_eq!(calls[1].1.flags, NIF_TIP);
        assert_eq!(calls[1].1.tip.as_deref(), Some("Busy"));
        assert_eq!(calls[2].1.flags, NIF_INFO);
        assert_eq!(
            calls[2].1.balloon,
            Some(Balloon {
                title: "Title".into(),
                message: "Body".into(),
            })
        );
        assert_eq!(calls[3].1.flags, NIF_ICON);
        assert_eq!(icon.shell().destroyed, vec![IconHandle(1)]);
        assert_eq!(icon.shell().loaded, 2);
        assert_eq!(icon.shell().quit_posted, 1);
    }

    #[test]
    fn tooltip_round_trip_before_show() {
        let mut icon = icon_with(vec![]);
        icon.set_tooltip("Hello").unwrap();
        assert_eq!(icon.config().tooltip.as_deref(), Some("Hello"));
        assert!(icon.shell().calls.is_empty());
    }

    #[test]
    fn icon_failure_is_reported_once_and_stops() {
        let mut icon = icon_with(vec![]);
        icon.start().unwrap();
        icon.shell_mut().fail_icon = true;
        icon.handle().set_icon(IconSource::file("missing.ico"));

        icon.dispatch(WM_WAKE, 0, 0);
        assert!(matches!(icon.take_failure(), Some(TrayError::Icon(_))));
        assert!(icon.take_failure().is_none());
        assert_eq!(icon.shell().quit_posted, 1);
        assert_eq!(icon.shell().loaded, 1);
    }

    #[test]
    fn notification_title_defaults_to_tooltip() {
        let mut icon = icon_with(vec![]);
        icon.start().unwrap();
        icon.notify("", "Body").unwrap();
        icon.remove_notification().unwrap();

        let calls = &icon.shell().calls;
        let shown = calls[1].1.balloon.as_ref().unwrap();
        assert_eq!(shown.title, "Tray");
        assert_eq!(shown.message, "Body");
        assert_eq!(calls[2].1.balloon.as_ref().unwrap().message, "");
    }

    #[test]
    fn events_can_be_routed_to_an_existing_sink() {
        let (sink, events) = EventSink::channel();
        let mut icon = icon_with(vec![]).with_events(sink);
        icon.start().unwrap();
        icon.dispatch(WM_NOTIFYICON, 0, WM_LBUTTONUP as isize);
        assert_eq!(events.try_recv().unwrap(), TrayEvent::Activated);
        assert_eq!(icon.into_config().tooltip.as_deref(), Some("Tray"));
    }

    #[test]
    fn finish_deletes_icon_and_reports_quit() {
        let mut icon = icon_with(vec![]);
        let events = icon.subscribe();
        icon.start().unwrap();

        icon.finish().unwrap();
        assert_eq!(icon.state(), LifecycleState::Hidden);
        assert_eq!(icon.shell().ops(), vec![NotifyOp::Add, NotifyOp::Delete]);
        assert_eq!(events.try_recv().unwrap(), TrayEvent::QuitRequested);
        assert!(icon.show().is_err());
    }
}
