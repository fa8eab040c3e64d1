//! Popup menu model shared by every backend.
//!
//! Menu entries are a tagged enum, so a separator can never carry a label
//! or an action. Backends translate the list into native widgets and route
//! clicks back through [`activate`], which owns check/radio bookkeeping and
//! action dispatch.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrayError};
use crate::event::{EventSink, TrayEvent};

/// Closure invoked on the tray loop thread when its item is activated.
pub type Callback = Arc<dyn Fn(&MenuActivation) + Send + Sync>;

/// What happens when a menu item is activated.
#[derive(Clone)]
pub enum MenuAction {
    /// Terminates the tray loop.
    Quit,
    /// Sends [`TrayEvent::MenuItem`] with this key to the subscriber.
    Emit(String),
    /// Runs a closure on the loop thread.
    Callback(Callback),
}

impl fmt::Debug for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quit => f.write_str("Quit"),
            Self::Emit(key) => f.debug_tuple("Emit").field(key).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Details handed to callbacks and carried by menu events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuActivation {
    /// Position of the item in the menu list.
    pub index: usize,
    /// Item label at activation time.
    pub label: String,
    /// New checked state for check and radio items.
    pub checked: Option<bool>,
}

/// A single menu entry.
#[derive(Debug, Clone)]
pub enum MenuItem {
    Separator,
    Action {
        label: String,
        enabled: bool,
        action: Option<MenuAction>,
    },
    Radio {
        label: String,
        active: bool,
        enabled: bool,
        action: Option<MenuAction>,
    },
    Check {
        label: String,
        active: bool,
        enabled: bool,
        action: Option<MenuAction>,
    },
}

/// Variant names as used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuVariant {
    #[default]
    Default,
    Radio,
    Check,
    Separator,
}

impl FromStr for MenuVariant {
    type Err = TrayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Self::Default),
            "radio" => Ok(Self::Radio),
            "check" => Ok(Self::Check),
            "separator" => Ok(Self::Separator),
            other => Err(TrayError::Config(format!("unknown menu variant '{other}'"))),
        }
    }
}

impl fmt::Display for MenuVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Radio => "radio",
            Self::Check => "check",
            Self::Separator => "separator",
        })
    }
}

impl MenuItem {
    pub fn separator() -> Self {
        Self::Separator
    }

    /// Plain clickable item.
    pub fn action(label: impl Into<String>, action: MenuAction) -> Self {
        Self::Action {
            label: label.into(),
            enabled: true,
            action: Some(action),
        }
    }

    /// Plain item that emits [`TrayEvent::MenuItem`] with `key`.
    pub fn emit(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self::action(label, MenuAction::Emit(key.into()))
    }

    /// Plain item that runs `f` on the loop thread.
    pub fn callback<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&MenuActivation) + Send + Sync + 'static,
    {
        Self::action(label, MenuAction::Callback(Arc::new(f)))
    }

    /// Plain item that terminates the tray loop.
    pub fn quit(label: impl Into<String>) -> Self {
        Self::action(label, MenuAction::Quit)
    }

    /// Disabled, informational item.
    pub fn text(label: impl Into<String>) -> Self {
        Self::Action {
            label: label.into(),
            enabled: false,
            action: None,
        }
    }

    pub fn radio(label: impl Into<String>, active: bool, action: MenuAction) -> Self {
        Self::Radio {
            label: label.into(),
            active,
            enabled: true,
            action: Some(action),
        }
    }

    pub fn check(label: impl Into<String>, active: bool, action: MenuAction) -> Self {
        Self::Check {
            label: label.into(),
            active,
            enabled: true,
            action: Some(action),
        }
    }

    /// Returns the item with its enabled flag replaced. No-op on separators.
    pub fn with_enabled(mut self, value: bool) -> Self {
        match &mut self {
            Self::Separator => {}
            Self::Action { enabled, .. }
            | Self::Radio { enabled, .. }
            | Self::Check { enabled, .. } => *enabled = value,
        }
        self
    }

    pub fn variant(&self) -> MenuVariant {
        match self {
            Self::Separator => MenuVariant::Separator,
            Self::Action { .. } => MenuVariant::Default,
            Self::Radio { .. } => MenuVariant::Radio,
            Self::Check { .. } => MenuVariant::Check,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Separator => None,
            Self::Action { label, .. } | Self::Radio { label, .. } | Self::Check { label, .. } => {
                Some(label)
            }
        }
    }

    pub fn menu_action(&self) -> Option<&MenuAction> {
        match self {
            Self::Separator => None,
            Self::Action { action, .. }
            | Self::Radio { action, .. }
            | Self::Check { action, .. } => action.as_ref(),
        }
    }

    /// Whether the item can be clicked. Separators never can.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Separator => false,
            Self::Action { enabled, .. }
            | Self::Radio { enabled, .. }
            | Self::Check { enabled, .. } => *enabled,
        }
    }

    /// Checked state for radio and check items.
    pub fn is_active(&self) -> Option<bool> {
        match self {
            Self::Radio { active, .. } | Self::Check { active, .. } => Some(*active),
            _ => None,
        }
    }
}

/// Outcome of activating a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The item ran; the loop keeps going.
    Continue,
    /// The item asked the loop to terminate.
    Quit,
    /// Nothing ran (separator or disabled item).
    Ignored,
}

/// Activates the item at `index`.
///
/// Check items toggle, radio items become the active member of their
/// group, then the item's action runs. Separators and disabled items are
/// ignored.
pub fn activate(items: &mut [MenuItem], index: usize, events: &EventSink) -> Result<Activation> {
    let group = radio_group(items, index);
    let item = items.get_mut(index).ok_or(TrayError::MenuIndex(index))?;

    if !item.is_enabled() {
        tracing::debug!(index, variant = %item.variant(), "ignoring inactive menu item");
        return Ok(Activation::Ignored);
    }

    let checked = match item {
        MenuItem::Check { active, .. } => {
            *active = !*active;
            Some(*active)
        }
        MenuItem::Radio { .. } => Some(true),
        _ => None,
    };

    if let Some(group) = group {
        let start = group.start;
        for (offset, member) in items[group].iter_mut().enumerate() {
            if let MenuItem::Radio { active, .. } = member {
                *active = start + offset == index;
            }
        }
    }

    let item = &items[index];
    let activation = MenuActivation {
        index,
        label: item.label().unwrap_or_default().to_string(),
        checked,
    };
    tracing::debug!(index, label = %activation.label, "menu item activated");

    match item.menu_action() {
        None => Ok(Activation::Continue),
        Some(MenuAction::Quit) => Ok(Activation::Quit),
        Some(MenuAction::Emit(key)) => {
            events.emit(TrayEvent::MenuItem {
                index,
                key: key.clone(),
                checked,
            });
            Ok(Activation::Continue)
        }
        Some(MenuAction::Callback(f)) => {
            f(&activation);
            Ok(Activation::Continue)
        }
    }
}

/// Returns the range of consecutive radio items containing `index`, or
/// `None` when the item at `index` is not a radio item.
pub fn radio_group(items: &[MenuItem], index: usize) -> Option<Range<usize>> {
    if !matches!(items.get(index), Some(MenuItem::Radio { .. })) {
        return None;
    }
    let is_radio = |item: &MenuItem| matches!(item, MenuItem::Radio { .. });
    let start = items[..index]
        .iter()
        .rposition(|item| !is_radio(item))
        .map_or(0, |p| p + 1);
    let end = items[index..]
        .iter()
        .position(|item| !is_radio(item))
        .map_or(items.len(), |p| index + p);
    Some(start..end)
}

/// The menu shown when the caller configured no items.
pub fn default_menu() -> Vec<MenuItem> {
    vec![MenuItem::quit("Quit")]
}

/// Index of the middle-click target: always the last entry.
pub fn middle_click_target(items: &[MenuItem]) -> Option<usize> {
    items.len().checked_sub(1)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(label: &str, counter: &Arc<AtomicUsize>) -> MenuItem {
        let counter = Arc::clone(counter);
        MenuItem::callback(label, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn separator_has_no_label_or_action() {
        let item = MenuItem::separator();
        assert_eq!(item.variant(), MenuVariant::Separator);
        assert!(item.label().is_none());
        assert!(item.menu_action().is_none());
        assert!(!item.is_enabled());
    }

    #[test]
    fn separator_activation_runs_nothing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut items = vec![
            counting("A", &hits),
            MenuItem::separator(),
            counting("B", &hits),
        ];
        let (sink, rx) = EventSink::channel();

        let outcome = activate(&mut items, 1, &sink).unwrap();
        assert_eq!(outcome, Activation::Ignored);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn quit_item_terminates_and_callback_continues() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut items = vec![
            counting("A", &hits),
            MenuItem::separator(),
            MenuItem::quit("Quit"),
        ];
        let sink = EventSink::default();

        assert_eq!(activate(&mut items, 0, &sink).unwrap(), Activation::Continue);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert_eq!(activate(&mut items, 2, &sink).unwrap(), Activation::Quit);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_item_is_ignored() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut items = vec![counting("A", &hits).with_enabled(false)];
        let outcome = activate(&mut items, 0, &EventSink::default()).unwrap();
        assert_eq!(outcome, Activation::Ignored);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut items = vec![MenuItem::quit("Quit")];
        let err = activate(&mut items, 3, &EventSink::default()).unwrap_err();
        assert!(matches!(err, TrayError::MenuIndex(3)));
    }

    #[test]
    fn emit_sends_menu_event() {
        let mut items = vec![MenuItem::emit("Open", "open")];
        let (sink, rx) = EventSink::channel();

        activate(&mut items, 0, &sink).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            TrayEvent::MenuItem {
                index: 0,
                key: "open".into(),
                checked: None,
            }
        );
    }

    #[test]
    fn check_item_toggles() {
        let mut items = vec![MenuItem::check("Autostart", false, MenuAction::Emit("auto".into()))];
        let (sink, rx) = EventSink::channel();

        activate(&mut items, 0, &sink).unwrap();
        assert_eq!(items[0].is_active(), Some(true));
        activate(&mut items, 0, &sink).unwrap();
        assert_eq!(items[0].is_active(), Some(false));

        let checked: Vec<_> = rx
            .try_iter()
            .map(|event| match event {
                TrayEvent::MenuItem { checked, .. } => checked,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(checked, vec![Some(true), Some(false)]);
    }

    #[test]
    fn radio_selection_is_exclusive_within_group() {
        let pick = |key: &str| MenuAction::Emit(key.into());
        let mut items = vec![
            MenuItem::radio("One", true, pick("1")),
            MenuItem::radio("Two", false, pick("2")),
            MenuItem::radio("Three", false, pick("3")),
            MenuItem::separator(),
            MenuItem::radio("Other", true, pick("x")),
        ];

        activate(&mut items, 2, &EventSink::default()).unwrap();

        let states: Vec<_> = items.iter().map(MenuItem::is_active).collect();
        assert_eq!(
            states,
            vec![Some(false), Some(false), Some(true), None, Some(true)]
        );
    }

    #[test]
    fn radio_group_bounds() {
        let pick = || MenuAction::Quit;
        let items = vec![
            MenuItem::quit("Head"),
            MenuItem::radio("a", false, pick()),
            MenuItem::radio("b", false, pick()),
            MenuItem::separator(),
        ];
        assert_eq!(radio_group(&items, 2), Some(1..3));
        assert_eq!(radio_group(&items, 1), Some(1..3));
        assert_eq!(radio_group(&items, 0), None);
        assert_eq!(radio_group(&items, 9), None);
    }

    #[test]
    fn middle_click_target_is_last_item() {
        for len in 1..6 {
            let items: Vec<_> = (0..len).map(|i| MenuItem::text(format!("{i}"))).collect();
            assert_eq!(middle_click_target(&items), Some(len - 1));
        }
        assert_eq!(middle_click_target(&[]), None);
    }

    #[test]
    fn default_menu_is_single_quit() {
        let items = default_menu();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0].menu_action(), Some(MenuAction::Quit)));
    }

    #[test]
    fn variant_parsing() {
        assert_eq!("radio".parse::<MenuVariant>().unwrap(), MenuVariant::Radio);
        assert_eq!("separator".parse::<MenuVariant>().unwrap(), MenuVariant::Separator);
        assert!("bogus".parse::<MenuVariant>().is_err());
        assert_eq!(MenuVariant::Check.to_string(), "check");
    }
}
