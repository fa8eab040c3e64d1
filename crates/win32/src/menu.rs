//! Translation of menu items into native popup menu entries.
//!
//! Native item ids are positional: item `i` gets id `i + 1`, because
//! `TrackPopupMenuEx` returns 0 when the menu is dismissed.

use ultrasystray_core::MenuItem;

/// One entry of the native popup menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    /// Type-only separator entry (`MFT_SEPARATOR`).
    Separator,
    /// String entry (`MFT_STRING`).
    Item {
        id: u32,
        label: String,
        radio: bool,
        checked: bool,
        disabled: bool,
    },
}

/// Builds one native entry per menu item, in order.
pub fn plan(items: &[MenuItem]) -> Vec<MenuEntry> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            MenuItem::Separator => MenuEntry::Separator,
            MenuItem::Action { label, enabled, .. } => MenuEntry::Item {
                id: command_id(index),
                label: label.clone(),
                radio: false,
                checked: false,
                disabled: !enabled,
            },
            MenuItem::Radio {
                label,
                active,
                enabled,
                ..
            } => MenuEntry::Item {
                id: command_id(index),
                label: label.clone(),
                radio: true,
                checked: *active,
                disabled: !enabled,
            },
            MenuItem::Check {
                label,
                active,
                enabled,
                ..
            } => MenuEntry::Item {
                id: command_id(index),
                label: label.clone(),
                radio: false,
                checked: *active,
                disabled: !enabled,
            },
        })
        .collect()
}

/// Native command id for the item at `index`.
pub fn command_id(index: usize) -> u32 {
    index as u32 + 1
}

/// Item index for a command id returned by the popup; `None` on dismissal.
pub fn index_for_command(id: u32) -> Option<usize> {
    id.checked_sub(1).map(|i| i as usize)
}
