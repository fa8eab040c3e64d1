//! Widget layout for the GTK popup menu.

use ultrasystray_core::MenuItem;

/// Mouse button GDK reports for a middle click.
pub const MIDDLE_BUTTON: u32 = 2;

/// One widget of the popup menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    /// `GtkSeparatorMenuItem`.
    Separator,
    /// `GtkCheckMenuItem`, initially active when `active`.
    Check {
        index: usize,
        label: String,
        active: bool,
        sensitive: bool,
    },
    /// Plain `GtkMenuItem`. Radio items render as plain items too.
    Item {
        index: usize,
        label: String,
        sensitive: bool,
    },
}

pub fn plan(items: &[MenuItem]) -> Vec<Widget> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            MenuItem::Separator => Widget::Separator,
            MenuItem::Check {
                label,
                active,
                enabled,
                ..
            } => Widget::Check {
                index,
                label: label.clone(),
                active: *active,
                sensitive: *enabled,
            },
            MenuItem::Action { label, enabled, .. } | MenuItem::Radio { label, enabled, .. } => {
                Widget::Item {
                    index,
                    label: label.clone(),
                    sensitive: *enabled,
                }
            }
        })
        .collect()
}

pub fn is_middle_click(button: u32) -> bool {
    button == MIDDLE_BUTTON
}
