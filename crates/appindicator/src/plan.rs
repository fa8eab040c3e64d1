//! Layout of the exported DBusMenu.
//!
//! DBusMenu has no standalone radio item: radio buttons are exported as
//! a group, so consecutive [`MenuItem::Radio`] entries collapse into one
//! [`Entry::RadioGroup`]. Every entry remembers the index of the item it
//! came from, which is what activation reports.

use ultrasystray_core::MenuItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioOption {
    pub index: usize,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Separator,
    Standard {
        index: usize,
        label: String,
        enabled: bool,
    },
    Check {
        index: usize,
        label: String,
        checked: bool,
        enabled: bool,
    },
    RadioGroup {
        /// Position of the active option; equal to `options.len()` when
        /// no option is active.
        selected: usize,
        options: Vec<RadioOption>,
    },
}

pub fn plan(items: &[MenuItem]) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::with_capacity(items.len());
    let mut group_open = false;

    for (index, item) in items.iter().enumerate() {
        let is_radio = matches!(item, MenuItem::Radio { .. });
        match item {
            MenuItem::Separator => entries.push(Entry::Separator),
            MenuItem::Action { label, enabled, .. } => entries.push(Entry::Standard {
                index,
                label: label.clone(),
                enabled: *enabled,
            }),
            MenuItem::Check {
                label,
                active,
                enabled,
                ..
            } => entries.push(Entry::Check {
                index,
                label: label.clone(),
                checked: *active,
                enabled: *enabled,
            }),
            MenuItem::Radio {
                label,
                active,
                enabled,
                ..
            } => {
                let option = RadioOption {
                    index,
                    label: label.clone(),
                    enabled: *enabled,
                };
                match entries.last_mut() {
                    Some(Entry::RadioGroup { selected, options }) if group_open => {
                        if *active {
                            *selected = options.len();
                        } else if *selected == options.len() {
                            *selected += 1;
                        }
                        options.push(option);
                    }
                    _ => entries.push(Entry::RadioGroup {
                        selected: if *active { 0 } else { 1 },
                        options: vec![option],
                    }),
                }
            }
        }
        group_open = is_radio;
    }
    entries
}
