//! Tray icon configuration.
//!
//! [`TrayConfig`] is the in-memory form every backend consumes. It can be
//! built in code or loaded from TOML through [`TraySettings`]:
//!
//! ```toml
//! id = "my-app"
//! icon_file = "/usr/share/my-app/tray.png"
//! tooltip = "My App"
//!
//! [[menu_items]]
//! label = "Open"
//! key = "open"
//!
//! [[menu_items]]
//! variant = "separator"
//!
//! [[menu_items]]
//! label = "Quit"
//! action = "quit"
//! ```
//!
//! Unknown keys are accepted and ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrayError};
use crate::id::generate_id;
use crate::menu::{MenuAction, MenuItem, MenuVariant};

/// Where the icon image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// Image file on disk (`.png` for Linux backends, `.ico` for Win32).
    File(PathBuf),
    /// Themed icon name (Linux) or embedded resource name (Win32).
    Named(String),
}

impl IconSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Splits a file icon into (theme directory, icon name), the form icon
    /// themes and StatusNotifierItem hosts expect.
    pub fn theme_parts(&self) -> (Option<&Path>, String) {
        match self {
            Self::File(path) => (
                path.parent(),
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            Self::Named(name) => (None, name.clone()),
        }
    }
}

impl Default for IconSource {
    fn default() -> Self {
        Self::Named("application-x-executable".into())
    }
}

impl From<PathBuf> for IconSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for IconSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

/// What a middle click on the icon does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddleClick {
    /// Emit [`crate::TrayEvent::SecondaryActivated`].
    Emit,
    /// Terminate the loop.
    Quit,
    /// Activate the last menu item.
    LastItem,
}

/// Everything a backend needs to materialize a tray icon.
#[derive(Debug, Clone, Default)]
pub struct TrayConfig {
    /// Unique identifier; generated on first use when absent.
    pub id: Option<String>,
    pub icon: IconSource,
    /// Tooltip text, also used as the indicator title.
    pub tooltip: Option<String>,
    pub menu_items: Vec<MenuItem>,
    /// Overrides the backend's middle-click default.
    pub middle_click: Option<MiddleClick>,
}

impl TrayConfig {
    pub fn new(icon: IconSource) -> Self {
        Self {
            icon,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_menu(mut self, items: Vec<MenuItem>) -> Self {
        self.menu_items = items;
        self
    }

    pub fn with_middle_click(mut self, policy: MiddleClick) -> Self {
        self.middle_click = Some(policy);
        self
    }

    /// Returns the identifier, generating and storing one if needed.
    pub fn ensure_id(&mut self) -> &str {
        self.id.get_or_insert_with(generate_id)
    }

    pub fn middle_click_or(&self, default: MiddleClick) -> MiddleClick {
        self.middle_click.unwrap_or(default)
    }
}

/// Serialized form of [`TrayConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_click: Option<MiddleClick>,
    pub menu_items: Vec<MenuItemSettings>,
}

/// Serialized form of a [`MenuItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItemSettings {
    pub label: String,
    pub variant: MenuVariant,
    /// Event key emitted on activation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// `"quit"` terminates the loop; takes precedence over `key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Initial state. Check items start checked when omitted, radio
    /// items unchecked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    pub enabled: bool,
}

impl Default for MenuItemSettings {
    fn default() -> Self {
        Self {
            label: String::new(),
            variant: MenuVariant::Default,
            key: None,
            action: None,
            active: None,
            enabled: true,
        }
    }
}

impl MenuItemSettings {
    fn into_item(self) -> Result<MenuItem> {
        let action = match (self.action.as_deref(), self.key) {
            (Some("quit"), _) => Some(MenuAction::Quit),
            (Some(other), _) => {
                return Err(TrayError::Config(format!("unknown menu action '{other}'")));
            }
            (None, Some(key)) => Some(MenuAction::Emit(key)),
            (None, None) => None,
        };

        let item = match self.variant {
            MenuVariant::Separator => {
                if !self.label.is_empty() || action.is_some() {
                    tracing::warn!(label = %self.label, "separator label and action ignored");
                }
                MenuItem::Separator
            }
            MenuVariant::Default => MenuItem::Action {
                label: self.label,
                enabled: self.enabled,
                action,
            },
            MenuVariant::Radio => MenuItem::Radio {
                label: self.label,
                active: self.active.unwrap_or(false),
                enabled: self.enabled,
                action,
            },
            MenuVariant::Check => MenuItem::Check {
                label: self.label,
                active: self.active.unwrap_or(true),
                enabled: self.enabled,
                action,
            },
        };
        Ok(item)
    }
}

impl TraySettings {
    /// Parses settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), items = settings.menu_items.len(), "tray settings loaded");
        Ok(settings)
    }

    /// Converts into a [`TrayConfig`]. `icon_file` wins over `icon_name`.
    pub fn into_config(self) -> Result<TrayConfig> {
        let icon = match (self.icon_file, self.icon_name) {
            (Some(path), _) => IconSource::File(path),
            (None, Some(name)) => IconSource::Named(name),
            (None, None) => IconSource::default(),
        };
        let menu_items = self
            .menu_items
            .into_iter()
            .map(MenuItemSettings::into_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(TrayConfig {
            id: self.id,
            icon,
            tooltip: self.tooltip,
            menu_items,
            middle_click: self.middle_click,
        })
    }
}
