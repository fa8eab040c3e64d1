//! Demo configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/ultrasystray/demo.toml`
//! - Windows: `%APPDATA%/ultrasystray/demo.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ultrasystray::{Backend, MenuItemSettings, MenuVariant, TraySettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Forces a backend; detected from the platform when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,

    #[serde(default = "default_tray")]
    pub tray: TraySettings,
}

fn default_tray() -> TraySettings {
    TraySettings {
        id: Some("ultrasystray-demo".into()),
        icon_name: Some("applications-system".into()),
        tooltip: Some("UltraSystray demo".into()),
        menu_items: vec![
            MenuItemSettings {
                label: "Open".into(),
                key: Some("open".into()),
                ..MenuItemSettings::default()
            },
            MenuItemSettings {
                label: "Mute".into(),
                variant: MenuVariant::Check,
                key: Some("mute".into()),
                active: Some(false),
                ..MenuItemSettings::default()
            },
            MenuItemSettings {
                variant: MenuVariant::Separator,
                ..MenuItemSettings::default()
            },
            MenuItemSettings {
                label: "Quit".into(),
                action: Some("quit".into()),
                ..MenuItemSettings::default()
            },
        ],
        ..TraySettings::default()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            backend: None,
            tray: default_tray(),
        }
    }
}

impl DemoConfig {
    /// Loads the config from the default location, creating it if absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads the config at `path`, writing defaults there first if absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("ultrasystray")
            .join("demo.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("ultrasystray").join("demo.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/ultrasystray/demo.toml")
    }
}
