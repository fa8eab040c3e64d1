//! Backend selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ultrasystray_core::TrayError;

/// Environment variable that overrides [`Backend::detect`].
pub const BACKEND_ENV: &str = "ULTRASYSTRAY_BACKEND";

/// The interchangeable tray implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Win32,
    Gtk,
    #[serde(alias = "ayatana")]
    AppIndicator,
    Stub,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Gtk => "gtk",
            Self::AppIndicator => "appindicator",
            Self::Stub => "stub",
        }
    }

    /// Default backend for the target platform.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Win32
        } else if cfg!(target_os = "linux") {
            Self::AppIndicator
        } else {
            Self::Stub
        }
    }

    /// Platform default, unless [`BACKEND_ENV`] names another backend.
    pub fn detect() -> Self {
        Self::from_env_value(std::env::var(BACKEND_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return Self::platform_default();
        };
        match value.parse::<Self>() {
            Ok(backend) => {
                tracing::debug!(%backend, "tray backend forced by {BACKEND_ENV}");
                backend
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring {BACKEND_ENV}");
                Self::platform_default()
            }
        }
    }

    /// Whether this backend is compiled in for the current target.
    pub fn is_available(self) -> bool {
        match self {
            Self::Win32 => cfg!(windows),
            Self::AppIndicator => cfg!(target_os = "linux"),
            Self::Gtk => cfg!(all(target_os = "linux", feature = "gtk")),
            Self::Stub => true,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = TrayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win32" => Ok(Self::Win32),
            "gtk" => Ok(Self::Gtk),
            "appindicator" | "ayatana" => Ok(Self::AppIndicator),
            "stub" => Ok(Self::Stub),
            other => Err(TrayError::Config(format!("unknown tray backend `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("win32".parse::<Backend>().unwrap(), Backend::Win32);
        assert_eq!(" GTK ".parse::<Backend>().unwrap(), Backend::Gtk);
        assert_eq!("ayatana".parse::<Backend>().unwrap(), Backend::AppIndicator);
        assert_eq!("appindicator".parse::<Backend>().unwrap(), Backend::AppIndicator);
        assert!(matches!("cocoa".parse::<Backend>(), Err(TrayError::Config(_))));
    }

    #[test]
    fn display_round_trips() {
        for backend in [Backend::Win32, Backend::Gtk, Backend::AppIndicator, Backend::Stub] {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
    }

    #[test]
    fn env_value_overrides_default() {
        assert_eq!(Backend::from_env_value(Some("stub")), Backend::Stub);
        assert_eq!(Backend::from_env_value(None), Backend::platform_default());
        assert_eq!(Backend::from_env_value(Some("")), Backend::platform_default());
        assert_eq!(Backend::from_env_value(Some("bogus")), Backend::platform_default());
    }

    #[test]
    fn platform_default_is_available() {
        assert!(Backend::platform_default().is_available());
        assert!(Backend::Stub.is_available());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_prefers_appindicator() {
        assert_eq!(Backend::platform_default(), Backend::AppIndicator);
        assert!(!Backend::Win32.is_available());
    }

    #[test]
    fn deserializes_from_toml_strings() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: Backend,
        }
        let parsed: Wrapper = toml::from_str("backend = \"ayatana\"").unwrap();
        assert_eq!(parsed.backend, Backend::AppIndicator);
    }
}
