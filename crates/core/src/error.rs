//! Error types shared by all tray backends.

/// Errors produced while building, showing or running a tray icon.
#[derive(Debug, thiserror::Error)]
pub enum TrayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("icon error: {0}")]
    Icon(String),

    #[error("toolkit call failed: {0}")]
    Toolkit(String),

    #[error("{0} backend is not available on this platform")]
    Unsupported(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("menu index {0} is out of range")]
    MenuIndex(usize),
}

impl From<toml::de::Error> for TrayError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrayError>;
