//! UltraSystray demo entry point.
//!
//! Usage: `ultrasystray-demo [CONFIG]`. Without an argument the config is
//! read from (or created at) the platform default location.

mod app;
mod config;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting UltraSystray demo"
    );

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => config::DemoConfig::load_from(&path)?,
        None => config::DemoConfig::load()?,
    };
    tracing::info!(
        backend = ?config.backend,
        items = config.tray.menu_items.len(),
        "configuration loaded"
    );

    app::run(config)?;

    tracing::info!("demo shut down cleanly");
    Ok(())
}
