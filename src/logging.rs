use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Send `tracing` output to the log file; the terminal belongs to the UI.
///
/// `RUST_LOG` overrides the configured level. Without a usable log path,
/// logging stays off.
pub fn init(config: &Config) -> Result<()> {
    let Some(path) = config.log_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install logger: {e}"))?;

    tracing::info!(path = %path.display(), version = env!("CARGO_PKG_VERSION"), "remindkit starting");
    Ok(())
}
