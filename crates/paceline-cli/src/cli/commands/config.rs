//! Config commands.

use anyhow::Result;
use paceline_core::config::{Config, paths};

/// Shows the path to the config file.
pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}

/// Initializes a default config file.
pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    Config::init(&config_path)?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

/// Enables or disables the remembered-session fast path.
pub fn set_remember(value: bool) -> Result<()> {
    Config::save_remember_session(value)?;
    if value {
        println!("Remembered-session fast path enabled.");
    } else {
        println!("Remembered-session fast path disabled.");
    }
    Ok(())
}
