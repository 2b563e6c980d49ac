//! Status command: session, cached flag, config.

use anyhow::Result;
use paceline_core::config::{Config, paths};
use paceline_core::identity::{IdentityProvider, StoredIdentityProvider};
use paceline_core::prefs::{KvStore, PrefsStore};
use paceline_session::runtime::SESSION_FLAG_KEY;

/// Prints the current session, cached flag, and config locations.
pub fn show(config: &Config) -> Result<()> {
    let provider = StoredIdentityProvider::open_default();
    match provider.current_identity() {
        Some(identity) => {
            println!("Signed in: yes ({})", identity.label());
            println!("  uid: {}", identity.uid);
        }
        None => println!("Signed in: no"),
    }

    let prefs = PrefsStore::open_default();
    let cached = match prefs.get(SESSION_FLAG_KEY) {
        Ok(Some(value)) => value,
        Ok(None) => "unset".to_string(),
        Err(_) => "unreadable".to_string(),
    };
    println!("Cached session flag: {cached}");
    println!("Remember session: {}", config.remember_session);
    println!("Config file: {}", paths::config_path().display());
    Ok(())
}
