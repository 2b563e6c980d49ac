//! Login/logout commands for the local session record.

use anyhow::Result;
use paceline_core::config::paths;
use paceline_core::identity::{Identity, IdentityProvider, StoredIdentityProvider};

/// Signs in with a local profile and stores the session record.
pub fn login(email: &str, name: Option<String>) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        anyhow::bail!("Email must not be empty");
    }
    if !email.contains('@') {
        anyhow::bail!("'{email}' does not look like an email address");
    }

    let provider = StoredIdentityProvider::open_default();
    let identity = Identity {
        uid: uuid::Uuid::new_v4().to_string(),
        email: Some(email.to_string()),
        display_name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    };
    provider.sign_in(identity)?;

    println!("Signed in as {email}");
    println!("Session stored at {}", paths::session_path().display());
    Ok(())
}

/// Signs out and clears the stored session record.
pub fn logout() -> Result<()> {
    let provider = StoredIdentityProvider::open_default();
    if provider.sign_out()? {
        println!("Signed out; session record cleared.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}
