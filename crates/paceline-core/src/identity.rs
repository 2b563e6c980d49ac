//! Identity provider and stored session record.
//!
//! The session record lives in `<base>/session.json` with restricted
//! permissions (0600). It is a local cache of the backend session: reading it
//! answers `current_identity` without a round trip, and clearing it is how
//! sign-out takes effect.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::paths;

/// Opaque handle for the signed-in user.
///
/// Owned by the identity provider; consumers only observe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id assigned at sign-in.
    pub uid: String,
    /// Email address, if the profile has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name shown to mentors and mentees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    /// Returns the best human-readable label for this identity.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Auth change notification payload: the new identity, or None when signed out.
pub type AuthChange = Option<Identity>;

/// Persisted session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub identity: Identity,
    /// When the session was established.
    pub signed_in_at: DateTime<Utc>,
}

/// Session record storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default `<base>/session.json` location.
    pub fn open_default() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the session record from disk.
    /// Returns None if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn load(&self) -> Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        let record = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))?;

        Ok(Some(record))
    }

    /// Saves the session record to disk with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(record).context("Failed to serialize session record")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| {
                    format!("Failed to open {} for writing", self.path.display())
                })?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Removes the session record. Returns true if one existed.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;

        Ok(true)
    }
}

type SubscriberMap = HashMap<u64, mpsc::UnboundedSender<AuthChange>>;

/// Handle for a live auth subscription.
///
/// Receives the current identity immediately, then every sign-in/sign-out.
/// Dropping the handle (or calling [`AuthSubscription::unsubscribe`])
/// releases the registration exactly once; no change is delivered afterwards.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: mpsc::UnboundedReceiver<AuthChange>,
    id: u64,
    subscribers: Weak<Mutex<SubscriberMap>>,
    active: bool,
}

impl AuthSubscription {
    /// Waits for the next auth change.
    ///
    /// Returns None once the subscription is released and drained.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        self.rx.recv().await
    }

    /// Returns the next buffered auth change without waiting.
    pub fn try_recv(&mut self) -> Option<AuthChange> {
        self.rx.try_recv().ok()
    }

    /// Releases the registration. Only the first call has an effect.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers
                .lock()
                .expect("subscriber registry poisoned")
                .remove(&self.id);
        }
        self.rx.close();
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Live identity source consumed by the session runtime.
///
/// Mirrors the hosted auth client surface: a synchronous snapshot, a push
/// subscription firing at least once at startup, and sign-out.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Returns the currently signed-in identity, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Subscribes to auth changes. The current state is delivered to the new
    /// subscriber immediately, then every subsequent change.
    fn subscribe(&self) -> AuthSubscription;

    /// Ends the current session. Returns true if there was one to clear.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn sign_out(&self) -> Result<bool>;
}

/// File-backed identity provider.
///
/// Local stand-in for the hosted auth service: the session record on disk is
/// the source of truth and in-process subscribers are notified on every
/// sign-in/sign-out. Other processes may mutate the same record; see
/// [`spawn_external_poll`] for picking those changes up.
pub struct StoredIdentityProvider {
    store: SessionStore,
    subscribers: Arc<Mutex<SubscriberMap>>,
    next_subscriber_id: AtomicU64,
}

impl StoredIdentityProvider {
    /// Creates a provider over the given session store.
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber_id: AtomicU64::new(0),
        }
    }

    /// Creates a provider over the default session store location.
    pub fn open_default() -> Self {
        Self::new(SessionStore::open_default())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Establishes a session for `identity` and notifies subscribers.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    pub fn sign_in(&self, identity: Identity) -> Result<()> {
        let record = SessionRecord {
            identity: identity.clone(),
            signed_in_at: Utc::now(),
        };
        self.store.save(&record)?;
        self.notify(Some(identity));
        Ok(())
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .len()
    }

    fn notify(&self, change: AuthChange) {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber registry poisoned");
        // A send only fails when the receiving half is gone; drop those entries.
        subscribers.retain(|_, tx| tx.send(change.clone()).is_ok());
    }
}

impl IdentityProvider for StoredIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        match self.store.load() {
            Ok(Some(record)) => Some(record.identity),
            Ok(None) => None,
            Err(err) => {
                // An unreadable record is treated as signed out.
                tracing::warn!("failed to read session record: {err:#}");
                None
            }
        }
    }

    fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        // Snapshot and registration happen under the registry lock so no
        // change can slip between the initial delivery and later
        // notifications. A duplicate delivery of the same value is fine;
        // a gap is not.
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber registry poisoned");
        let _ = tx.send(self.current_identity());
        subscribers.insert(id, tx);
        drop(subscribers);

        AuthSubscription {
            rx,
            id,
            subscribers: Arc::downgrade(&self.subscribers),
            active: true,
        }
    }

    fn sign_out(&self) -> Result<bool> {
        let had_session = self.store.clear()?;
        self.notify(None);
        Ok(had_session)
    }
}

/// Polls the session record for changes made by other processes and notifies
/// subscribers when it differs from the last observed state.
///
/// Returns a token; cancel it to stop the poll task.
pub fn spawn_external_poll(
    provider: Arc<StoredIdentityProvider>,
    period: Duration,
) -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        let mut last = provider.current_identity();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    let current = provider.current_identity();
                    if current != last {
                        tracing::debug!("session record changed externally");
                        provider.notify(current.clone());
                        last = current;
                    }
                }
            }
        }
    });
    cancel
}
