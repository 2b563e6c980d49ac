//! Session runtime - owns the collaborators, runs the inbox, executes effects.
//!
//! This is the effect boundary: the reducer stays pure and produces effects;
//! this module executes them.
//!
//! ## Inbox Pattern
//!
//! All async inputs (the cache read, the live auth subscription) send
//! `SessionEvent`s to a single unbounded inbox. The runtime drains the inbox,
//! applies the reducer, executes the returned effects, and reconciles the
//! declaratively mounted stack with the new resolution.
//!
//! ## Teardown
//!
//! The subscription forwarder selects on a `CancellationToken`; cancelling it
//! releases the provider subscription exactly once. Fire-and-forget writes
//! land in a `JoinSet` so one-shot callers can wait them out before exiting.

use std::sync::Arc;

use paceline_core::identity::IdentityProvider;
use paceline_core::prefs::KvStore;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::effects::SessionEffect;
use crate::events::SessionEvent;
use crate::navigation::{NavigationHost, Stack};
use crate::state::SessionState;
use crate::update;

/// Preference key for the cached session flag.
pub const SESSION_FLAG_KEY: &str = "session.was_authenticated";

/// Session runtime.
///
/// Generic over its collaborators so tests can substitute fakes; production
/// wiring uses the stored identity provider, the file-backed preferences
/// store, and the in-process router.
pub struct SessionRuntime<P, K, N> {
    /// Resolver state. Mutated only by [`SessionRuntime::dispatch`].
    pub state: SessionState,
    host: N,
    provider: Arc<P>,
    prefs: Arc<K>,
    inbox_tx: mpsc::UnboundedSender<SessionEvent>,
    inbox_rx: mpsc::UnboundedReceiver<SessionEvent>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    started: bool,
}

impl<P, K, N> SessionRuntime<P, K, N>
where
    P: IdentityProvider,
    K: KvStore,
    N: NavigationHost,
{
    /// Creates a runtime over the given collaborators.
    pub fn new(provider: Arc<P>, prefs: Arc<K>, host: N, remember_session: bool) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            state: SessionState::new(remember_session),
            host,
            provider,
            prefs,
            inbox_tx,
            inbox_rx,
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
            started: false,
        }
    }

    pub fn host(&self) -> &N {
        &self.host
    }

    /// Starts the concurrent cache read and the live subscription, mounts
    /// the initial stack, and reports the navigation host ready.
    ///
    /// The two startup events race; the reducer tolerates either order.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if self.state.remember_session {
            let prefs = Arc::clone(&self.prefs);
            let tx = self.inbox_tx.clone();
            tokio::spawn(async move {
                let flag = tokio::task::spawn_blocking(move || read_cached_flag(prefs.as_ref()))
                    .await
                    .unwrap_or(None);
                let _ = tx.send(SessionEvent::CacheLoaded(flag));
            });
        }

        let mut subscription = self.provider.subscribe();
        let tx = self.inbox_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    change = subscription.recv() => match change {
                        Some(change) => {
                            let _ = tx.send(SessionEvent::AuthChanged(change));
                        }
                        None => break,
                    },
                }
            }
            subscription.unsubscribe();
        });

        // Declarative first mount, then the ready signal: imperative resets
        // are legal only from this point on.
        self.host.mount(Stack::for_resolution(self.state.resolved));
        self.dispatch(SessionEvent::NavigationReady);
    }

    /// Runs startup resolution: drains events until the identity provider
    /// has reported at least once.
    ///
    /// There is no timeout. A provider that never reports leaves the entry
    /// stack mounted, which is the accepted degenerate case.
    pub async fn resolve(&mut self) {
        self.start();
        while !self.state.is_live_resolved() {
            match self.inbox_rx.recv().await {
                Some(event) => self.dispatch(event),
                None => break,
            }
        }
    }

    /// Waits for the next inbox event. Returns None once the inbox closes.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.inbox_rx.recv().await
    }

    /// Applies one event through the reducer, executes the resulting
    /// effects, and reconciles the declaratively mounted stack.
    pub fn dispatch(&mut self, event: SessionEvent) {
        let effects = update::update(&mut self.state, event);
        for effect in effects {
            self.execute_effect(effect);
        }
        self.host.mount(Stack::for_resolution(self.state.resolved));
    }

    fn execute_effect(&mut self, effect: SessionEffect) {
        match effect {
            SessionEffect::PersistFlag(value) => {
                // Fire and forget: routing already used the live value, so a
                // failed write only affects the next cold start's guess.
                let prefs = Arc::clone(&self.prefs);
                self.tasks.spawn(async move {
                    let result = tokio::task::spawn_blocking(move || {
                        prefs.set(SESSION_FLAG_KEY, if value { "true" } else { "false" })
                    })
                    .await;
                    match result {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            tracing::warn!("failed to persist session flag: {err:#}");
                        }
                        Err(err) => tracing::warn!("session flag persist task failed: {err}"),
                    }
                });
            }
            SessionEffect::ResetNavigation(stack) => {
                debug_assert!(self.state.navigation_ready);
                self.host.reset(stack);
            }
            SessionEffect::SignOut => {
                let provider = Arc::clone(&self.provider);
                self.tasks.spawn(async move {
                    let result = tokio::task::spawn_blocking(move || provider.sign_out()).await;
                    match result {
                        Ok(Ok(_)) => {}
                        Ok(Err(err)) => tracing::warn!("sign-out failed: {err:#}"),
                        Err(err) => tracing::warn!("sign-out task failed: {err}"),
                    }
                });
            }
        }
    }

    /// Waits for outstanding fire-and-forget writes.
    ///
    /// Used by one-shot callers before exiting; long-lived callers never
    /// need it.
    pub async fn flush(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// Tears down the runtime: the subscription forwarder releases the
    /// provider subscription and no further callback is observed.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
    }
}

impl<P, K, N> Drop for SessionRuntime<P, K, N> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Reads the cached session flag. Any failure is an absent flag.
fn read_cached_flag<K: KvStore>(prefs: &K) -> Option<bool> {
    match prefs.get(SESSION_FLAG_KEY) {
        Ok(Some(value)) => Some(value == "true"),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!("failed to read cached session flag: {err:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use paceline_core::identity::{Identity, SessionStore, StoredIdentityProvider};
    use paceline_core::prefs::PrefsStore;
    use tempfile::tempdir;

    use super::*;
    use crate::navigation::Router;
    use crate::state::Resolution;

    type TestRuntime = SessionRuntime<StoredIdentityProvider, PrefsStore, Router>;

    fn test_identity() -> Identity {
        Identity {
            uid: "uid-1".to_string(),
            email: Some("mentee@example.com".to_string()),
            display_name: None,
        }
    }

    fn runtime_in(
        dir: &Path,
        remember: bool,
    ) -> (Arc<StoredIdentityProvider>, Arc<PrefsStore>, TestRuntime) {
        let provider = Arc::new(StoredIdentityProvider::new(SessionStore::new(
            dir.join("session.json"),
        )));
        let prefs = Arc::new(PrefsStore::new(dir.join("prefs.json")));
        let runtime = SessionRuntime::new(
            Arc::clone(&provider),
            Arc::clone(&prefs),
            Router::new("welcome", "today"),
            remember,
        );
        (provider, prefs, runtime)
    }

    /// Drives the runtime until the router mounts the expected stack.
    async fn pump_until_mounted(runtime: &mut TestRuntime, expected: Stack) {
        while runtime.host().mounted() != Some(expected) {
            let event = tokio::time::timeout(Duration::from_secs(2), runtime.next_event())
                .await
                .expect("expected a session event")
                .expect("inbox closed");
            runtime.dispatch(event);
        }
    }

    /// Cold start with no cache and no session resolves to the entry stack
    /// and persists the signed-out flag.
    #[tokio::test]
    async fn test_cold_start_signed_out() {
        let dir = tempdir().unwrap();
        let (_provider, prefs, mut runtime) = runtime_in(dir.path(), true);

        runtime.resolve().await;

        assert_eq!(runtime.state.resolved, Resolution::Unauthenticated);
        assert_eq!(runtime.host().mounted(), Some(Stack::Entry));
        assert_eq!(runtime.host().current_route(), Some("welcome"));

        runtime.flush().await;
        assert_eq!(
            prefs.get(SESSION_FLAG_KEY).unwrap().as_deref(),
            Some("false")
        );
    }

    /// Cold start with a stored session mounts the home stack.
    #[tokio::test]
    async fn test_cold_start_signed_in() {
        let dir = tempdir().unwrap();
        let (provider, prefs, mut runtime) = runtime_in(dir.path(), true);
        provider.sign_in(test_identity()).unwrap();

        runtime.resolve().await;

        assert_eq!(runtime.state.resolved, Resolution::Authenticated);
        assert_eq!(runtime.host().mounted(), Some(Stack::Home));
        assert_eq!(runtime.host().current_route(), Some("today"));
        assert_eq!(runtime.state.identity.as_ref().unwrap().uid, "uid-1");

        runtime.flush().await;
        assert_eq!(prefs.get(SESSION_FLAG_KEY).unwrap().as_deref(), Some("true"));
    }

    /// A stale cached flag ("was signed in") is overridden by the live
    /// state and rewritten.
    #[tokio::test]
    async fn test_stale_cached_flag_overridden() {
        let dir = tempdir().unwrap();
        let (_provider, prefs, mut runtime) = runtime_in(dir.path(), true);
        prefs.set(SESSION_FLAG_KEY, "true").unwrap();

        runtime.resolve().await;

        assert_eq!(runtime.state.resolved, Resolution::Unauthenticated);
        assert_eq!(runtime.host().mounted(), Some(Stack::Entry));

        runtime.flush().await;
        assert_eq!(
            prefs.get(SESSION_FLAG_KEY).unwrap().as_deref(),
            Some("false")
        );
    }

    /// Sign-out after mount issues exactly one imperative reset to the
    /// entry stack.
    #[tokio::test]
    async fn test_sign_out_reroots_once() {
        let dir = tempdir().unwrap();
        let (provider, prefs, mut runtime) = runtime_in(dir.path(), true);
        provider.sign_in(test_identity()).unwrap();

        runtime.resolve().await;
        assert_eq!(runtime.host().mounted(), Some(Stack::Home));
        let resets_before = runtime.host().reset_count();

        provider.sign_out().unwrap();
        pump_until_mounted(&mut runtime, Stack::Entry).await;

        assert_eq!(runtime.host().reset_count(), resets_before + 1);
        assert_eq!(runtime.state.resolved, Resolution::Unauthenticated);

        runtime.flush().await;
        assert_eq!(
            prefs.get(SESSION_FLAG_KEY).unwrap().as_deref(),
            Some("false")
        );
    }

    /// After shutdown, further provider changes do not reach the resolver.
    #[tokio::test]
    async fn test_shutdown_stops_callbacks() {
        let dir = tempdir().unwrap();
        let (provider, _prefs, mut runtime) = runtime_in(dir.path(), true);

        runtime.resolve().await;
        assert_eq!(runtime.state.resolved, Resolution::Unauthenticated);

        runtime.shutdown();
        // Wait for the forwarder to release its subscription.
        for _ in 0..100 {
            if provider.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(provider.subscriber_count(), 0);

        provider.sign_in(test_identity()).unwrap();

        // Drain anything still buffered; the sign-in must not be in it.
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(100), runtime.next_event()).await
        {
            runtime.dispatch(event);
        }
        assert_eq!(runtime.state.resolved, Resolution::Unauthenticated);
        assert!(runtime.state.identity.is_none());
    }

    /// With remember_session disabled the cached flag is neither read nor
    /// written.
    #[tokio::test]
    async fn test_remember_disabled_leaves_flag_alone() {
        let dir = tempdir().unwrap();
        let (_provider, prefs, mut runtime) = runtime_in(dir.path(), false);
        prefs.set(SESSION_FLAG_KEY, "true").unwrap();

        runtime.resolve().await;

        assert_eq!(runtime.state.resolved, Resolution::Unauthenticated);
        runtime.flush().await;
        assert_eq!(prefs.get(SESSION_FLAG_KEY).unwrap().as_deref(), Some("true"));
    }
}
