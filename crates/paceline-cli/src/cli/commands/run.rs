//! Session shell: resolve the session and mount the root stack.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use paceline_core::config::Config;
use paceline_core::identity::{self, StoredIdentityProvider};
use paceline_core::interrupt;
use paceline_core::prefs::PrefsStore;
use paceline_session::SessionRuntime;
use paceline_session::navigation::{Router, Stack};
use paceline_session::state::SessionState;

/// How often watch mode polls the session record for external changes.
const WATCH_POLL_PERIOD: Duration = Duration::from_millis(500);

/// Resolves the session and mounts the root stack.
///
/// With `watch`, keeps running and re-roots on sign-in/sign-out performed by
/// other paceline processes until Ctrl+C.
pub async fn run(config: &Config, watch: bool) -> Result<()> {
    let provider = Arc::new(StoredIdentityProvider::open_default());
    let prefs = Arc::new(PrefsStore::open_default());
    let router = Router::new(&config.entry_route, &config.home_route);

    let mut runtime = SessionRuntime::new(
        Arc::clone(&provider),
        prefs,
        router,
        config.remember_session,
    );
    runtime.resolve().await;
    print_mounted(runtime.host(), &runtime.state);

    if watch {
        let poll = identity::spawn_external_poll(Arc::clone(&provider), WATCH_POLL_PERIOD);
        println!("Watching for sign-in/sign-out (Ctrl+C to quit).");

        loop {
            let next = tokio::select! {
                () = interrupt::wait_for_interrupt() => None,
                event = runtime.next_event() => event,
            };
            let Some(event) = next else { break };

            let before = runtime.host().mounted();
            runtime.dispatch(event);
            if runtime.host().mounted() != before {
                print_mounted(runtime.host(), &runtime.state);
            }
        }

        poll.cancel();
    }

    runtime.shutdown();
    runtime.flush().await;
    Ok(())
}

fn print_mounted(router: &Router, state: &SessionState) {
    match router.mounted() {
        Some(Stack::Home) => {
            let who = state
                .identity
                .as_ref()
                .map_or_else(|| "unknown user".to_string(), |i| i.label().to_string());
            println!(
                "Mounted home stack at '{}' for {who}",
                router.current_route().unwrap_or_default()
            );
        }
        Some(Stack::Entry) | None => {
            println!(
                "Mounted entry stack at '{}' (signed out)",
                router.current_route().unwrap_or_default()
            );
        }
    }
}
