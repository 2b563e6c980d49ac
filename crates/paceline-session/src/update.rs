//! Session reducer (update function).
//!
//! All session state transitions happen here. The runtime calls
//! `update(state, event)` and executes the returned effects.
//!
//! The two startup events (cache read, first live callback) may arrive in
//! either order. The live callback always wins by overwriting
//! unconditionally; the cache write is conditional on no live observation
//! having been applied yet.

use crate::effects::SessionEffect;
use crate::events::SessionEvent;
use crate::navigation::Stack;
use crate::state::{Resolution, ResolutionSource, SessionState};

/// The session reducer.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(state: &mut SessionState, event: SessionEvent) -> Vec<SessionEffect> {
    match event {
        SessionEvent::CacheLoaded(flag) => {
            // The live subscription may have reported before the cache read
            // finished; its value is authoritative and must stand.
            if state.is_live_resolved() {
                return vec![];
            }
            if let Some(was_authenticated) = flag {
                state.resolved = if was_authenticated {
                    Resolution::Authenticated
                } else {
                    Resolution::Unauthenticated
                };
                state.source = Some(ResolutionSource::Cache);
            }
            // No flag: stay Unknown. The entry stack renders for both.
            vec![]
        }

        SessionEvent::AuthChanged(identity) => {
            let previous_target = Stack::for_resolution(state.resolved);
            let authenticated = identity.is_some();

            state.resolved = if authenticated {
                Resolution::Authenticated
            } else {
                Resolution::Unauthenticated
            };
            state.source = Some(ResolutionSource::Live);
            state.identity = identity;

            let mut effects = Vec::new();
            if state.remember_session {
                // Re-persisted on every callback, including same-value repeats.
                effects.push(SessionEffect::PersistFlag(authenticated));
            }

            // The imperative re-root only corrects already-mounted history;
            // before the host is ready the declarative mount picks the right
            // stack on its own.
            let target = Stack::for_resolution(state.resolved);
            if state.navigation_ready && target != previous_target {
                effects.push(SessionEffect::ResetNavigation(target));
            }

            effects
        }

        SessionEvent::NavigationReady => {
            state.navigation_ready = true;
            vec![]
        }

        SessionEvent::SignOutRequested => vec![SessionEffect::SignOut],
    }
}
