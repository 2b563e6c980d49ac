//! Session state.
//!
//! The routing decision starts from a fast local guess and converges to the
//! value reported by the identity provider:
//!
//! ```text
//! Unknown ──cache──▶ Authenticated/Unauthenticated (provisional)
//!    │                         │
//!    └────────live────────────▶ Authenticated/Unauthenticated (authoritative)
//! ```
//!
//! The machine has no terminal state: sign-in/sign-out cycles move between
//! the two resolved values for the lifetime of the process.

use paceline_core::identity::Identity;

/// Routing decision for the root navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Neither the cache read nor the live subscription has reported yet.
    Unknown,
    /// A session is (believed to be) active.
    Authenticated,
    /// No session.
    Unauthenticated,
}

/// Where the current [`Resolution`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Provisional guess from the persisted flag.
    Cache,
    /// Authoritative value from the identity provider.
    Live,
}

/// State owned by the session reducer.
#[derive(Debug)]
pub struct SessionState {
    /// Current routing decision.
    pub resolved: Resolution,
    /// Source of `resolved`; None while still Unknown.
    pub source: Option<ResolutionSource>,
    /// True once the navigation host finished its first mount.
    /// Monotonic: never reverts to false.
    pub navigation_ready: bool,
    /// Identity reported by the last live callback, if any.
    pub identity: Option<Identity>,
    /// Whether the cached-flag fast path is enabled (config `remember_session`).
    pub remember_session: bool,
}

impl SessionState {
    /// Creates the initial (unresolved) state.
    pub fn new(remember_session: bool) -> Self {
        Self {
            resolved: Resolution::Unknown,
            source: None,
            navigation_ready: false,
            identity: None,
            remember_session,
        }
    }

    /// Returns true once the identity provider has reported at least once.
    pub fn is_live_resolved(&self) -> bool {
        matches!(self.source, Some(ResolutionSource::Live))
    }
}
