//! Session event types.
//!
//! All inputs to the resolver are converted to `SessionEvent` before being
//! processed by the reducer. The cache read and the live subscription are
//! independently-arriving async events racing to resolve first; the reducer
//! tolerates either order.

use paceline_core::identity::AuthChange;

/// Unified event enum for the session resolver.
#[derive(Debug)]
pub enum SessionEvent {
    /// Cached-flag read completed. None means missing or unreadable.
    CacheLoaded(Option<bool>),

    /// Live auth change from the identity provider (fires once at startup,
    /// then on every sign-in/sign-out).
    AuthChanged(AuthChange),

    /// The navigation host finished its first mount; imperative navigation
    /// is safe from here on.
    NavigationReady,

    /// A screen asked to end the session.
    SignOutRequested,
}
