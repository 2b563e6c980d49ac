//! Session effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! This keeps the reducer pure: it only mutates state and returns effects,
//! never performs I/O itself.

use crate::navigation::Stack;

/// Effects returned by the session reducer for the runtime to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Persist the session flag. Fire-and-forget: routing already used the
    /// live value, so a failed write only affects the next cold start.
    PersistFlag(bool),

    /// Imperatively replace the navigation history with the stack's initial
    /// route. Only emitted once the navigation host is ready.
    ResetNavigation(Stack),

    /// Ask the identity provider to end the session.
    SignOut,
}
