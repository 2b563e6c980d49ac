//! Session resolution and root navigation for Paceline.
//!
//! Decides which root stack to mount (signed-in home vs signed-out entry)
//! by reconciling a locally cached session flag against the live identity
//! subscription. The reducer in [`update`] is pure; all I/O happens in
//! [`runtime`].

pub mod effects;
pub mod events;
pub mod navigation;
pub mod runtime;
pub mod state;
pub mod update;

pub use runtime::SessionRuntime;
pub use state::{Resolution, SessionState};
