//! Root navigation stacks.
//!
//! Two disjoint stacks exist: the signed-out entry stack and the signed-in
//! home stack. Which one renders is a declarative function of the current
//! resolution; imperative `reset`/`navigate` only exist to correct history
//! that is already mounted (e.g. sign-out while deep inside the home stack).

use crate::state::Resolution;

/// The two disjoint root stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stack {
    /// Signed-out surface (welcome, sign-in).
    Entry,
    /// Signed-in surface (boards, goals, mentors).
    Home,
}

impl Stack {
    /// Declarative stack selection: which stack renders for a resolution.
    ///
    /// `Unknown` renders the entry stack; it doubles as the loading surface.
    pub fn for_resolution(resolved: Resolution) -> Self {
        match resolved {
            Resolution::Authenticated => Stack::Home,
            Resolution::Unknown | Resolution::Unauthenticated => Stack::Entry,
        }
    }
}

/// Navigation host consumed by the session runtime.
///
/// `mount` is the declarative mechanism. `reset` and `navigate` are
/// imperative and must not be called before the host has completed its
/// first mount.
pub trait NavigationHost: Send + 'static {
    /// Declaratively selects the rendered stack. Remounting the already
    /// mounted stack is a no-op.
    fn mount(&mut self, stack: Stack);

    /// Replaces the entire navigation history with the stack's initial route.
    fn reset(&mut self, stack: Stack);

    /// Pushes a route onto the current history.
    fn navigate(&mut self, route: &str);
}

/// In-process navigation host tracking the mounted stack and route history.
#[derive(Debug)]
pub struct Router {
    entry_route: String,
    home_route: String,
    mounted: Option<Stack>,
    history: Vec<String>,
    reset_count: usize,
}

impl Router {
    /// Creates a router with the initial route of each stack.
    pub fn new(entry_route: impl Into<String>, home_route: impl Into<String>) -> Self {
        Self {
            entry_route: entry_route.into(),
            home_route: home_route.into(),
            mounted: None,
            history: Vec::new(),
            reset_count: 0,
        }
    }

    /// Returns the currently mounted stack, if any.
    pub fn mounted(&self) -> Option<Stack> {
        self.mounted
    }

    /// Returns the route currently on top of the history.
    pub fn current_route(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Returns the full route history.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Returns how many imperative resets have been issued.
    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    fn initial_route(&self, stack: Stack) -> &str {
        match stack {
            Stack::Entry => &self.entry_route,
            Stack::Home => &self.home_route,
        }
    }
}

impl NavigationHost for Router {
    fn mount(&mut self, stack: Stack) {
        if self.mounted == Some(stack) {
            return;
        }
        // Swapping the mounted stack drops the old stack's history.
        self.mounted = Some(stack);
        self.history = vec![self.initial_route(stack).to_string()];
    }

    fn reset(&mut self, stack: Stack) {
        self.mounted = Some(stack);
        self.history = vec![self.initial_route(stack).to_string()];
        self.reset_count += 1;
    }

    fn navigate(&mut self, route: &str) {
        self.history.push(route.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: declarative stack selection maps Unknown to the entry stack.
    #[test]
    fn test_stack_for_resolution() {
        assert_eq!(Stack::for_resolution(Resolution::Unknown), Stack::Entry);
        assert_eq!(
            Stack::for_resolution(Resolution::Unauthenticated),
            Stack::Entry
        );
        assert_eq!(
            Stack::for_resolution(Resolution::Authenticated),
            Stack::Home
        );
    }

    /// Test: mounting the same stack twice keeps its history.
    #[test]
    fn test_mount_same_stack_keeps_history() {
        let mut router = Router::new("welcome", "today");
        router.mount(Stack::Home);
        router.navigate("goals");

        router.mount(Stack::Home);
        assert_eq!(router.history(), ["today", "goals"]);
    }

    /// Test: mounting a different stack drops the old history.
    #[test]
    fn test_mount_other_stack_drops_history() {
        let mut router = Router::new("welcome", "today");
        router.mount(Stack::Home);
        router.navigate("goals");

        router.mount(Stack::Entry);
        assert_eq!(router.history(), ["welcome"]);
        assert_eq!(router.reset_count(), 0);
    }

    /// Test: reset replaces history with the initial route and is counted.
    #[test]
    fn test_reset_replaces_history() {
        let mut router = Router::new("welcome", "today");
        router.mount(Stack::Home);
        router.navigate("goals");
        router.navigate("mentors");

        router.reset(Stack::Entry);
        assert_eq!(router.mounted(), Some(Stack::Entry));
        assert_eq!(router.history(), ["welcome"]);
        assert_eq!(router.reset_count(), 1);
    }

    /// Test: navigate pushes onto the current history.
    #[test]
    fn test_navigate_pushes_route() {
        let mut router = Router::new("welcome", "today");
        router.mount(Stack::Home);
        router.navigate("goals");

        assert_eq!(router.current_route(), Some("goals"));
        assert_eq!(router.history(), ["today", "goals"]);
    }
}
