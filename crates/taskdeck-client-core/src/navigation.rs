//! Route gating between the auth and app screen groups.
//!
//! A pure decision function instead of an effectful watcher: the shell calls
//! [`decide`] after every session transition or navigation change and applies
//! the returned decision. Until the navigation system reports ready the
//! answer is always [`NavDecision::Stay`], so no redirect can race the
//! router's own initialization.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenGroup {
    Auth,
    App,
}

impl ScreenGroup {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::App => "app",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDecision {
    Stay,
    GoLogin,
    GoAppHome,
}

#[must_use]
pub fn decide(signed_in: bool, group: ScreenGroup, nav_ready: bool) -> NavDecision {
    if !nav_ready {
        return NavDecision::Stay;
    }
    match (signed_in, group) {
        (false, ScreenGroup::App) => NavDecision::GoLogin,
        (true, ScreenGroup::Auth) => NavDecision::GoAppHome,
        (false, ScreenGroup::Auth) | (true, ScreenGroup::App) => NavDecision::Stay,
    }
}
