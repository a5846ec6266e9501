//! Redirects raised by the session core.
//!
//! The core never drives a UI directly. When the gateway sees a 401 or the
//! watchdog sees the token expire, a `Redirect` is broadcast and whatever
//! front end is listening moves the user to the login screen.

use tokio::sync::broadcast;
use tracing::{debug, info};

/// Redirect events kept for slow subscribers
const REDIRECT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
        }
    }
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to sign out
    SignedOut,
    /// The remote API rejected the token
    Unauthorized,
    /// The token's expiry passed
    Expired,
}

impl LogoutReason {
    pub fn description(&self) -> &'static str {
        match self {
            LogoutReason::SignedOut => "Signed out",
            LogoutReason::Unauthorized => "Session rejected by the server",
            LogoutReason::Expired => "Session expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    pub reason: LogoutReason,
}

/// Broadcasts redirects to every subscriber. Clone is cheap.
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: broadcast::Sender<Redirect>,
}

impl Navigator {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(REDIRECT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Redirect> {
        self.tx.subscribe()
    }

    pub fn redirect_to_login(&self, reason: LogoutReason) {
        info!(reason = reason.description(), "Redirecting to login");
        let redirect = Redirect {
            to: Route::Login,
            reason,
        };
        if self.tx.send(redirect).is_err() {
            debug!("No one is listening for redirects");
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redirect_reaches_every_subscriber() {
        let navigator = Navigator::new();
        let mut first = navigator.subscribe();
        let mut second = navigator.clone().subscribe();

        navigator.redirect_to_login(LogoutReason::Expired);

        let expected = Redirect {
            to: Route::Login,
            reason: LogoutReason::Expired,
        };
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
    }

    #[test]
    fn test_redirect_without_subscribers_is_harmless() {
        Navigator::new().redirect_to_login(LogoutReason::Unauthorized);
    }

    #[test]
    fn test_redirects_target_login_route() {
        let navigator = Navigator::new();
        let mut redirects = navigator.subscribe();
        navigator.redirect_to_login(LogoutReason::SignedOut);

        let redirect = redirects.try_recv().unwrap();
        assert_eq!(redirect.to.path(), "/login");
    }
}
