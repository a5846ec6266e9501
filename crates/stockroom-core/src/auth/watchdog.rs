//! Clock-driven session expiry.
//!
//! The watchdog reads the persisted expiry once when mounted and then acts
//! on its own timers: it raises a warning five minutes before the deadline
//! and forces a logout at the deadline. It never touches the network.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::navigation::{LogoutReason, Navigator};

use super::TokenStore;

/// How long before expiry the warning is raised
pub const WARNING_LEAD: Duration = Duration::from_secs(5 * 60);

/// Deadlines further out are scheduled at this horizon instead
const MAX_HORIZON: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// No expiry on record, nothing scheduled
    Idle,
    /// Timers running, deadline not yet near
    Armed,
    /// Less than `WARNING_LEAD` left
    Warning,
    /// Deadline passed; session cleared and login requested
    Expired,
}

/// A mounted watchdog. Dropping it cancels any pending timers.
pub struct ExpiryWatchdog {
    state: watch::Receiver<WatchdogState>,
    task: Option<JoinHandle<()>>,
}

impl ExpiryWatchdog {
    /// Mount against the current wall clock. Must be called inside a tokio runtime.
    pub fn mount(tokens: TokenStore, navigator: Navigator) -> Self {
        Self::mount_at(tokens, navigator, Utc::now())
    }

    /// Mount as if the wall clock read `now`.
    pub fn mount_at(tokens: TokenStore, navigator: Navigator, now: DateTime<Utc>) -> Self {
        let (tx, rx) = watch::channel(WatchdogState::Idle);

        let raw = match tokens.read_expiry() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Could not read session expiry, watchdog idle");
                None
            }
        };
        let Some(raw) = raw else {
            debug!("No session expiry on record, watchdog idle");
            return Self { state: rx, task: None };
        };

        let time_left = match raw.trim().parse::<i64>() {
            Ok(exp_secs) => time_left_millis(exp_secs, now),
            Err(_) => {
                warn!(value = %raw, "Malformed session expiry, treating as expired");
                0
            }
        };

        if time_left <= 0 {
            expire(&tokens, &navigator);
            tx.send_replace(WatchdogState::Expired);
            return Self { state: rx, task: None };
        }

        let time_left = Duration::from_millis(time_left as u64).min(MAX_HORIZON);
        let start = Instant::now();
        let warn_at = start + time_left.saturating_sub(WARNING_LEAD);
        let logout_at = start + time_left;
        tx.send_replace(WatchdogState::Armed);
        debug!(seconds_left = time_left.as_secs(), "Session watchdog armed");

        let task = tokio::spawn(async move {
            sleep_until(warn_at).await;
            info!("Session ending soon");
            tx.send_replace(WatchdogState::Warning);

            sleep_until(logout_at).await;
            expire(&tokens, &navigator);
            tx.send_replace(WatchdogState::Expired);
        });

        Self {
            state: rx,
            task: Some(task),
        }
    }

    pub fn state(&self) -> WatchdogState {
        *self.state.borrow()
    }

    /// True once the session-ending banner should be shown
    pub fn warning(&self) -> bool {
        matches!(self.state(), WatchdogState::Warning)
    }

    /// Whether timers are pending
    pub fn is_scheduled(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// A receiver for state transitions
    pub fn subscribe(&self) -> watch::Receiver<WatchdogState> {
        self.state.clone()
    }
}

impl Drop for ExpiryWatchdog {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Milliseconds until `exp_secs`, never wrapping past either bound
fn time_left_millis(exp_secs: i64, now: DateTime<Utc>) -> i64 {
    exp_secs
        .saturating_mul(1000)
        .saturating_sub(now.timestamp_millis())
}

fn expire(tokens: &TokenStore, navigator: &Navigator) {
    info!("Session expired");
    if let Err(e) = tokens.clear() {
        warn!(error = %e, "Failed to clear expired session");
    }
    navigator.redirect_to_login(LogoutReason::Expired);
}
