use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::navigation::LogoutReason;

use super::token::decode_token;
use super::{AuthError, TokenStore};

pub use crate::models::User;

/// The current-user state published by the session manager.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    /// True until `SessionManager::initialize` has run
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Read-only view of the session, handed to everything that is not the
/// session manager.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.rx.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    /// Wait for the next state change. Returns false once the manager is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Owns the current-user state and the login/logout operations.
///
/// Only the manager mutates the session; `handle()` gives out read-only
/// views.
pub struct SessionManager {
    api: ApiClient,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { api, state }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.state.subscribe(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn tokens(&self) -> &TokenStore {
        self.api.tokens()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().user.is_some()
    }

    fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| state.user = user);
    }

    /// Restore the session from the stored token.
    ///
    /// A token that fails to decode is an error: the stored records are
    /// cleared, the session stays anonymous and the error is returned.
    pub fn initialize(&self) -> Result<Option<User>, AuthError> {
        let result = self.restore();
        self.state.send_modify(|state| state.loading = false);
        result
    }

    fn restore(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.tokens().read()? else {
            info!("No stored session");
            return Ok(None);
        };

        let decoded = decode_token(&token).and_then(|claims| Ok((claims.to_user()?, claims.expiry()?)));
        let (user, exp) = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                error!(error = %e, "Stored token is unreadable, discarding it");
                if let Err(clear_err) = self.tokens().clear() {
                    warn!(error = %clear_err, "Failed to discard unreadable token");
                }
                return Err(e);
            }
        };

        match exp {
            Some(exp) => self.tokens().save_expiry(exp)?,
            None => {
                warn!("Stored token carries no expiry");
                self.tokens().clear_expiry()?;
            }
        }

        info!(user_id = user.id, "Restored session");
        self.set_user(Some(user.clone()));
        Ok(Some(user))
    }

    /// Exchange credentials for a session.
    ///
    /// The current user comes from the login response, not from the token.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let sign_in = self.api.sign_in(email, password).await?;

        let expiry = match decode_token(&sign_in.token).and_then(|claims| claims.expiry()) {
            Ok(expiry) => expiry,
            Err(e) => {
                warn!(error = %e, "Issued token could not be decoded, expiry unknown");
                None
            }
        };

        self.tokens().save(&sign_in.token)?;
        let recorded = match expiry {
            Some(exp) => self.tokens().save_expiry(exp),
            None => self.tokens().clear_expiry(),
        };
        // The expiry record must match the stored token, so never keep one without the other
        if let Err(e) = recorded {
            error!(error = %e, "Failed to record session expiry, discarding token");
            if let Err(clear_err) = self.tokens().clear() {
                warn!(error = %clear_err, "Failed to discard token");
            }
            return Err(e.into());
        }

        info!(user_id = sign_in.user.id, "Logged in");
        self.set_user(Some(sign_in.user.clone()));
        Ok(sign_in.user)
    }

    /// Sign out locally. No network call is made.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.tokens().clear()?;
        self.set_user(None);
        info!("Logged out");
        self.api.navigator().redirect_to_login(LogoutReason::SignedOut);
        Ok(())
    }

    /// Drop the in-memory user after the gateway or the watchdog ended the
    /// session. Storage has already been cleared by whoever raised it.
    pub fn end_session(&self, reason: LogoutReason) {
        if self.is_authenticated() {
            info!(reason = reason.description(), "Session ended");
            self.set_user(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Navigator;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::json;

    fn manager() -> SessionManager {
        let api = ApiClient::new("http://api.local", TokenStore::in_memory(), Navigator::new()).unwrap();
        SessionManager::new(api)
    }

    fn token(payload: serde_json::Value) -> String {
        format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload.to_string()))
    }

    #[test]
    fn test_initialize_without_token() {
        let manager = manager();
        let handle = manager.handle();
        assert!(handle.is_loading());

        assert_eq!(manager.initialize().unwrap(), None);
        assert!(!handle.is_loading());
        assert!(!handle.is_authenticated());
    }

    #[test]
    fn test_initialize_restores_user_and_expiry() {
        let manager = manager();
        manager
            .api()
            .tokens()
            .save(&token(json!({
                "id": 3, "email": "ana@x.com", "name": "Ana", "accessType": 1, "exp": 1_900_000_000
            })))
            .unwrap();

        let user = manager.initialize().unwrap().unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(manager.handle().user(), Some(user));
        assert_eq!(
            manager.api().tokens().read_expiry().unwrap().as_deref(),
            Some("1900000000")
        );
    }

    #[test]
    fn test_initialize_surfaces_corrupt_token() {
        let manager = manager();
        manager.api().tokens().save("not-a-token").unwrap();
        manager.api().tokens().save_expiry(1).unwrap();

        assert!(matches!(manager.initialize(), Err(AuthError::InvalidToken)));
        let handle = manager.handle();
        assert!(!handle.is_loading());
        assert!(!handle.is_authenticated());
        assert_eq!(manager.api().tokens().read().unwrap(), None);
        assert_eq!(manager.api().tokens().read_expiry().unwrap(), None);
    }

    #[test]
    fn test_initialize_rejects_token_without_identity() {
        let manager = manager();
        manager.api().tokens().save(&token(json!({"exp": 1}))).unwrap();
        assert!(matches!(manager.initialize(), Err(AuthError::MissingClaim("id"))));
    }

    #[test]
    fn test_logout_clears_everything() {
        let manager = manager();
        let mut redirects = manager.api().navigator().subscribe();
        manager
            .api()
            .tokens()
            .save(&token(json!({"id": 1, "email": "a@x.com", "name": "A", "accessType": 3, "exp": 5})))
            .unwrap();
        manager.initialize().unwrap();
        assert!(manager.is_authenticated());

        manager.logout().unwrap();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.api().tokens().read().unwrap(), None);
        assert_eq!(manager.api().tokens().read_expiry().unwrap(), None);
        assert_eq!(redirects.try_recv().unwrap().reason, LogoutReason::SignedOut);
    }

    #[tokio::test]
    async fn test_handle_observes_changes() {
        let manager = manager();
        let mut handle = manager.handle();
        manager.initialize().unwrap();
        assert!(handle.changed().await);
        assert!(!handle.is_loading());

        drop(manager);
        assert!(!handle.changed().await);
    }
}
