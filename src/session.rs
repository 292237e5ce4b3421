//! Session context: the current token and user, their persisted copies,
//! and the events published when the session changes.

use crate::error::{ClientError, Result};
use crate::model::{Role, User};
use crate::storage::Storage;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "token";
/// Stored item holding the user as JSON.
pub const USER_ITEM: &str = "user";

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A login succeeded.
    LoggedIn(User),
    /// A persisted session was picked up at startup.
    Restored(User),
    /// The user logged out.
    LoggedOut,
    /// The server rejected the token; the user must log in again.
    Invalidated,
}

/// In-memory session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Bearer token.
    pub token: Option<String>,
    /// Logged in user.
    pub user: Option<User>,
}

impl SessionState {
    /// Both token and user are known.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Shared handle to the session. Clones observe the same state.
#[derive(Clone)]
pub struct SessionContext {
    state: Arc<RwLock<SessionState>>,
    storage: Storage,
    events: broadcast::Sender<SessionEvent>,
    cookie_days: u32,
}

impl SessionContext {
    /// Create an anonymous session backed by `storage`.
    pub fn new(storage: Storage, cookie_days: u32) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            storage,
            events,
            cookie_days,
        }
    }

    /// Backing storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// In-memory token.
    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    /// Token to send with a request: the in-memory one, else the persisted
    /// cookie.
    pub fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self.token() {
            return Some(token);
        }

        match self.storage.get_cookie(TOKEN_COOKIE) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read token cookie");
                None
            }
        }
    }

    /// Logged in user.
    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Whether both token and user are present.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// Whether the logged in user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.state
            .read()
            .user
            .as_ref()
            .is_some_and(|u| u.role == Role::Admin)
    }

    /// Username, or an empty string when anonymous.
    pub fn user_name(&self) -> String {
        self.state
            .read()
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Persist and adopt a fresh login.
    pub fn establish(&self, token: String, user: User) -> Result<()> {
        self.storage
            .set_cookie(TOKEN_COOKIE, &token, self.cookie_days)?;
        if let Err(e) = self.persist_user(&user) {
            // A token without its user must not outlive the failed login.
            if let Err(cleanup) = self.storage.remove_cookie(TOKEN_COOKIE) {
                tracing::warn!(error = %cleanup, "Failed to remove token cookie");
            }
            return Err(e);
        }

        {
            let mut state = self.state.write();
            state.token = Some(token);
            state.user = Some(user.clone());
        }

        tracing::info!(user = %user.username, role = %user.role, "Session established");
        self.publish(SessionEvent::LoggedIn(user));
        Ok(())
    }

    /// Swap the token, keeping the user.
    pub fn replace_token(&self, token: String) -> Result<()> {
        self.storage
            .set_cookie(TOKEN_COOKIE, &token, self.cookie_days)?;
        self.state.write().token = Some(token);
        Ok(())
    }

    /// Swap the user, keeping the token.
    pub fn replace_user(&self, user: User) -> Result<()> {
        self.persist_user(&user)?;
        self.state.write().user = Some(user);
        Ok(())
    }

    fn persist_user(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)
            .map_err(|e| ClientError::Storage(format!("Failed to encode user: {}", e)))?;
        self.storage.set_item(USER_ITEM, &json)
    }

    /// Pick up a persisted session.
    ///
    /// Returns `true` when both token and user were found and the user
    /// parsed. A user that fails to parse logs the session out.
    pub fn restore(&self) -> Result<bool> {
        let token = self.storage.get_cookie(TOKEN_COOKIE)?;
        let user_json = self.storage.get_item(USER_ITEM)?;

        let (Some(token), Some(user_json)) = (token, user_json) else {
            tracing::debug!("No persisted session");
            return Ok(false);
        };

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => {
                {
                    let mut state = self.state.write();
                    state.token = Some(token);
                    state.user = Some(user.clone());
                }
                tracing::info!(user = %user.username, "Restored persisted session");
                self.publish(SessionEvent::Restored(user));
                Ok(true)
            }
            Err(e) => {
                tracing::error!(error = %e, "Persisted user is corrupt, logging out");
                self.logout();
                Ok(false)
            }
        }
    }

    /// Clear memory and storage and announce a logout. Idempotent.
    pub fn logout(&self) {
        self.clear();
        self.publish(SessionEvent::LoggedOut);
    }

    /// Clear memory and storage after the server rejected the token.
    pub fn invalidate(&self) {
        self.clear();
        self.publish(SessionEvent::Invalidated);
    }

    fn clear(&self) {
        *self.state.write() = SessionState::default();

        if let Err(e) = self.storage.remove_cookie(TOKEN_COOKIE) {
            tracing::warn!(error = %e, "Failed to remove token cookie");
        }
        if let Err(e) = self.storage.remove_item(USER_ITEM) {
            tracing::warn!(error = %e, "Failed to remove stored user");
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: None,
            role: Role::Reader,
            status: None,
        }
    }

    fn session() -> SessionContext {
        SessionContext::new(Storage::open_memory().unwrap(), 7)
    }

    #[test]
    fn establish_persists_and_authenticates() {
        let session = session();
        assert!(!session.is_authenticated());

        session.establish("t1".to_string(), alice()).unwrap();

        assert!(session.is_authenticated());
        assert!(!session.is_admin());
        assert_eq!(session.user_name(), "alice");
        assert_eq!(
            session.storage().get_cookie(TOKEN_COOKIE).unwrap().as_deref(),
            Some("t1")
        );
        assert!(session.storage().get_item(USER_ITEM).unwrap().is_some());
    }

    #[test]
    fn logout_clears_everything_and_is_idempotent() {
        let session = session();
        session.establish("t1".to_string(), alice()).unwrap();

        session.logout();
        session.logout();

        assert_eq!(session.snapshot(), SessionState::default());
        assert!(session.storage().get_cookie(TOKEN_COOKIE).unwrap().is_none());
        assert!(session.storage().get_item(USER_ITEM).unwrap().is_none());
    }

    #[test]
    fn restore_valid_session() {
        let storage = Storage::open_memory().unwrap();
        SessionContext::new(storage.clone(), 7)
            .establish("t1".to_string(), alice())
            .unwrap();

        let fresh = SessionContext::new(storage, 7);
        assert!(fresh.restore().unwrap());
        assert_eq!(fresh.token().as_deref(), Some("t1"));
        assert_eq!(fresh.user(), Some(alice()));
    }

    #[test]
    fn restore_corrupt_user_logs_out() {
        let storage = Storage::open_memory().unwrap();
        storage.set_cookie(TOKEN_COOKIE, "t1", 7).unwrap();
        storage.set_item(USER_ITEM, "{not json").unwrap();

        let session = SessionContext::new(storage.clone(), 7);
        let mut events = session.subscribe();

        assert!(!session.restore().unwrap());
        assert!(!session.is_authenticated());
        assert!(storage.get_cookie(TOKEN_COOKIE).unwrap().is_none());
        assert!(storage.get_item(USER_ITEM).unwrap().is_none());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    }

    #[test]
    fn restore_needs_both_halves() {
        let storage = Storage::open_memory().unwrap();
        storage.set_cookie(TOKEN_COOKIE, "t1", 7).unwrap();

        let session = SessionContext::new(storage.clone(), 7);
        assert!(!session.restore().unwrap());
        assert!(!session.is_authenticated());
        // A lone token is left alone.
        assert!(storage.get_cookie(TOKEN_COOKIE).unwrap().is_some());
    }

    #[test]
    fn bearer_token_falls_back_to_cookie() {
        let storage = Storage::open_memory().unwrap();
        storage.set_cookie(TOKEN_COOKIE, "cookie-token", 7).unwrap();

        let session = SessionContext::new(storage, 7);
        assert!(session.token().is_none());
        assert_eq!(session.bearer_token().as_deref(), Some("cookie-token"));
    }

    #[test]
    fn failed_establish_leaves_no_token_behind() {
        let storage = Storage::open_memory().unwrap();
        storage.execute_batch("DROP TABLE items;").unwrap();
        let session = SessionContext::new(storage.clone(), 7);

        let err = session.establish("t1".to_string(), alice()).unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert!(!session.is_authenticated());
        assert!(storage.get_cookie(TOKEN_COOKIE).unwrap().is_none());
        assert!(session.bearer_token().is_none());
    }

    #[test]
    fn invalidate_publishes_event() {
        let session = session();
        session.establish("t1".to_string(), alice()).unwrap();
        let mut events = session.subscribe();

        session.invalidate();

        assert!(!session.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Invalidated);
    }

    #[test]
    fn admin_role_detected() {
        let session = session();
        let mut admin = alice();
        admin.role = Role::Admin;
        session.establish("t".to_string(), admin).unwrap();
        assert!(session.is_admin());
    }
}
