use super::Busy;
use crate::api::AuthApi;
use crate::error::{ClientError, Result};
use crate::model::{LoginForm, RegisterForm, RegisterResponse, User};
use crate::notify::Notifier;
use crate::session::SessionContext;
use reqwest::StatusCode;
use std::sync::Arc;

/// Session store: login, logout and restore on top of a [`SessionContext`].
pub struct AuthStore {
    session: SessionContext,
    api: AuthApi,
    notifier: Arc<dyn Notifier>,
    loading: Busy,
}

impl AuthStore {
    /// Create a store.
    pub fn new(session: SessionContext, api: AuthApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            session,
            api,
            notifier,
            loading: Busy::default(),
        }
    }

    /// Underlying session.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Whether a call is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// Whether both token and user are present.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Whether the user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// Username, empty when anonymous.
    pub fn user_name(&self) -> String {
        self.session.user_name()
    }

    /// Logged in user.
    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    /// Log in and persist the session.
    pub async fn login(&self, form: &LoginForm) -> Result<User> {
        let _busy = self.loading.enter();

        match self.try_login(form).await {
            Ok(user) => {
                self.notifier.success("Logged in");
                Ok(user)
            }
            Err(e) => {
                tracing::error!(username = %form.username, error = %e, "Login failed");
                self.notifier.error(&login_failure_message(&e));
                Err(e)
            }
        }
    }

    async fn try_login(&self, form: &LoginForm) -> Result<User> {
        let response = self.api.login(form).await?;

        let (token, user) = match (response.token, response.user) {
            (Some(token), Some(user)) if !token.is_empty() => (token, user),
            _ => {
                return Err(ClientError::MalformedResponse(
                    "Login response is missing token or user".to_string(),
                ));
            }
        };

        self.session.establish(token, user.clone())?;
        Ok(user)
    }

    /// Clear the session locally. Idempotent.
    pub fn logout(&self) {
        self.session.logout();
        self.notifier.success("Logged out");
    }

    /// Tell the server, then clear the session regardless of the outcome.
    pub async fn sign_out(&self) {
        if self.session.bearer_token().is_some() {
            if let Err(e) = self.api.logout().await {
                tracing::warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.logout();
    }

    /// Pick up a persisted session without contacting the server.
    pub fn restore_auth(&self) -> bool {
        match self.session.restore() {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                false
            }
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse> {
        let _busy = self.loading.enter();

        let response = self.api.register(form).await.inspect_err(|e| {
            tracing::error!(username = %form.username, error = %e, "Registration failed");
            self.notifier
                .error(e.server_message().unwrap_or("Registration failed, please retry"));
        })?;

        self.notifier.success(
            response
                .message
                .as_deref()
                .unwrap_or("Registration succeeded"),
        );
        Ok(response)
    }

    /// Reload the user from the server and replace the stored copy.
    pub async fn fetch_current_user(&self) -> Result<User> {
        let _busy = self.loading.enter();

        let user = self.api.current_user().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to fetch current user");
            self.notifier.error("Failed to load user information");
        })?;

        self.session.replace_user(user.clone())?;
        Ok(user)
    }

    /// Exchange the current token for a new one.
    pub async fn refresh(&self) -> Result<()> {
        let _busy = self.loading.enter();

        let result = self.try_refresh().await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "Token refresh failed");
            self.notifier.error("Failed to refresh session");
        }
        result
    }

    async fn try_refresh(&self) -> Result<()> {
        let response = self.api.refresh().await?;
        let token = response.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ClientError::MalformedResponse("Refresh response has no token".to_string())
        })?;

        self.session.replace_token(token)?;
        if let Some(user) = response.user {
            self.session.replace_user(user)?;
        }
        Ok(())
    }
}

/// User-facing message for a failed login.
pub fn login_failure_message(error: &ClientError) -> String {
    match error {
        ClientError::Http { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16() => {
            "Invalid username or password".to_string()
        }
        ClientError::Http { status, .. } if *status == StatusCode::FORBIDDEN.as_u16() => {
            "Account is disabled, please contact an administrator".to_string()
        }
        ClientError::Http { .. } => error
            .server_message()
            .unwrap_or("Login failed, please retry")
            .to_string(),
        ClientError::Network(_) | ClientError::Timeout => {
            "Network connection failed, please check your network and retry".to_string()
        }
        other => other.to_string(),
    }
}
