//! Request and response interceptors tied to the session.

use crate::http::{ApiRequest, Interceptor};
use crate::session::SessionContext;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

/// Attaches the bearer token and drops the session on any 401.
pub struct AuthInterceptor {
    session: SessionContext,
}

impl AuthInterceptor {
    /// Create an interceptor for `session`.
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }
}

impl Interceptor for AuthInterceptor {
    fn on_request(&self, _request: &ApiRequest, headers: &mut HeaderMap) {
        let Some(token) = self.session.bearer_token() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Stored token is not a valid header value, sending anonymously"),
        }
    }

    fn on_error(&self, status: StatusCode, request: &ApiRequest) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }

        tracing::warn!(
            method = %request.method,
            path = %request.path,
            "Server rejected credentials, invalidating session"
        );
        self.session.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, User};
    use crate::session::SessionEvent;
    use crate::storage::Storage;

    fn session_with_token() -> SessionContext {
        let session = SessionContext::new(Storage::open_memory().unwrap(), 7);
        session
            .establish(
                "t1".to_string(),
                User {
                    id: 1,
                    username: "alice".to_string(),
                    email: None,
                    role: Role::Reader,
                    status: None,
                },
            )
            .unwrap();
        session
    }

    #[test]
    fn attaches_bearer_header() {
        let interceptor = AuthInterceptor::new(session_with_token());
        let mut headers = HeaderMap::new();
        interceptor.on_request(&ApiRequest::get("/books"), &mut headers);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer t1");
    }

    #[test]
    fn anonymous_request_has_no_header() {
        let session = SessionContext::new(Storage::open_memory().unwrap(), 7);
        let interceptor = AuthInterceptor::new(session);
        let mut headers = HeaderMap::new();
        interceptor.on_request(&ApiRequest::get("/books"), &mut headers);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn unauthorized_invalidates_session() {
        let session = session_with_token();
        let mut events = session.subscribe();
        let interceptor = AuthInterceptor::new(session.clone());

        interceptor.on_error(StatusCode::UNAUTHORIZED, &ApiRequest::get("/books/1"));

        assert!(!session.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Invalidated);
    }

    #[test]
    fn other_errors_leave_session_alone() {
        let session = session_with_token();
        let interceptor = AuthInterceptor::new(session.clone());

        interceptor.on_error(StatusCode::FORBIDDEN, &ApiRequest::delete("/books/1"));
        interceptor.on_error(StatusCode::INTERNAL_SERVER_ERROR, &ApiRequest::get("/books"));

        assert!(session.is_authenticated());
    }
}
