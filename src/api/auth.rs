use crate::error::Result;
use crate::http::{ApiRequest, HttpClient};
use crate::model::{LoginForm, LoginResponse, RegisterForm, RegisterResponse, User};
use std::sync::Arc;

/// Client for the `/auth` endpoints.
#[derive(Clone)]
pub struct AuthApi {
    http: Arc<HttpClient>,
}

impl AuthApi {
    /// Create a client sharing `http`.
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// `POST /auth/login`
    pub async fn login(&self, form: &LoginForm) -> Result<LoginResponse> {
        let request = ApiRequest::post("/auth/login").json(form)?;
        self.http.send_json(request).await
    }

    /// `POST /auth/register`
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse> {
        let request = ApiRequest::post("/auth/register").json(form)?;
        self.http.send_json(request).await
    }

    /// `GET /auth/me`
    pub async fn current_user(&self) -> Result<User> {
        self.http.send_json(ApiRequest::get("/auth/me")).await
    }

    /// `POST /auth/logout`
    pub async fn logout(&self) -> Result<()> {
        self.http.send_empty(ApiRequest::post("/auth/logout")).await
    }

    /// `POST /auth/refresh`
    pub async fn refresh(&self) -> Result<LoginResponse> {
        self.http.send_json(ApiRequest::post("/auth/refresh")).await
    }
}
