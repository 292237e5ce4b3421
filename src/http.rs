//! HTTP client wrapper.
//!
//! Every call goes through [`HttpClient::send`], which resolves the path
//! against the configured base URL, runs the request-phase interceptors,
//! and on a non-success status runs the error-phase interceptors before
//! handing the error back to the caller. There is no retry: a timeout or
//! transport failure is reported once.

use crate::config::ServerConfig;
use crate::error::{ClientError, Result};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// Hooks run around every request.
pub trait Interceptor: Send + Sync {
    /// Adjust headers before the request is dispatched.
    fn on_request(&self, _request: &ApiRequest, _headers: &mut HeaderMap) {}

    /// Observe a non-success response. The error is still returned to the
    /// caller afterwards.
    fn on_error(&self, _status: StatusCode, _request: &ApiRequest) {}
}

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
    /// Extra headers.
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// New request without query, body or extra headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query parameters.
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Set an extra header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A successful response with its body read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Response status.
    pub status: StatusCode,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ClientError::MalformedResponse(format!("Unexpected response body: {}", e))
        })
    }
}

/// HTTP client bound to one base URL.
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl HttpClient {
    /// Create a client from server configuration.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            interceptors: Vec::new(),
        })
    }

    /// Register an interceptor. Interceptors run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut headers = request.headers.clone();
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        for interceptor in &self.interceptors {
            interceptor.on_request(&request, &mut headers);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "Request failed without response"
                );
                return Err(e.into());
            }
        };

        let status = response.status();

        // The status alone decides the error phase; the body may never arrive.
        if !status.is_success() {
            for interceptor in &self.interceptors {
                interceptor.on_error(status, &request);
            }
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if !status.is_success() => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    status = status.as_u16(),
                    error = %e,
                    "Failed to read error body"
                );
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "Request completed"
        );

        if status.is_success() {
            return Ok(ApiResponse { status, body });
        }

        Err(ClientError::from_status(status, &body))
    }

    /// Send a request and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    /// Send a request and ignore the body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }
}
