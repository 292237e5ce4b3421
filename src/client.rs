//! Wiring of storage, session, HTTP client and stores.

use crate::api::{AuthApi, BookApi};
use crate::config::Config;
use crate::error::Result;
use crate::http::HttpClient;
use crate::interceptor::AuthInterceptor;
use crate::notify::Notifier;
use crate::session::SessionContext;
use crate::storage::Storage;
use crate::store::{AuthStore, BookStore};
use std::sync::Arc;

/// Everything a front end needs, sharing one session.
#[derive(Clone)]
pub struct LibraryClient {
    /// Client configuration.
    pub config: Arc<Config>,
    /// Session shared by the interceptor and the stores.
    pub session: SessionContext,
    /// Session store.
    pub auth: Arc<AuthStore>,
    /// Book collection store.
    pub books: Arc<BookStore>,
}

impl LibraryClient {
    /// Build a client on top of already opened storage.
    pub fn new(config: Config, storage: Storage, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let session = SessionContext::new(storage, config.session.cookie_days);

        let http = HttpClient::new(&config.server)?
            .with_interceptor(Arc::new(AuthInterceptor::new(session.clone())));
        let http = Arc::new(http);

        let auth = AuthStore::new(session.clone(), AuthApi::new(http.clone()), notifier.clone());
        let books = BookStore::new(BookApi::new(http), notifier);

        tracing::debug!(base_url = %config.server.base_url, "Client initialized");

        Ok(Self {
            config: Arc::new(config),
            session,
            auth: Arc::new(auth),
            books: Arc::new(books),
        })
    }

    /// Open the configured storage and build a client.
    pub fn open(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let storage = Storage::open(&config.storage.path)?;
        let purged = storage.purge_expired_cookies()?;
        if purged > 0 {
            tracing::debug!(purged, "Removed expired cookies");
        }
        Self::new(config, storage, notifier)
    }
}
