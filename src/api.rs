//! Typed wrappers around the REST endpoints.

/// `/auth` endpoints.
pub mod auth;
/// `/books` endpoints.
pub mod books;

pub use auth::AuthApi;
pub use books::BookApi;
