//! libris-client: client library for the library management REST service.
//!
//! This crate talks to the library backend on behalf of a front end: it
//! logs users in, keeps the session across runs, attaches the bearer token
//! to every request, and keeps a local view of the book catalog in step
//! with the server.
//!
//! # Features
//!
//! - Persistent session (token cookie with expiry + stored user)
//! - Global logout on any 401, published as a session event
//! - Book listing, search, lookup and CRUD with local reconciliation
//! - Transient user notifications through a pluggable sink
//! - Access checks for the application's views

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Typed endpoint wrappers.
pub mod api;
/// Client wiring.
pub mod client;
/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// View access rules.
pub mod guard;
/// HTTP client wrapper.
pub mod http;
/// Session interceptors.
pub mod interceptor;
/// Wire models.
pub mod model;
/// User notifications.
pub mod notify;
/// Session context and events.
pub mod session;
/// Persisted client state.
pub mod storage;
/// Auth and book stores.
pub mod store;


pub use client::LibraryClient;
pub use config::{Cli, Command, Config};
pub use error::{ClientError, Result};
pub use session::{SessionContext, SessionEvent};
pub use storage::Storage;
