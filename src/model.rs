//! Wire types shared by the API clients and stores.

/// Accounts and login payloads.
pub mod auth;
/// Books, queries and pages.
pub mod book;

pub use auth::{LoginForm, LoginResponse, RegisterForm, RegisterResponse, Role, User, UserStatus};
pub use book::{
    Book, BookForm, BookPage, BookPatch, BookQuery, BookReply, BookStatus, SortDir,
};
