//! Account and login payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Librarian with write access to the catalog.
    Admin,
    /// Regular member.
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Reader => write!(f, "READER"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "READER" => Ok(Role::Reader),
            other => Err(format!("Role must be ADMIN or READER, got '{}'", other)),
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    /// Account may log in.
    Active,
    /// Account has been disabled.
    Inactive,
}

/// User account as seen by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Username for login.
    pub username: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Account role.
    pub role: Role,
    /// Account status, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// Credentials submitted to `/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
    /// Role the user claims to log in as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Body returned by `/auth/login` and `/auth/refresh`.
///
/// Every field is optional on the wire; the session store decides whether
/// the response is complete enough to log in with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Token type, normally `Bearer`.
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    /// Logged in user.
    #[serde(default)]
    pub user: Option<User>,
}

/// Account creation request.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterForm {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Requested role; the server defaults to READER.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Account creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    /// New user ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Assigned role.
    pub role: Role,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Confirmation message.
    #[serde(default)]
    pub message: Option<String>,
}
