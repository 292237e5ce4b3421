use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Command line client for the library management service.
#[derive(Parser, Debug, Clone)]
#[command(name = "libris")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "LIBRIS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(long, env = "LIBRIS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Log in and persist the session.
    Login {
        /// Username.
        username: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// Role to log in as (ADMIN or READER).
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Clear the persisted session.
    Logout,

    /// Create a new account.
    Register {
        /// Username.
        username: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// Email address.
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show the logged in user as reported by the server.
    Whoami,

    /// Exchange the current token for a fresh one.
    Refresh,

    /// Book catalog commands.
    Books {
        /// Book subcommand action.
        #[command(subcommand)]
        action: BookCommand,
    },
}

/// Book subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BookCommand {
    /// List books page by page.
    List {
        /// Page index (0-based).
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        size: Option<u32>,
        /// Field to sort by.
        #[arg(long)]
        sort_by: Option<String>,
        /// Sort in descending order.
        #[arg(long)]
        desc: bool,
    },

    /// Show a single book.
    Get {
        /// Book ID.
        id: i64,
    },

    /// Look a book up by ISBN.
    Isbn {
        /// ISBN.
        isbn: String,
    },

    /// Create a book from a JSON document.
    Create {
        /// JSON body (camelCase fields).
        #[arg(long)]
        data: String,
    },

    /// Update a book with a partial JSON document.
    Update {
        /// Book ID.
        id: i64,
        /// JSON body (camelCase fields).
        #[arg(long)]
        data: String,
    },

    /// Delete a book.
    Delete {
        /// Book ID.
        id: i64,
    },

    /// Search books by any combination of fields.
    Search {
        /// Title contains.
        #[arg(long)]
        title: Option<String>,
        /// Author contains.
        #[arg(long)]
        author: Option<String>,
        /// Publisher contains.
        #[arg(long)]
        publisher: Option<String>,
        /// Exact ISBN.
        #[arg(long)]
        isbn: Option<String>,
        /// Page index (0-based).
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        size: Option<u32>,
    },

    /// Print the total number of books.
    Count,
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Persisted state configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL every API path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ServerConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Persisted state configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite file holding cookies and stored items.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("libris").join("state.db"))
        .unwrap_or_else(|| PathBuf::from("data/state.db"))
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of the persisted token cookie in days.
    #[serde(default = "default_cookie_days")]
    pub cookie_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_days: default_cookie_days(),
        }
    }
}

fn default_cookie_days() -> u32 {
    7
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::ClientError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::ClientError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("libris.toml"),
            dirs::config_dir()
                .map(|p| p.join("libris").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/libris/config.toml"),
        ];

        candidates
            .into_iter()
            .find(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# libris configuration

[server]
base_url = "http://localhost:8080/api"
# Request timeout in seconds
timeout_seconds = 10

[storage]
# path = "/home/me/.local/share/libris/state.db"

[session]
# Days before the persisted token cookie expires
cookie_days = 7
"#
        .to_string()
    }
}
