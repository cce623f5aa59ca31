//! Runtime configuration loaded from environment variables.
//!
//! Command-line flags override whatever is set here.

use std::path::PathBuf;

use crate::models::CategoryDeletePolicy;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct Config {
    /// Bind address (from PORTFOLIO_HOST)
    pub host: String,
    /// HTTP port (from PORTFOLIO_PORT)
    pub port: u16,
    /// SQLite file (from PORTFOLIO_DB). `None` means the platform data directory.
    pub database: Option<PathBuf>,
    /// Handling of projects whose category is deleted (from PORTFOLIO_CATEGORY_DELETE)
    pub category_delete: CategoryDeletePolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("PORTFOLIO_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = lookup("PORTFOLIO_PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let database = lookup("PORTFOLIO_DB")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let category_delete = match lookup("PORTFOLIO_CATEGORY_DELETE") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using {}", e, CategoryDeletePolicy::default());
                CategoryDeletePolicy::default()
            }),
            None => CategoryDeletePolicy::default(),
        };

        Self {
            host,
            port,
            database,
            category_delete,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
