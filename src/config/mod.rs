//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Database path (SQLite). Set via DATABASE_PATH or DATABASE_URL.
    pub database_url: String,

    /// Upper bound for the `size` query parameter on list endpoints
    pub max_page_size: i64,

    /// How many days back the notification feed reaches
    pub notification_window_days: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = env::var("DATABASE_PATH")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "./data/daramg.db".to_string());

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            max_page_size: env::var("PAGE_SIZE_MAX")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("Invalid PAGE_SIZE_MAX")?,

            notification_window_days: env::var("NOTIFICATION_WINDOW_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid NOTIFICATION_WINDOW_DAYS")?,
        })
    }
}
