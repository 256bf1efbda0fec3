use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bot_token: String,
    /// Seconds between scrape cycles.
    pub scrape_interval_secs: u64,
    pub max_concurrent_groups: usize,
    /// Search result pages fetched per group per cycle.
    pub fetch_page_limit: usize,
    pub fallback_location: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bot_token: env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            scrape_interval_secs: env::var("SCRAPE_INTERVAL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .context("SCRAPE_INTERVAL_SECS must be a valid number")?,
            max_concurrent_groups: env::var("MAX_CONCURRENT_GROUPS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_CONCURRENT_GROUPS must be a valid number")?,
            fetch_page_limit: env::var("FETCH_PAGE_LIMIT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("FETCH_PAGE_LIMIT must be a valid number")?,
            fallback_location: env::var("FALLBACK_LOCATION")
                .unwrap_or_else(|_| "Tashkent".to_string()),
        })
    }
}
