use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where finished reviews are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Redis { url: String },
    /// Process-local; lost on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub store: StoreBackend,
    pub pdfium_library_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let store = match lookup("STORE_BACKEND").as_deref().unwrap_or("redis") {
            "redis" => StoreBackend::Redis {
                url: require("REDIS_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => bail!("STORE_BACKEND must be 'redis' or 'memory', got '{other}'"),
        };

        Ok(Config {
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            store,
            pdfium_library_path: lookup("PDFIUM_LIBRARY_PATH").map(PathBuf::from),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
