use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Header carrying the shared secret on every outbound call.
pub const INGEST_KEY_HEADER: &str = "X-INGEST-KEY";

/// Source tag attached to every ingestion batch.
pub const SOURCE: &str = "realtor";

/// Fallback preset list, relative to the working directory.
pub const LOCAL_PRESETS_PATH: &str = "presets.json";

/// Exit status for a run refused at startup because of missing configuration.
pub const CONFIG_EXIT_CODE: i32 = 2;

const DEFAULT_PYTHON: &str = "python3";

/// Run configuration, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub ingest_url: String,
    pub ingest_secret: String,
    pub presets_url: Option<String>,
    pub presets_path: PathBuf,
    pub python_bin: String,
    pub source: String,
    pub presets_timeout: Duration,
    pub push_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ingest_url = get("ANVIL_INGEST_URL").ok_or(Error::MissingConfig("ANVIL_INGEST_URL"))?;
        let ingest_secret = get("INGEST_SECRET").ok_or(Error::MissingConfig("INGEST_SECRET"))?;

        Ok(Self {
            ingest_url,
            ingest_secret,
            presets_url: get("ANVIL_PRESETS_URL"),
            presets_path: PathBuf::from(LOCAL_PRESETS_PATH),
            python_bin: get("HOMEHARVEST_PYTHON").unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            source: SOURCE.to_string(),
            presets_timeout: Duration::from_secs(60),
            push_timeout: Duration::from_secs(120),
        })
    }
}
