use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::helpers;
use crate::listing_structs::Preset;

/// Anything able to hand out the ordered preset list for a run.
#[async_trait]
pub trait PresetSource: Send + Sync {
    async fn get_presets(&self) -> Result<Vec<Preset>>;
}

#[derive(Debug, Deserialize)]
struct PresetsEnvelope {
    #[serde(default)]
    presets: Vec<Preset>,
}

/// Presets served by the configuration service as `{ "presets": [...] }`.
pub struct RemotePresets {
    client: Client,
    url: String,
    secret: String,
    timeout: Duration,
}

impl RemotePresets {
    pub fn new(client: Client, url: String, secret: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            secret,
            timeout,
        }
    }
}

#[async_trait]
impl PresetSource for RemotePresets {
    async fn get_presets(&self) -> Result<Vec<Preset>> {
        info!(url = %self.url, "Fetching presets from service");
        let request = helpers::authed(self.client.get(&self.url), &self.secret, self.timeout);
        let envelope: PresetsEnvelope = helpers::send_json(request).await?;
        Ok(envelope.presets)
    }
}

/// Presets read from a local file holding a bare JSON array.
pub struct LocalPresets {
    path: PathBuf,
}

impl LocalPresets {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl PresetSource for LocalPresets {
    async fn get_presets(&self) -> Result<Vec<Preset>> {
        info!(path = %self.path.display(), "Reading local presets");
        let file_error = |message: String| Error::PresetsFile {
            path: self.path.display().to_string(),
            message,
        };

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| file_error(e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))
    }
}

/// Picks the service when a presets URL is configured, the local file otherwise.
pub fn preset_source(config: &Config, client: &Client) -> Box<dyn PresetSource> {
    match &config.presets_url {
        Some(url) => Box::new(RemotePresets::new(
            client.clone(),
            url.clone(),
            config.ingest_secret.clone(),
            config.presets_timeout,
        )),
        None => Box::new(LocalPresets::new(&config.presets_path)),
    }
}

pub async fn load_presets(config: &Config, client: &Client) -> Result<Vec<Preset>> {
    let presets = preset_source(config, client).get_presets().await?;
    info!("Loaded {} presets", presets.len());
    Ok(presets)
}
