use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::helpers;
use crate::listing_structs::{IngestBatch, NormalizedRecord};

/// The remote ingestion service. Returns the response body as sent.
#[async_trait]
pub trait IngestSink: Send + Sync {
    async fn post_batch(&self, batch: &IngestBatch<'_>) -> Result<Value>;
}

pub struct IngestClient {
    client: Client,
    url: String,
    secret: String,
    timeout: Duration,
}

impl IngestClient {
    pub fn new(client: Client, url: String, secret: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            secret,
            timeout,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.ingest_url.clone(),
            config.ingest_secret.clone(),
            config.push_timeout,
        )
    }
}

#[async_trait]
impl IngestSink for IngestClient {
    async fn post_batch(&self, batch: &IngestBatch<'_>) -> Result<Value> {
        info!("Pushing {} items to {}", batch.items.len(), self.url);
        let request = helpers::authed(self.client.post(&self.url), &self.secret, self.timeout).json(batch);
        helpers::send_json(request).await
    }
}

/// Sends one batch. An empty batch is answered locally with zero counts.
pub async fn push_items(sink: &dyn IngestSink, items: &[NormalizedRecord], source: &str) -> Result<Value> {
    if items.is_empty() {
        return Ok(json!({ "received": 0, "inserted": 0, "updated": 0 }));
    }

    sink.post_batch(&IngestBatch { source, items }).await
}
