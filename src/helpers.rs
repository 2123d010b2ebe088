use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::INGEST_KEY_HEADER;
use crate::error::{Error, Result};

/// Attaches the shared secret and a per-call timeout.
pub(crate) fn authed(request: RequestBuilder, secret: &str, timeout: Duration) -> RequestBuilder {
    request.header(INGEST_KEY_HEADER, secret).timeout(timeout)
}

/// Sends the request and decodes a JSON body, failing on any non-success status.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    info!("Response Code: {}", response.status());

    let response = check_status(response).await?;
    let body = response.text().await?;

    Ok(serde_json::from_str(&body)?)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

pub fn http_client() -> Result<Client> {
    Ok(Client::builder().build()?)
}
