use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::model::{LocationRecord, LocationsResponse};

use super::LocationSource;

#[derive(Debug, Clone)]
pub struct HttpLocationSource {
    endpoint: Url,
    http: Client,
}

impl HttpLocationSource {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint, http: Client::new() }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LocationSource for HttpLocationSource {
    async fn fetch_all(&self) -> Result<Vec<LocationRecord>> {
        debug!(endpoint = %self.endpoint, "fetching location records");

        let res = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", self.endpoint))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read location response body")?;

        let records = parse_response(status, &body)?;
        debug!(count = records.len(), "fetched location records");
        Ok(records)
    }
}

/// Turn a raw HTTP status and body into the record list.
pub(crate) fn parse_response(status: StatusCode, body: &str) -> Result<Vec<LocationRecord>> {
    if !status.is_success() {
        return Err(anyhow!(
            "Location request failed with status {}: {}",
            status,
            truncate_body(body),
        ));
    }

    let parsed: LocationsResponse =
        serde_json::from_str(body).context("Failed to parse location JSON")?;

    Ok(parsed.data)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
