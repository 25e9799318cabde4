use crate::{Config, model::LocationRecord, source::http::HttpLocationSource};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod http;

/// Somewhere the full list of location records can be fetched from.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn fetch_all(&self) -> anyhow::Result<Vec<LocationRecord>>;
}

/// Construct the HTTP source for the configured endpoint, or `endpoint_override` when given.
pub fn source_from_config(
    config: &Config,
    endpoint_override: Option<&str>,
) -> anyhow::Result<Box<dyn LocationSource>> {
    let endpoint = endpoint_override.unwrap_or_else(|| config.endpoint());

    let url = reqwest::Url::parse(endpoint).map_err(|e| {
        anyhow::anyhow!(
            "Invalid endpoint '{endpoint}': {e}.\n\
             Hint: run `gpsmap configure` or pass --endpoint <URL>."
        )
    })?;

    Ok(Box::new(HttpLocationSource::new(url)))
}
