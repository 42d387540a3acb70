//! REST client for the job-board backend.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::ingest::{extract_list, extract_one};
use crate::models::RecordKind;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Where list pages get their raw records from.
pub trait RecordSource {
    fn fetch_records(
        &self,
        kind: RecordKind,
        params: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<Value>, FetchError>> + Send;

    fn fetch_record(
        &self,
        kind: RecordKind,
        id: &str,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, ?params, "GET");

        let mut request = self.client.get(&url).query(params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::Status { url, status, body });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

impl RecordSource for ApiClient {
    async fn fetch_records(
        &self,
        kind: RecordKind,
        params: &[(&str, &str)],
    ) -> Result<Vec<Value>, FetchError> {
        let body = self.get_json(kind.path(), params).await?;
        Ok(extract_list(body, kind))
    }

    async fn fetch_record(&self, kind: RecordKind, id: &str) -> Result<Value, FetchError> {
        let path = format!("{}/{}", kind.path(), id);
        let body = self.get_json(&path, &[]).await?;
        Ok(extract_one(body, kind))
    }
}

/// Fetches raw records, turning any failure into an empty list.
///
/// List pages render "no results" instead of an error, so failures stop here
/// after being logged.
pub async fn load_records<S: RecordSource>(
    source: &S,
    kind: RecordKind,
    params: &[(&str, &str)],
) -> Vec<Value> {
    match source.fetch_records(kind, params).await {
        Ok(records) => {
            debug!(kind = %kind, count = records.len(), "loaded records");
            records
        }
        Err(e) => {
            warn!(kind = %kind, error = %e, "fetch failed, showing empty list");
            Vec::new()
        }
    }
}

/// Like [`load_records`] for a single record; `None` on any failure.
pub async fn load_record<S: RecordSource>(source: &S, kind: RecordKind, id: &str) -> Option<Value> {
    match source.fetch_record(kind, id).await {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(kind = %kind, id, error = %e, "fetch failed");
            None
        }
    }
}
