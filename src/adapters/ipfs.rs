//! Snapshot and report retrieval over HTTP.
//!
//! Manifests (`Snapshot`) are fetched from their own URL; per-epoch reports
//! are content-addressed and fetched through an IPFS gateway prefix.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::domain::{Report, Snapshot};
use crate::error::{ClaimError, FetchError, Result};

const USER_AGENT: &str = "orchard-claimer/0.1";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Source of snapshot manifests and epoch reports
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, manifest: &str) -> std::result::Result<Snapshot, FetchError>;

    async fn fetch_report(&self, content_hash: &str) -> std::result::Result<Report, FetchError>;
}

#[derive(Clone)]
pub struct HttpSnapshotFetcher {
    http: Client,
    ipfs_gateway: String,
}

impl HttpSnapshotFetcher {
    /// `ipfs_gateway` is a URL prefix the content hash is appended to,
    /// e.g. `https://ipfs.io/ipfs/`.
    pub fn new(ipfs_gateway: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ClaimError::InvalidConfig(format!("failed to build snapshot HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            ipfs_gateway: ipfs_gateway.trim().to_string(),
        })
    }

    pub fn report_url(&self, content_hash: &str) -> String {
        format!("{}{}", self.ipfs_gateway, content_hash.trim())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, FetchError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(format!("{url}: {e}")))
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotFetcher {
    async fn fetch_snapshot(&self, manifest: &str) -> std::result::Result<Snapshot, FetchError> {
        // A manifest that is literally `null` means no epochs yet
        let snapshot: Option<Snapshot> = self.get_json(manifest.trim()).await?;
        Ok(snapshot.unwrap_or_default())
    }

    async fn fetch_report(&self, content_hash: &str) -> std::result::Result<Report, FetchError> {
        self.get_json(&self.report_url(content_hash)).await
    }
}
