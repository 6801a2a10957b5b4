// 🌐 Snapshot Fetching - JSON documents behind a resource name
//
// The pipeline only asks for "the JSON document behind this resource".
// HttpFetcher answers over HTTP, StaticFetcher serves canned documents.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;

#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// Retrieve and parse the JSON document behind `resource`
    async fn fetch_json(&self, resource: &str) -> Result<Value, FetchError>;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tp-value/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Transport {
                resource: "<client>".to_string(),
                source,
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn fetch_json(&self, resource: &str) -> Result<Value, FetchError> {
        debug!(resource, "fetching snapshot");

        let response = self
            .client
            .get(resource)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                resource: resource.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Transport {
            resource: resource.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Serves canned documents by resource name
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, Value>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: register a document
    pub fn with_document(mut self, resource: impl Into<String>, document: Value) -> Self {
        self.documents.insert(resource.into(), document);
        self
    }
}

#[async_trait]
impl JsonFetcher for StaticFetcher {
    async fn fetch_json(&self, resource: &str) -> Result<Value, FetchError> {
        self.documents
            .get(resource)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(resource.to_string()))
    }
}
