use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use parlor_feed::{MediaResolutionError, MediaResolver};
use parlor_types::models::ImageRef;

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    url: String,
}

/// Resolves references against a download-URL service:
/// `GET {endpoint}/resolve?ref=<reference>` answering `{"url": "..."}`.
///
/// Results are not cached; every call is one request.
#[derive(Clone)]
pub struct HttpMediaResolver {
    client: Client,
    endpoint: String,
}

impl HttpMediaResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn transport(reference: &ImageRef, reason: impl ToString) -> MediaResolutionError {
        MediaResolutionError::Transport {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl MediaResolver for HttpMediaResolver {
    async fn resolve(&self, reference: &ImageRef) -> Result<String, MediaResolutionError> {
        let resp = self
            .client
            .get(format!("{}/resolve", self.endpoint))
            .query(&[("ref", reference.as_str())])
            .send()
            .await
            .map_err(|e| Self::transport(reference, format!("Resolve request failed: {}", e)))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MediaResolutionError::NotFound(reference.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Resolve of {} failed ({}): {}", reference, status, body);
            return Err(Self::transport(reference, format!("HTTP {}: {}", status, body)));
        }

        let body: ResolveResponse = resp
            .json()
            .await
            .map_err(|e| Self::transport(reference, format!("Malformed resolve response: {}", e)))?;

        debug!("Resolved {} to {}", reference, body.url);
        Ok(body.url)
    }
}
