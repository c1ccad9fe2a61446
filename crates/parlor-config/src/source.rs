use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

pub type ConfigValues = HashMap<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config fetch failed: {0}")]
    Transport(String),
    #[error("Malformed config: {0}")]
    Malformed(String),
}

/// Where remote values come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self) -> Result<ConfigValues, ConfigError>;
}

/// Fixed values, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    values: ConfigValues,
}

impl StaticConfigSource {
    pub fn new(values: ConfigValues) -> Self {
        Self { values }
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn fetch(&self) -> Result<ConfigValues, ConfigError> {
        Ok(self.values.clone())
    }
}

/// Fetches a flat JSON object of key/value pairs from `url`.
#[derive(Clone)]
pub struct HttpConfigSource {
    client: Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self) -> Result<ConfigValues, ConfigError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ConfigError::Transport(format!("HTTP {}", resp.status())));
        }

        match resp.json::<Value>().await {
            Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
            Ok(other) => Err(ConfigError::Malformed(format!("expected an object, got {}", other))),
            Err(e) => Err(ConfigError::Malformed(e.to_string())),
        }
    }
}
