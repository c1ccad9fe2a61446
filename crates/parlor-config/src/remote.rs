use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use parlor_types::models::DEFAULT_MESSAGE_LENGTH_LIMIT;

use crate::MESSAGE_LENGTH_KEY;
use crate::source::{ConfigError, ConfigSource, ConfigValues};

#[derive(Debug, Clone)]
pub struct ConfigSettings {
    /// Skip the fetch cache entirely. Not for release builds.
    pub developer_mode: bool,
    pub cache_expiration: Duration,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            developer_mode: false,
            cache_expiration: Duration::from_secs(3600),
        }
    }
}

impl ConfigSettings {
    pub fn effective_expiration(&self) -> Duration {
        if self.developer_mode {
            Duration::ZERO
        } else {
            self.cache_expiration
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// New values were downloaded and wait for activation.
    Fetched,
    /// The last fetch is still fresh; nothing was downloaded.
    Cached,
}

/// Remote feature values layered over in-code defaults.
///
/// Fetched values only take effect after `activate_fetched`, so a screen
/// never sees its configuration change halfway through.
pub struct RemoteConfig {
    source: Arc<dyn ConfigSource>,
    settings: ConfigSettings,
    defaults: ConfigValues,
    pending: Option<ConfigValues>,
    active: ConfigValues,
    last_fetch: Option<DateTime<Utc>>,
}

impl RemoteConfig {
    pub fn new(source: Arc<dyn ConfigSource>, settings: ConfigSettings) -> Self {
        let mut defaults = ConfigValues::new();
        defaults.insert(
            MESSAGE_LENGTH_KEY.to_string(),
            Value::from(DEFAULT_MESSAGE_LENGTH_LIMIT as u64),
        );
        Self {
            source,
            settings,
            defaults,
            pending: None,
            active: ConfigValues::new(),
            last_fetch: None,
        }
    }

    pub fn settings(&self) -> &ConfigSettings {
        &self.settings
    }

    /// Values used whenever a key was never fetched or can't be read.
    pub fn set_defaults(&mut self, defaults: ConfigValues) {
        self.defaults.extend(defaults);
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub async fn fetch(&mut self) -> Result<FetchStatus, ConfigError> {
        self.fetch_at(Utc::now()).await
    }

    pub async fn fetch_at(&mut self, now: DateTime<Utc>) -> Result<FetchStatus, ConfigError> {
        let expiration = self.settings.effective_expiration();
        if let Some(last) = self.last_fetch {
            let age = (now - last).to_std().unwrap_or(Duration::ZERO);
            if age < expiration {
                debug!("Config fetched {:?} ago, using cache", age);
                return Ok(FetchStatus::Cached);
            }
        }

        let values = self.source.fetch().await?;
        debug!("Fetched {} config values", values.len());
        self.pending = Some(values);
        self.last_fetch = Some(now);
        Ok(FetchStatus::Fetched)
    }

    /// Make the last fetched values visible. Returns false when nothing new
    /// was waiting.
    pub fn activate_fetched(&mut self) -> bool {
        match self.pending.take() {
            Some(values) => {
                self.active = values;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.active.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.active
            .get(key)
            .and_then(as_i64)
            .or_else(|| self.defaults.get(key).and_then(as_i64))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.active
            .get(key)
            .and_then(as_bool)
            .or_else(|| self.defaults.get(key).and_then(as_bool))
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Limit the composer should apply. Non-positive values fall back to
    /// the default.
    pub fn message_length_limit(&self) -> usize {
        self.get_i64(MESSAGE_LENGTH_KEY)
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MESSAGE_LENGTH_LIMIT)
    }

    /// Fetch, activate, and return the message length limit. A failed fetch
    /// keeps whatever was active before, or the defaults.
    pub async fn fetch_and_activate(&mut self) -> usize {
        match self.fetch().await {
            Ok(_) => {
                self.activate_fetched();
            }
            Err(e) => warn!("Error fetching config: {}", e),
        }
        let limit = self.message_length_limit();
        info!("Message length limit is {}", limit);
        limit
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
