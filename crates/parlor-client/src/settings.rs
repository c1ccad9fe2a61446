use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use parlor_types::MESSAGES_COLLECTION;

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: Option<PathBuf>,
    pub collection: String,
    pub media_endpoint: Option<String>,
    pub blob_bucket: String,
    pub blob_base_url: String,
    pub config_url: Option<String>,
    pub developer_mode: bool,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let developer_mode = match non_empty("PARLOR_DEVELOPER_MODE") {
            None => false,
            Some(v) => parse_bool(&v).with_context(|| format!("PARLOR_DEVELOPER_MODE={}", v))?,
        };

        Ok(Self {
            db_path: non_empty("PARLOR_DB_PATH").map(PathBuf::from),
            collection: non_empty("PARLOR_COLLECTION").unwrap_or_else(|| MESSAGES_COLLECTION.into()),
            media_endpoint: non_empty("PARLOR_MEDIA_ENDPOINT"),
            blob_bucket: non_empty("PARLOR_BLOB_BUCKET").unwrap_or_else(|| "parlor-local".into()),
            blob_base_url: non_empty("PARLOR_BLOB_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080/blobs".into()),
            config_url: non_empty("PARLOR_CONFIG_URL"),
            developer_mode,
            username: non_empty("PARLOR_USERNAME"),
            photo_url: non_empty("PARLOR_PHOTO_URL"),
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: {}", other),
    }
}
