use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalesError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Client used when `--client` is omitted.
    #[serde(default)]
    pub default_client: String,
    #[serde(default = "default_insert_chunk_size")]
    pub insert_chunk_size: usize,
    #[serde(default = "default_catalog_batch_size")]
    pub catalog_batch_size: usize,
}

fn default_insert_chunk_size() -> usize {
    500
}

fn default_catalog_batch_size() -> usize {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_client: String::new(),
            insert_chunk_size: default_insert_chunk_size(),
            catalog_batch_size: default_catalog_batch_size(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("salesmatrix")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("salesmatrix")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SalesError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

/// `--client` wins; otherwise the configured default.
pub fn client_or_default(client: Option<String>) -> Result<String> {
    client
        .or_else(|| {
            let default = load_settings().default_client;
            (!default.is_empty()).then_some(default)
        })
        .ok_or_else(|| SalesError::Other("no client given and no default client set".to_string()))
}
