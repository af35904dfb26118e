use std::{fs, path::Path, time::Duration};

use client_core::{DEFAULT_CATALOG_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT};
use serde::Deserialize;
use storage::normalize_sqlite_url;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u32,
    pub database_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_CATALOG_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            database_url: "sqlite://./data/catalog.db".into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn database_url(&self) -> String {
        normalize_database_url(&self.database_url)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<u32>,
    database_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file (if present), then environment variables.
pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    load_settings_from(path, |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_base_url {
                    settings.api_base_url = v;
                }
                if let Some(v) = file_cfg.page_size {
                    settings.page_size = v;
                }
                if let Some(v) = file_cfg.database_url {
                    settings.database_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = v;
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable config file");
            }
        }
    }

    if let Some(v) = env("CATALOG_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__PAGE_SIZE") {
        match v.parse::<u32>() {
            Ok(parsed) => settings.page_size = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__PAGE_SIZE"),
        }
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    settings
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    normalize_sqlite_url(raw_database_url).unwrap_or_else(|| Settings::default().database_url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
