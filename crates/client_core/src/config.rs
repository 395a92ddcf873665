use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::DEFAULT_FIRST_QUESTION;
use tracing::warn;
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_CONFIG_FILE: &str = "guesser.toml";
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub notice_ttl_secs: u64,
    pub first_question: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.into(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            notice_ttl_secs: 3,
            first_question: DEFAULT_FIRST_QUESTION.into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    service_url: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    notice_ttl_secs: Option<u64>,
    first_question: Option<String>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Defaults, then the toml file at `path` if present, then environment overrides.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), %err, "ignoring invalid config file"),
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable config file"),
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.service_url {
        settings.service_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.connect_timeout_secs {
        settings.connect_timeout_secs = v;
    }
    if let Some(v) = file_cfg.notice_ttl_secs {
        settings.notice_ttl_secs = v;
    }
    if let Some(v) = file_cfg.first_question.filter(|q| !q.trim().is_empty()) {
        settings.first_question = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("GUESSER_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = lookup("APP__SERVICE_URL") {
        settings.service_url = v;
    }

    for (key, slot) in [
        ("APP__REQUEST_TIMEOUT_SECS", &mut settings.request_timeout_secs),
        ("APP__CONNECT_TIMEOUT_SECS", &mut settings.connect_timeout_secs),
        ("APP__NOTICE_TTL_SECS", &mut settings.notice_ttl_secs),
    ] {
        if let Some(v) = lookup(key) {
            match v.trim().parse::<u64>() {
                Ok(parsed) => *slot = parsed,
                Err(_) => warn!(key, value = %v, "ignoring non-numeric override"),
            }
        }
    }
}

/// Canonical base URL: trimmed, scheme defaulted to `http`, no trailing slash.
pub fn normalize_service_url(raw: &str) -> Result<String, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_SERVICE_URL.to_string());
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let parsed = Url::parse(&candidate)
        .map_err(|err| ClientError::Config(format!("invalid service url '{raw}': {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "unsupported scheme '{}' in service url '{raw}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(ClientError::Config(format!(
            "service url '{raw}' has no host"
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
