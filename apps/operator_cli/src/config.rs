use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::{
    api::{normalize_base_url, DEFAULT_REQUEST_TIMEOUT},
    render::MarkupPolicy,
    upload::{AcceptList, DEFAULT_UPLOAD_ACCEPT},
    DEFAULT_USER_ID,
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "operator.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSettings {
    pub api_base_url: String,
    pub user_id: String,
    pub request_timeout_secs: u64,
    pub upload_accept: String,
    pub markup_policy: MarkupPolicy,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            user_id: DEFAULT_USER_ID.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            upload_accept: DEFAULT_UPLOAD_ACCEPT.join(","),
            markup_policy: MarkupPolicy::default(),
        }
    }
}

impl OperatorSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn accept_list(&self) -> AcceptList {
        AcceptList::parse(&self.upload_accept)
    }
}

/// Defaults, then `path` if it exists, then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<OperatorSettings> {
    let mut settings = OperatorSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
                .with_context(|| format!("failed to parse '{}'", path.display()))?;
            apply_overrides(&mut settings, |key| file_cfg.get(key).cloned());
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    finalize(settings)
}

fn apply_overrides(settings: &mut OperatorSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("api_base_url") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("user_id") {
        settings.user_id = v;
    }
    if let Some(v) = lookup("request_timeout_secs") {
        set_timeout(settings, &v);
    }
    if let Some(v) = lookup("upload_accept") {
        settings.upload_accept = v;
    }
    if let Some(v) = lookup("markup_policy") {
        set_markup_policy(settings, &v);
    }
}

fn apply_env_overrides(settings: &mut OperatorSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ASSISTANT_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__USER_ID") {
        settings.user_id = v;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        set_timeout(settings, &v);
    }
    if let Some(v) = lookup("APP__UPLOAD_ACCEPT") {
        settings.upload_accept = v;
    }
    if let Some(v) = lookup("APP__MARKUP_POLICY") {
        set_markup_policy(settings, &v);
    }
}

fn set_timeout(settings: &mut OperatorSettings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => settings.request_timeout_secs = secs,
        _ => warn!(value = raw, "ignoring invalid request timeout"),
    }
}

fn set_markup_policy(settings: &mut OperatorSettings, raw: &str) {
    match raw.parse::<MarkupPolicy>() {
        Ok(policy) => settings.markup_policy = policy,
        Err(err) => warn!(value = raw, error = %err, "ignoring invalid markup policy"),
    }
}

pub fn finalize(mut settings: OperatorSettings) -> anyhow::Result<OperatorSettings> {
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    anyhow::ensure!(
        !settings.user_id.trim().is_empty(),
        "user id must not be empty"
    );
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
