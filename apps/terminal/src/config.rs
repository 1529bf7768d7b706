use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub ws_base: String,
    /// When set, the host of both bases must match this value.
    pub allowed_host: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:3030".into(),
            ws_base: "ws://127.0.0.1:3031".into(),
            allowed_host: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("chat.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_base") {
                settings.api_base = v.clone();
            }
            if let Some(v) = file_cfg.get("ws_base") {
                settings.ws_base = v.clone();
            }
            if let Some(v) = file_cfg.get("allowed_host") {
                settings.allowed_host = Some(v.clone());
            }
        }
    }

    if let Ok(v) = std::env::var("CHAT_API_BASE") {
        settings.api_base = v;
    }
    if let Ok(v) = std::env::var("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Ok(v) = std::env::var("CHAT_WS_BASE") {
        settings.ws_base = v;
    }
    if let Ok(v) = std::env::var("APP__WS_BASE") {
        settings.ws_base = v;
    }

    if let Ok(v) = std::env::var("CHAT_ALLOWED_HOST") {
        settings.allowed_host = Some(v);
    }
    if let Ok(v) = std::env::var("APP__ALLOWED_HOST") {
        settings.allowed_host = Some(v);
    }

    settings
}

pub fn validate_settings(settings: &Settings) -> anyhow::Result<()> {
    let api = Url::parse(&settings.api_base)
        .with_context(|| format!("invalid api_base '{}'", settings.api_base))?;
    let ws = Url::parse(&settings.ws_base)
        .with_context(|| format!("invalid ws_base '{}'", settings.ws_base))?;

    if !matches!(api.scheme(), "http" | "https") {
        bail!("api_base must use http or https, got '{}'", api.scheme());
    }
    if !matches!(ws.scheme(), "ws" | "wss") {
        bail!("ws_base must use ws or wss, got '{}'", ws.scheme());
    }

    if let Some(host) = &settings.allowed_host {
        for (label, url) in [("api_base", &api), ("ws_base", &ws)] {
            if url.host_str() != Some(host.as_str()) {
                bail!(
                    "{label} host '{}' is not the allowed host '{host}'",
                    url.host_str().unwrap_or(""),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let settings = Settings::default();
        validate_settings(&settings).expect("defaults are valid");
    }

    #[test]
    fn rejects_wrong_schemes() {
        let mut settings = Settings::default();
        settings.ws_base = "http://127.0.0.1:3031".into();
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.api_base = "ws://127.0.0.1:3030".into();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn allowed_host_must_match_both_bases() {
        let settings = Settings {
            api_base: "http://chat.example.com/api".into(),
            ws_base: "ws://chat.example.com/ws".into(),
            allowed_host: Some("chat.example.com".into()),
        };
        validate_settings(&settings).expect("matching host is valid");

        let settings = Settings {
            api_base: "http://chat.example.com/api".into(),
            ws_base: "ws://other.example.com/ws".into(),
            allowed_host: Some("chat.example.com".into()),
        };
        assert!(validate_settings(&settings).is_err());
    }
}
