use anyhow::{Context, Result};
use avatar_config::{ProfileName, SessionSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "avatar.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub session: SessionDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub remote_endpoint: Option<String>,
    /// Falls back to `remote_endpoint` when unset.
    pub local_endpoint: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote_endpoint: None,
            local_endpoint: None,
            request_timeout_seconds: 30,
        }
    }
}

/// File-level defaults; anything set in the environment wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub profile: Option<String>,
    pub adaptive: bool,
    pub model_path: Option<PathBuf>,
    pub avatar_id: Option<String>,
}

impl AppConfig {
    /// Load `path`, or `avatar.yaml` in the working directory if present.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, endpoint) in [
            ("engine.remote_endpoint", &self.engine.remote_endpoint),
            ("engine.local_endpoint", &self.engine.local_endpoint),
        ] {
            if let Some(url) = endpoint {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    anyhow::bail!("{} must be an http(s) URL, got '{}'", key, url);
                }
            }
        }

        if self.engine.request_timeout_seconds == 0 {
            anyhow::bail!("engine.request_timeout_seconds must be positive");
        }

        if let Some(profile) = &self.session.profile {
            profile
                .parse::<ProfileName>()
                .context("Invalid session.profile")?;
        }

        Ok(())
    }

    /// Fill gaps in environment-derived settings from the file.
    pub fn merge_into(&self, mut settings: SessionSettings) -> SessionSettings {
        if settings.profile.is_none() {
            settings.profile = self.session.profile.clone();
        }
        settings.adaptive |= self.session.adaptive;
        if settings.asset_path.is_none() {
            settings.asset_path = self.session.model_path.clone();
        }
        if settings.avatar_id.is_none() {
            settings.avatar_id = self.session.avatar_id.clone();
        }
        settings
    }
}
