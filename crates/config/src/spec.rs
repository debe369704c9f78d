//! Resolved profile parameters.

use crate::buffer::{characterize, BufferProfile};
use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Output widths the synthesis engine can render.
pub const SUPPORTED_WIDTHS: [u32; 4] = [720, 960, 1280, 1920];

/// Closed set of deployment profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileName {
    UltraLowLatency,
    Balanced,
    HighQuality,
    Constrained,
    Local,
}

impl ProfileName {
    pub const ALL: [ProfileName; 5] = [
        ProfileName::UltraLowLatency,
        ProfileName::Balanced,
        ProfileName::HighQuality,
        ProfileName::Constrained,
        ProfileName::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileName::UltraLowLatency => "ultra-low-latency",
            ProfileName::Balanced => "balanced",
            ProfileName::HighQuality => "high-quality",
            ProfileName::Constrained => "constrained",
            ProfileName::Local => "local",
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileName {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ProfileName::ALL
            .into_iter()
            .find(|name| name.as_str() == trimmed)
            .ok_or_else(|| ProfileError::UnknownProfile(trimmed.to_string()))
    }
}

/// Synthesis model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Lower latency, less expressive.
    Fast,
    /// Dynamic expressions at higher latency and CPU cost.
    Expressive,
}

impl ModelVariant {
    /// Model identifier understood by the engine.
    pub fn engine_model(&self) -> &'static str {
        match self {
            ModelVariant::Fast => "essence",
            ModelVariant::Expressive => "expression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Lossy,
}

impl Compression {
    pub fn env_value(&self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Lossy => "JPEG",
        }
    }

    pub fn parse_env(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NONE" => Some(Compression::None),
            "JPEG" | "LOSSY" => Some(Compression::Lossy),
            _ => None,
        }
    }
}

/// When backing assets are loaded relative to session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadingMode {
    Sync,
    Async,
    OnDemand,
}

impl LoadingMode {
    pub fn env_value(&self) -> &'static str {
        match self {
            LoadingMode::Sync => "SYNC",
            LoadingMode::Async => "ASYNC",
            LoadingMode::OnDemand => "ON_DEMAND",
        }
    }

    pub fn parse_env(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SYNC" => Some(LoadingMode::Sync),
            "ASYNC" => Some(LoadingMode::Async),
            "ON_DEMAND" => Some(LoadingMode::OnDemand),
            _ => None,
        }
    }
}

/// Connection parameters for the remote engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    pub interval_seconds: f64,
    pub timeout_seconds: f64,
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.max_attempts == 0 {
            return Err(ProfileError::InvalidRetryPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if Duration::try_from_secs_f64(self.interval_seconds).is_err() {
            return Err(ProfileError::InvalidRetryPolicy(format!(
                "interval_seconds must be a non-negative duration, got {}",
                self.interval_seconds
            )));
        }
        let timeout = Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or_default();
        if timeout.is_zero() {
            return Err(ProfileError::InvalidRetryPolicy(format!(
                "timeout_seconds must be positive, got {}",
                self.timeout_seconds
            )));
        }
        Ok(())
    }
}

/// Audio-in and frames-out slot counts. An input depth of 0 never drops or blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferDepths {
    pub input_depth: u32,
    pub output_depth: u32,
}

/// Immutable parameter set for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub name: ProfileName,
    pub model_variant: ModelVariant,
    pub output_width_px: u32,
    pub compression: Compression,
    pub idle_frame_handling: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_video_enabled: Option<bool>,
    pub loading_mode: LoadingMode,
    pub retry: RetrySettings,
    pub buffers: BufferDepths,
    /// -1 auto-detect, 0 single-threaded, >0 explicit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_hint: Option<i32>,
    pub frame_rate_hz: u32,
}

impl ProfileSpec {
    /// Check the invariants every resolved spec must hold.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !SUPPORTED_WIDTHS.contains(&self.output_width_px) {
            return Err(ProfileError::UnsupportedResolution(self.output_width_px));
        }
        if self.frame_rate_hz == 0 {
            return Err(ProfileError::InvalidSetting {
                key: "frame_rate_hz".to_string(),
                value: "0".to_string(),
            });
        }
        if let Some(hint) = self.thread_hint {
            if hint < -1 {
                return Err(ProfileError::InvalidSetting {
                    key: "thread_hint".to_string(),
                    value: hint.to_string(),
                });
            }
        }
        self.retry.validate()
    }

    pub fn buffer_profile(&self) -> BufferProfile {
        characterize(
            self.buffers.input_depth,
            self.buffers.output_depth,
            self.frame_rate_hz,
        )
    }

    /// Engine environment keys for this profile.
    pub fn env_exports(&self) -> Vec<(&'static str, String)> {
        let mut exports = vec![
            ("OUTPUT_WIDTH", self.output_width_px.to_string()),
            ("COMPRESS_METHOD", self.compression.env_value().to_string()),
            ("LOADING_MODE", self.loading_mode.env_value().to_string()),
            ("PROCESS_IDLE_VIDEO", env_bool(self.idle_frame_handling)),
        ];
        if let Some(enabled) = self.idle_video_enabled {
            exports.push(("LIVA_IDEL_VIDEO_ENABLED", env_bool(enabled)));
        }
        exports
    }
}

fn env_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_round_trip() {
        for name in ProfileName::ALL {
            assert_eq!(name.as_str().parse::<ProfileName>().unwrap(), name);
        }
    }

    #[test]
    fn test_profile_name_rejects_unknown() {
        match "Balanced".parse::<ProfileName>() {
            Err(ProfileError::UnknownProfile(name)) => assert_eq!(name, "Balanced"),
            other => panic!("Expected UnknownProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_profile_name_serializes_kebab_case() {
        let json = serde_json::to_string(&ProfileName::UltraLowLatency).unwrap();
        assert_eq!(json, r#""ultra-low-latency""#);
    }

    #[test]
    fn test_retry_settings_validation() {
        let ok = RetrySettings {
            max_attempts: 1,
            interval_seconds: 0.0,
            timeout_seconds: 0.1,
        };
        assert!(ok.validate().is_ok());

        let zero_attempts = RetrySettings { max_attempts: 0, ..ok };
        assert!(matches!(
            zero_attempts.validate(),
            Err(ProfileError::InvalidRetryPolicy(_))
        ));

        let zero_timeout = RetrySettings { timeout_seconds: 0.0, ..ok };
        assert!(zero_timeout.validate().is_err());

        let negative_interval = RetrySettings { interval_seconds: -1.0, ..ok };
        assert!(negative_interval.validate().is_err());
    }

    #[test]
    fn test_retry_settings_reject_unrepresentable_durations() {
        let ok = RetrySettings {
            max_attempts: 3,
            interval_seconds: 0.5,
            timeout_seconds: 10.0,
        };

        for timeout_seconds in [1e20, f64::INFINITY, f64::NAN, 1e-12] {
            let settings = RetrySettings { timeout_seconds, ..ok };
            assert!(
                matches!(settings.validate(), Err(ProfileError::InvalidRetryPolicy(_))),
                "timeout {} accepted",
                timeout_seconds
            );
        }

        let huge_interval = RetrySettings { interval_seconds: 1e20, ..ok };
        assert!(matches!(
            huge_interval.validate(),
            Err(ProfileError::InvalidRetryPolicy(_))
        ));
    }

    #[test]
    fn test_env_value_parsing() {
        assert_eq!(Compression::parse_env("jpeg"), Some(Compression::Lossy));
        assert_eq!(Compression::parse_env("NONE"), Some(Compression::None));
        assert_eq!(Compression::parse_env("png"), None);
        assert_eq!(LoadingMode::parse_env("on-demand"), Some(LoadingMode::OnDemand));
        assert_eq!(LoadingMode::parse_env("SYNC"), Some(LoadingMode::Sync));
        assert_eq!(LoadingMode::parse_env("lazy"), None);
    }

    #[test]
    fn test_model_variant_engine_names() {
        assert_eq!(ModelVariant::Fast.engine_model(), "essence");
        assert_eq!(ModelVariant::Expressive.engine_model(), "expression");
    }
}
