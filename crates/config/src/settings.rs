//! Session settings resolved once from a key/value source.

use crate::error::ProfileError;
use crate::spec::{Compression, LoadingMode, ProfileSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const PROFILE_KEY: &str = "AVATAR_PROFILE";
pub const ADAPTIVE_KEY: &str = "AVATAR_ADAPTIVE";
pub const MODEL_PATH_KEY: &str = "BITHUMAN_MODEL_PATH";
pub const API_SECRET_KEY: &str = "BITHUMAN_API_SECRET";
pub const AVATAR_ID_KEY: &str = "BITHUMAN_AVATAR_ID";

/// Field-level overrides applied on top of a named profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(default)]
    pub output_width_px: Option<u32>,
    #[serde(default)]
    pub compression: Option<Compression>,
    #[serde(default)]
    pub loading_mode: Option<LoadingMode>,
    #[serde(default)]
    pub idle_frame_handling: Option<bool>,
    #[serde(default)]
    pub thread_hint: Option<i32>,
    #[serde(default)]
    pub output_buffer_depth: Option<u32>,
    #[serde(default)]
    pub input_buffer_depth: Option<u32>,
}

impl ProfileOverrides {
    pub fn is_empty(&self) -> bool {
        *self == ProfileOverrides::default()
    }

    /// Apply the overrides and re-check the profile invariants.
    pub fn apply(&self, mut spec: ProfileSpec) -> Result<ProfileSpec, ProfileError> {
        if let Some(width) = self.output_width_px {
            spec.output_width_px = width;
        }
        if let Some(compression) = self.compression {
            spec.compression = compression;
        }
        if let Some(mode) = self.loading_mode {
            spec.loading_mode = mode;
        }
        if let Some(idle) = self.idle_frame_handling {
            spec.idle_frame_handling = idle;
        }
        if let Some(threads) = self.thread_hint {
            spec.thread_hint = Some(threads);
        }
        if let Some(depth) = self.output_buffer_depth {
            spec.buffers.output_depth = depth;
        }
        if let Some(depth) = self.input_buffer_depth {
            spec.buffers.input_depth = depth;
        }
        spec.validate()?;
        Ok(spec)
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ProfileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            output_width_px: parse_with(lookup, "OUTPUT_WIDTH", |v| v.parse().ok())?,
            compression: parse_with(lookup, "COMPRESS_METHOD", Compression::parse_env)?,
            loading_mode: parse_with(lookup, "LOADING_MODE", LoadingMode::parse_env)?,
            idle_frame_handling: parse_with(lookup, "PROCESS_IDLE_VIDEO", parse_flag)?,
            thread_hint: parse_with(lookup, "AVATAR_NUM_THREADS", |v| v.parse().ok())?,
            output_buffer_depth: parse_with(lookup, "AVATAR_OUTPUT_BUFFER", |v| v.parse().ok())?,
            input_buffer_depth: parse_with(lookup, "AVATAR_INPUT_BUFFER", |v| v.parse().ok())?,
        })
    }
}

/// Everything a session reads from its environment, captured once.
#[derive(Clone, Default, PartialEq)]
pub struct SessionSettings {
    pub profile: Option<String>,
    pub adaptive: bool,
    pub asset_path: Option<PathBuf>,
    pub api_secret: Option<String>,
    pub avatar_id: Option<String>,
    pub overrides: ProfileOverrides,
}

impl SessionSettings {
    /// Build settings from an arbitrary key/value source.
    ///
    /// Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProfileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            profile: non_empty(PROFILE_KEY).map(|v| v.trim().to_string()),
            adaptive: parse_with(&lookup, ADAPTIVE_KEY, parse_flag)?.unwrap_or(false),
            asset_path: non_empty(MODEL_PATH_KEY).map(PathBuf::from),
            api_secret: non_empty(API_SECRET_KEY),
            avatar_id: non_empty(AVATAR_ID_KEY),
            overrides: ProfileOverrides::from_lookup(&lookup)?,
        })
    }

    pub fn from_env() -> Result<Self, ProfileError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("profile", &self.profile)
            .field("adaptive", &self.adaptive)
            .field("asset_path", &self.asset_path)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("avatar_id", &self.avatar_id)
            .field("overrides", &self.overrides)
            .finish()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_with<F, T, P>(lookup: &F, key: &str, parse: P) -> Result<Option<T>, ProfileError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse(raw.trim())
            .map(Some)
            .ok_or_else(|| ProfileError::InvalidSetting {
                key: key.to_string(),
                value: raw,
            }),
    }
}
