//! Boundary to the video-synthesis engine.

use async_trait::async_trait;
use avatar_config::{BufferDepths, Compression, LoadingMode, ModelVariant, ProfileSpec};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailureCause {
    Asset,
    Auth,
    Network,
    Other,
}

impl fmt::Display for EngineFailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EngineFailureCause::Asset => "asset",
            EngineFailureCause::Auth => "auth",
            EngineFailureCause::Network => "network",
            EngineFailureCause::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{cause} error: {message}")]
pub struct EngineError {
    pub cause: EngineFailureCause,
    pub message: String,
}

impl EngineError {
    pub fn new(cause: EngineFailureCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    pub fn asset(message: impl Into<String>) -> Self {
        Self::new(EngineFailureCause::Asset, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(EngineFailureCause::Auth, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(EngineFailureCause::Network, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(EngineFailureCause::Other, message)
    }
}

/// Parameters for an in-process engine.
#[derive(Debug, Clone, Serialize)]
pub struct LocalEngineParams {
    pub asset_path: PathBuf,
    pub thread_count: i32,
    pub buffers: BufferDepths,
}

/// Parameters for a remote engine session.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteEngineParams {
    pub model: ModelVariant,
    pub output_width_px: u32,
    pub compression: Compression,
    pub idle_frame_handling: bool,
    pub loading_mode: LoadingMode,
    pub buffers: BufferDepths,
    pub avatar_id: Option<String>,
}

impl RemoteEngineParams {
    pub fn from_spec(spec: &ProfileSpec, avatar_id: Option<String>) -> Self {
        Self {
            model: spec.model_variant,
            output_width_px: spec.output_width_px,
            compression: spec.compression,
            idle_frame_handling: spec.idle_frame_handling,
            loading_mode: spec.loading_mode,
            buffers: spec.buffers,
            avatar_id,
        }
    }
}

/// A live engine session. Dropping it without `shutdown` leaks engine-side state.
#[async_trait]
pub trait EngineSession: Send + Sync {
    fn session_id(&self) -> &str;

    async fn shutdown(&self) -> Result<(), EngineError>;
}

pub type EngineHandle = Box<dyn EngineSession>;

/// Factory for engine sessions in either mode.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    async fn create_local(
        &self,
        params: &LocalEngineParams,
        secret: &str,
    ) -> Result<EngineHandle, EngineError>;

    async fn create_remote(
        &self,
        secret: &str,
        params: &RemoteEngineParams,
    ) -> Result<EngineHandle, EngineError>;
}
