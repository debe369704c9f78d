//! Runtime bring-up errors.

use avatar_config::ProfileError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Asset not found: {}", .0.display())]
    AssetNotFound(PathBuf),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Init failed: {0}")]
    InitFailed(String),

    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("Bring-up cancelled")]
    Cancelled,

    #[error("No runtime available: {last_error}")]
    NoRuntimeAvailable { last_error: Box<RuntimeError> },

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

impl RuntimeError {
    /// Failures of the local path that trigger the remote fallback.
    pub fn is_local_failure(&self) -> bool {
        matches!(
            self,
            RuntimeError::AssetNotFound(_) | RuntimeError::AuthFailed(_) | RuntimeError::InitFailed(_)
        )
    }

    /// Root error once fallback is exhausted.
    pub fn last_error(&self) -> &RuntimeError {
        match self {
            RuntimeError::NoRuntimeAvailable { last_error } => last_error.last_error(),
            other => other,
        }
    }
}
