//! Avatar Runtime
//!
//! Brings up exactly one synthesis runtime per session, trying a local asset
//! first and falling back to a retried remote connection.

pub mod engine;
pub mod error;
pub mod handle;
pub mod initializer;
pub mod metrics;
pub mod orchestrator;
pub mod retry;

pub use engine::{
    EngineError, EngineFailureCause, EngineHandle, EngineSession, LocalEngineParams,
    RemoteEngineParams, SynthesisEngine,
};
pub use error::RuntimeError;
pub use handle::{RuntimeHandle, RuntimeMode, ThreadCount};
pub use initializer::RuntimeInitializer;
pub use metrics::{BringUpMetrics, BringUpTimer, MetricsSnapshot};
pub use orchestrator::{
    transition, AvatarMode, BringUpEvent, BringUpReport, BringUpStage, BringUpState,
    FallbackOrchestrator,
};
pub use retry::RetryPolicy;

use avatar_config::{ProfileError, ProfileSelector, ProfileSpec, ResourceProbe};
use std::path::Path;
use std::sync::Arc;

/// Resolve a profile against the host's live resources.
///
/// Precedence is `explicit`, then `env_override`, then the capacity tier when
/// `adaptive` is set, then the default profile.
pub fn resolve_profile(
    explicit: Option<&str>,
    env_override: Option<&str>,
    adaptive: bool,
) -> Result<ProfileSpec, ProfileError> {
    ProfileSelector::new(ResourceProbe::system()).resolve(explicit, env_override, adaptive)
}

/// Bring up a runtime for `spec`, local first when an asset is given.
pub async fn bring_up_runtime(
    engine: Arc<dyn SynthesisEngine>,
    spec: &ProfileSpec,
    asset_path: Option<&Path>,
    secret: Option<&str>,
) -> Result<RuntimeHandle, RuntimeError> {
    FallbackOrchestrator::new(RuntimeInitializer::new(engine))
        .bring_up(spec, asset_path, secret)
        .await
}

/// Like [`bring_up_runtime`], degrading to voice-only on failure.
pub async fn bring_up_or_degrade(
    engine: Arc<dyn SynthesisEngine>,
    spec: &ProfileSpec,
    asset_path: Option<&Path>,
    secret: Option<&str>,
) -> AvatarMode {
    FallbackOrchestrator::new(RuntimeInitializer::new(engine))
        .bring_up_or_degrade(spec, asset_path, secret)
        .await
}
