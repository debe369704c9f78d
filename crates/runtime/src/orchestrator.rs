//! Local-first, remote-fallback bring-up.
//!
//! The orchestrator walks an explicit state machine:
//!
//! ```text
//! Start ──local asset + secret──▶ TryingLocal ──ok──▶ Ready
//!   │                                 │
//!   └──otherwise──▶ TryingRemote ◀────┘ any local failure (never retried)
//!                        │
//!                        ├──ok──▶ Ready
//!                        └──exhausted──▶ ConfigError(NoRuntimeAvailable)
//! ```
//!
//! Cancellation moves any non-terminal state to `ConfigError(Cancelled)`.
//! Effects run in [`FallbackOrchestrator`]; [`transition`] itself is pure.

use crate::error::RuntimeError;
use crate::handle::RuntimeHandle;
use crate::initializer::RuntimeInitializer;
use crate::metrics::{BringUpMetrics, BringUpTimer};
use avatar_config::ProfileSpec;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BringUpStage {
    Start,
    TryingLocal,
    TryingRemote,
    Ready,
    ConfigError,
}

impl fmt::Display for BringUpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BringUpStage::Start => "start",
            BringUpStage::TryingLocal => "trying-local",
            BringUpStage::TryingRemote => "trying-remote",
            BringUpStage::Ready => "ready",
            BringUpStage::ConfigError => "config-error",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum BringUpState {
    Start,
    TryingLocal,
    TryingRemote,
    Ready(RuntimeHandle),
    ConfigError(RuntimeError),
}

impl BringUpState {
    pub fn stage(&self) -> BringUpStage {
        match self {
            BringUpState::Start => BringUpStage::Start,
            BringUpState::TryingLocal => BringUpStage::TryingLocal,
            BringUpState::TryingRemote => BringUpStage::TryingRemote,
            BringUpState::Ready(_) => BringUpStage::Ready,
            BringUpState::ConfigError(_) => BringUpStage::ConfigError,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BringUpState::Ready(_) | BringUpState::ConfigError(_))
    }
}

/// Outcome of the work done in one state.
#[derive(Debug)]
pub enum BringUpEvent {
    LocalEligible,
    LocalIneligible,
    LocalReady(RuntimeHandle),
    LocalFailed(RuntimeError),
    RemoteReady(RuntimeHandle),
    RemoteFailed(RuntimeError),
    Cancelled,
}

/// Next state for `state` given `event`. Terminal states absorb every event.
pub fn transition(state: BringUpState, event: BringUpEvent) -> BringUpState {
    use BringUpEvent as E;
    use BringUpState as S;

    match (state, event) {
        (terminal @ (S::Ready(_) | S::ConfigError(_)), _) => terminal,
        (_, E::Cancelled) => S::ConfigError(RuntimeError::Cancelled),
        (S::Start, E::LocalEligible) => S::TryingLocal,
        (S::Start, E::LocalIneligible) => S::TryingRemote,
        (S::TryingLocal, E::LocalReady(handle)) => S::Ready(handle),
        (S::TryingLocal, E::LocalFailed(_)) => S::TryingRemote,
        (S::TryingRemote, E::RemoteReady(handle)) => S::Ready(handle),
        (S::TryingRemote, E::RemoteFailed(err @ RuntimeError::InvalidRetryPolicy(_))) => {
            S::ConfigError(err)
        }
        (S::TryingRemote, E::RemoteFailed(err)) => S::ConfigError(RuntimeError::NoRuntimeAvailable {
            last_error: Box::new(err),
        }),
        (state, _) => state,
    }
}

/// Visited stages plus the final outcome.
#[derive(Debug)]
pub struct BringUpReport {
    pub trace: Vec<BringUpStage>,
    pub outcome: Result<RuntimeHandle, RuntimeError>,
}

/// What the session continues with.
#[derive(Debug)]
pub enum AvatarMode {
    Rendering(RuntimeHandle),
    /// No runtime could be brought up; the session runs without avatar video.
    VoiceOnly { reason: RuntimeError },
}

pub struct FallbackOrchestrator {
    initializer: RuntimeInitializer,
    cancel: CancellationToken,
}

impl FallbackOrchestrator {
    pub fn new(initializer: RuntimeInitializer) -> Self {
        Self::with_cancellation(initializer, CancellationToken::new())
    }

    pub fn with_cancellation(initializer: RuntimeInitializer, cancel: CancellationToken) -> Self {
        Self {
            initializer,
            cancel,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> Arc<BringUpMetrics> {
        self.initializer.metrics()
    }

    /// Bring up exactly one runtime or fail with `NoRuntimeAvailable`.
    pub async fn bring_up(
        &self,
        spec: &ProfileSpec,
        asset_path: Option<&Path>,
        secret: Option<&str>,
    ) -> Result<RuntimeHandle, RuntimeError> {
        self.bring_up_traced(spec, asset_path, secret).await.outcome
    }

    /// Like `bring_up`, but failure degrades to voice-only instead of erroring.
    pub async fn bring_up_or_degrade(
        &self,
        spec: &ProfileSpec,
        asset_path: Option<&Path>,
        secret: Option<&str>,
    ) -> AvatarMode {
        let outcome = self.bring_up(spec, asset_path, secret).await;
        self.settle(outcome)
    }

    /// Map a bring-up outcome to the mode the session continues in.
    pub fn settle(&self, outcome: Result<RuntimeHandle, RuntimeError>) -> AvatarMode {
        match outcome {
            Ok(handle) => AvatarMode::Rendering(handle),
            Err(reason) => {
                self.metrics().inc_degraded_sessions();
                warn!(error = %reason, "Continuing without avatar rendering");
                AvatarMode::VoiceOnly { reason }
            }
        }
    }

    pub async fn bring_up_traced(
        &self,
        spec: &ProfileSpec,
        asset_path: Option<&Path>,
        secret: Option<&str>,
    ) -> BringUpReport {
        let _timer = BringUpTimer::start();
        let mut trace = Vec::new();
        let mut state = BringUpState::Start;

        info!(profile = %spec.name, "Bringing up avatar runtime");

        while !state.is_terminal() {
            trace.push(state.stage());
            let event = self.run_stage(&state, spec, asset_path, secret).await;
            let event = self.observe_cancellation(event).await;
            state = transition(state, event);
        }
        trace.push(state.stage());

        let outcome = match state {
            BringUpState::Ready(handle) => {
                info!(mode = %handle.mode(), session_id = handle.session_id(), "Avatar runtime ready");
                Ok(handle)
            }
            BringUpState::ConfigError(err) => {
                error!(error = %err, "No avatar runtime available");
                Err(err)
            }
            _ => Err(RuntimeError::InitFailed(
                "bring-up stopped in a non-terminal state".to_string(),
            )),
        };

        BringUpReport { trace, outcome }
    }

    async fn run_stage(
        &self,
        state: &BringUpState,
        spec: &ProfileSpec,
        asset_path: Option<&Path>,
        secret: Option<&str>,
    ) -> BringUpEvent {
        match state {
            BringUpState::Start => start_event(asset_path, secret),
            BringUpState::TryingLocal => {
                let (Some(path), Some(secret)) = (asset_path, secret) else {
                    return BringUpEvent::LocalFailed(RuntimeError::InitFailed(
                        "local mode entered without asset and secret".to_string(),
                    ));
                };
                let outcome = tokio::select! {
                    biased;
                    result = self.initializer.init_local(spec, path, secret) => result,
                    _ = self.cancel.cancelled() => return BringUpEvent::Cancelled,
                };
                match outcome {
                    Ok(handle) => BringUpEvent::LocalReady(handle),
                    Err(err) => {
                        warn!(
                            error = %err,
                            asset = %path.display(),
                            "Local mode failed, falling back to remote"
                        );
                        self.metrics().inc_fallbacks();
                        BringUpEvent::LocalFailed(err)
                    }
                }
            }
            BringUpState::TryingRemote => {
                match self
                    .initializer
                    .init_remote(spec, secret.unwrap_or_default(), &self.cancel)
                    .await
                {
                    Ok(handle) => BringUpEvent::RemoteReady(handle),
                    Err(RuntimeError::Cancelled) => BringUpEvent::Cancelled,
                    Err(err) => BringUpEvent::RemoteFailed(err),
                }
            }
            BringUpState::Ready(_) | BringUpState::ConfigError(_) => BringUpEvent::Cancelled,
        }
    }

    /// Swap the event for `Cancelled` once cancellation is observed,
    /// releasing any runtime the event carried.
    async fn observe_cancellation(&self, event: BringUpEvent) -> BringUpEvent {
        if !self.cancel.is_cancelled() {
            return event;
        }
        match event {
            BringUpEvent::LocalReady(handle) | BringUpEvent::RemoteReady(handle) => {
                if let Err(e) = handle.shutdown().await {
                    warn!(error = %e, "Failed to release runtime after cancellation");
                }
            }
            _ => {}
        }
        info!("Avatar runtime bring-up cancelled");
        BringUpEvent::Cancelled
    }
}

fn start_event(asset_path: Option<&Path>, secret: Option<&str>) -> BringUpEvent {
    let asset_path = asset_path.filter(|p| !p.as_os_str().is_empty());
    let secret = secret.filter(|s| !s.trim().is_empty());

    match (asset_path, secret) {
        (Some(_), Some(_)) => BringUpEvent::LocalEligible,
        (Some(path), None) => {
            warn!(asset = %path.display(), "No API secret for local mode, falling back to remote");
            BringUpEvent::LocalIneligible
        }
        (None, _) => {
            info!("No local asset configured, using remote mode");
            BringUpEvent::LocalIneligible
        }
    }
}
