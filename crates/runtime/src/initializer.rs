//! Construction of a runtime in local or remote mode.

use crate::engine::{
    EngineError, EngineFailureCause, EngineHandle, LocalEngineParams, RemoteEngineParams,
    SynthesisEngine,
};
use crate::error::RuntimeError;
use crate::handle::{RuntimeHandle, RuntimeMode, ThreadCount};
use crate::metrics::BringUpMetrics;
use crate::retry::RetryPolicy;
use avatar_config::ProfileSpec;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct RuntimeInitializer {
    engine: Arc<dyn SynthesisEngine>,
    metrics: Arc<BringUpMetrics>,
    avatar_id: Option<String>,
}

impl RuntimeInitializer {
    pub fn new(engine: Arc<dyn SynthesisEngine>) -> Self {
        Self::with_metrics(engine, BringUpMetrics::new())
    }

    pub fn with_metrics(engine: Arc<dyn SynthesisEngine>, metrics: Arc<BringUpMetrics>) -> Self {
        Self {
            engine,
            metrics,
            avatar_id: None,
        }
    }

    /// Avatar identifier forwarded to remote sessions.
    pub fn with_avatar_id(mut self, avatar_id: Option<String>) -> Self {
        self.avatar_id = avatar_id;
        self
    }

    pub fn metrics(&self) -> Arc<BringUpMetrics> {
        self.metrics.clone()
    }

    /// Build an in-process runtime from a local asset. Never retried.
    ///
    /// # Errors
    /// `AssetNotFound` for a missing or unreadable asset, `AuthFailed` for an
    /// empty or rejected secret, `InitFailed` for anything else.
    pub async fn init_local(
        &self,
        spec: &ProfileSpec,
        asset_path: &Path,
        secret: &str,
    ) -> Result<RuntimeHandle, RuntimeError> {
        self.metrics.inc_local_attempts();
        let result = self.try_init_local(spec, asset_path, secret).await;
        if result.is_err() {
            self.metrics.inc_local_failures();
        }
        result
    }

    async fn try_init_local(
        &self,
        spec: &ProfileSpec,
        asset_path: &Path,
        secret: &str,
    ) -> Result<RuntimeHandle, RuntimeError> {
        if !asset_is_readable(asset_path).await {
            return Err(RuntimeError::AssetNotFound(asset_path.to_path_buf()));
        }

        if secret.trim().is_empty() {
            return Err(RuntimeError::AuthFailed(
                "local mode requires an API secret".to_string(),
            ));
        }

        let thread_count = ThreadCount::from_hint(spec.thread_hint);
        let params = LocalEngineParams {
            asset_path: asset_path.to_path_buf(),
            thread_count: thread_count.as_raw(),
            buffers: spec.buffers,
        };
        debug!(
            asset = %asset_path.display(),
            threads = params.thread_count,
            "Creating local engine"
        );

        let engine = self
            .engine
            .create_local(&params, secret)
            .await
            .map_err(|e| local_error(e, asset_path))?;

        info!(
            profile = %spec.name,
            session_id = engine.session_id(),
            "Local avatar runtime ready"
        );
        Ok(RuntimeHandle::new(
            RuntimeMode::Local,
            spec.name,
            thread_count,
            spec.buffers,
            engine,
        ))
    }

    /// Build a remote runtime, retried per the profile's retry settings.
    ///
    /// # Errors
    /// `AuthFailed` for an empty or rejected secret, `InvalidRetryPolicy` for
    /// malformed retry settings, otherwise whatever the retry loop surfaces.
    pub async fn init_remote(
        &self,
        spec: &ProfileSpec,
        secret: &str,
        cancel: &CancellationToken,
    ) -> Result<RuntimeHandle, RuntimeError> {
        if secret.trim().is_empty() {
            return Err(RuntimeError::AuthFailed(
                "remote mode requires an API secret".to_string(),
            ));
        }

        let policy = RetryPolicy::from_settings(&spec.retry)?.with_metrics(self.metrics.clone());
        let thread_count = ThreadCount::from_hint(spec.thread_hint);
        let engine = self.engine.clone();
        let avatar_id = self.avatar_id.clone();

        let session = policy
            .execute(cancel, |_attempt| {
                let engine = engine.clone();
                let params = RemoteEngineParams::from_spec(spec, avatar_id.clone());
                async move { engine.create_remote(secret, &params).await }
            })
            .await?;

        if cancel.is_cancelled() {
            discard(session).await;
            return Err(RuntimeError::Cancelled);
        }

        info!(
            profile = %spec.name,
            session_id = session.session_id(),
            "Remote avatar runtime ready"
        );
        Ok(RuntimeHandle::new(
            RuntimeMode::Remote,
            spec.name,
            thread_count,
            spec.buffers,
            session,
        ))
    }
}

/// The asset must be a regular file this process can open for reading.
async fn asset_is_readable(path: &Path) -> bool {
    match tokio::fs::File::open(path).await {
        Ok(file) => file.metadata().await.map(|m| m.is_file()).unwrap_or(false),
        Err(e) => {
            debug!(asset = %path.display(), error = %e, "Local asset unavailable");
            false
        }
    }
}

fn local_error(err: EngineError, asset_path: &Path) -> RuntimeError {
    match err.cause {
        EngineFailureCause::Asset => RuntimeError::AssetNotFound(asset_path.to_path_buf()),
        EngineFailureCause::Auth => RuntimeError::AuthFailed(err.message),
        EngineFailureCause::Network | EngineFailureCause::Other => {
            RuntimeError::InitFailed(err.to_string())
        }
    }
}

async fn discard(session: EngineHandle) {
    if let Err(e) = session.shutdown().await {
        warn!(error = %e, "Failed to release engine session");
    }
}
