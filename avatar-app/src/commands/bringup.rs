use super::{ProfileArgs, SessionContext};
use crate::http_engine::HttpEngine;
use anyhow::{Context, Result};
use avatar_runtime::{AvatarMode, FallbackOrchestrator, RuntimeInitializer};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone, Args)]
pub struct BringupArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Remote engine base URL
    #[arg(long, env = "AVATAR_ENGINE_URL")]
    pub endpoint: Option<String>,

    /// Local engine base URL; defaults to the remote one
    #[arg(long)]
    pub local_endpoint: Option<String>,
}

pub async fn run(ctx: &SessionContext, args: &BringupArgs) -> Result<()> {
    let resolution = ctx.resolve(&args.profile)?;
    let spec = resolution.spec;

    let remote = args
        .endpoint
        .clone()
        .or_else(|| ctx.config.engine.remote_endpoint.clone())
        .context("No engine endpoint. Pass --endpoint or set engine.remote_endpoint")?;
    let local = args
        .local_endpoint
        .clone()
        .or_else(|| ctx.config.engine.local_endpoint.clone())
        .unwrap_or_else(|| remote.clone());

    let engine = HttpEngine::new(
        remote,
        local,
        Duration::from_secs(ctx.config.engine.request_timeout_seconds),
    );
    let initializer =
        RuntimeInitializer::new(Arc::new(engine)).with_avatar_id(ctx.settings.avatar_id.clone());

    let cancel = CancellationToken::new();
    let orchestrator = FallbackOrchestrator::with_cancellation(initializer, cancel.clone());

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling bring-up");
            cancel.cancel();
        }
    });

    println!("Profile: {} ({:?})", spec.name, resolution.source);
    let report = orchestrator
        .bring_up_traced(
            &spec,
            ctx.settings.asset_path.as_deref(),
            ctx.settings.api_secret.as_deref(),
        )
        .await;
    interrupt.abort();

    let trace: Vec<String> = report.trace.iter().map(ToString::to_string).collect();
    println!("Trace:   {}", trace.join(" -> "));

    match orchestrator.settle(report.outcome) {
        AvatarMode::Rendering(handle) => {
            println!(
                "Runtime: {} session {} ({} threads)",
                handle.mode(),
                handle.session_id(),
                handle.thread_count().as_raw()
            );
            handle
                .shutdown()
                .await
                .context("Failed to shut down avatar runtime")?;
        }
        AvatarMode::VoiceOnly { reason } => {
            println!("Avatar unavailable, continuing voice-only: {}", reason);
        }
    }

    let snapshot = orchestrator.metrics().snapshot();
    println!(
        "Attempts: local {}/{} failed, remote {}/{} failed, {} fallback(s)",
        snapshot.local_failures,
        snapshot.local_attempts,
        snapshot.remote_failures,
        snapshot.remote_attempts,
        snapshot.fallbacks
    );
    Ok(())
}
