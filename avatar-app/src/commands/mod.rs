pub mod bringup;
pub mod probe;
pub mod profiles;
pub mod resolve;

use crate::config::AppConfig;
use anyhow::{Context, Result};
use avatar_config::{ProfileSelector, Resolution, ResourceProbe, SessionSettings};
use clap::Args;

#[derive(Debug, Clone, Default, Args)]
pub struct ProfileArgs {
    /// Profile name; beats AVATAR_PROFILE and adaptive selection
    #[arg(long, short)]
    pub profile: Option<String>,

    /// Pick a profile from the host's capacity tier
    #[arg(long)]
    pub adaptive: bool,
}

/// Configuration captured once at startup and shared by every command.
pub struct SessionContext {
    pub config: AppConfig,
    pub settings: SessionSettings,
}

impl SessionContext {
    pub fn new(config: AppConfig, settings: SessionSettings) -> Self {
        let settings = config.merge_into(settings);
        Self { config, settings }
    }

    pub fn resolve(&self, args: &ProfileArgs) -> Result<Resolution> {
        let selector =
            ProfileSelector::with_overrides(ResourceProbe::system(), self.settings.overrides.clone());
        selector
            .resolve_with_source(
                args.profile.as_deref(),
                self.settings.profile.as_deref(),
                args.adaptive || self.settings.adaptive,
            )
            .context("Failed to resolve avatar profile")
    }
}
