//! Profile resolution: explicit name, environment name, capacity tier, default.

use crate::catalog::ProfileCatalog;
use crate::error::ProfileError;
use crate::probe::{CapacityTier, ResourceProbe};
use crate::settings::{ProfileOverrides, SessionSettings};
use crate::spec::{ProfileName, ProfileSpec};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_PROFILE: ProfileName = ProfileName::Balanced;

/// Which rule picked the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Explicit,
    Environment,
    Adaptive,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub spec: ProfileSpec,
    pub source: ResolutionSource,
}

pub fn profile_for_tier(tier: CapacityTier) -> ProfileName {
    match tier {
        CapacityTier::High => ProfileName::HighQuality,
        CapacityTier::Medium => ProfileName::Balanced,
        CapacityTier::Low => ProfileName::Constrained,
    }
}

pub struct ProfileSelector {
    probe: ResourceProbe,
    overrides: ProfileOverrides,
}

impl ProfileSelector {
    pub fn new(probe: ResourceProbe) -> Self {
        Self {
            probe,
            overrides: ProfileOverrides::default(),
        }
    }

    pub fn with_overrides(probe: ResourceProbe, overrides: ProfileOverrides) -> Self {
        Self { probe, overrides }
    }

    /// Resolve the effective spec. First match wins.
    ///
    /// # Errors
    /// `UnknownProfile` when `explicit` names a profile outside the catalog;
    /// override errors when the overridden spec breaks an invariant.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        env_name: Option<&str>,
        adaptive: bool,
    ) -> Result<ProfileSpec, ProfileError> {
        self.resolve_with_source(explicit, env_name, adaptive)
            .map(|resolution| resolution.spec)
    }

    pub fn resolve_with_source(
        &self,
        explicit: Option<&str>,
        env_name: Option<&str>,
        adaptive: bool,
    ) -> Result<Resolution, ProfileError> {
        let (name, source) = self.pick(explicit, env_name, adaptive)?;
        let spec = self.overrides.apply(ProfileCatalog::get(name).clone())?;
        info!(profile = %name, source = ?source, "Resolved avatar profile");
        Ok(Resolution { spec, source })
    }

    /// Resolve from a captured settings object.
    pub fn resolve_settings(
        &self,
        explicit: Option<&str>,
        settings: &SessionSettings,
    ) -> Result<ProfileSpec, ProfileError> {
        self.resolve(explicit, settings.profile.as_deref(), settings.adaptive)
    }

    fn pick(
        &self,
        explicit: Option<&str>,
        env_name: Option<&str>,
        adaptive: bool,
    ) -> Result<(ProfileName, ResolutionSource), ProfileError> {
        if let Some(name) = non_empty(explicit) {
            return Ok((name.parse()?, ResolutionSource::Explicit));
        }

        if let Some(name) = non_empty(env_name) {
            match name.parse::<ProfileName>() {
                Ok(parsed) => return Ok((parsed, ResolutionSource::Environment)),
                Err(_) => warn!(profile = name, "Ignoring unknown profile from environment"),
            }
        }

        if adaptive {
            let snapshot = self.probe.snapshot();
            info!(
                cpu_count = snapshot.cpu_count,
                available_memory_gib = snapshot.available_memory_gib,
                tier = %snapshot.tier,
                "Adaptive profile selection"
            );
            return Ok((profile_for_tier(snapshot.tier), ResolutionSource::Adaptive));
        }

        Ok((DEFAULT_PROFILE, ResolutionSource::Default))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
