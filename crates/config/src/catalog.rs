//! Static table of deployment profiles.

use crate::error::ProfileError;
use crate::spec::{
    BufferDepths, Compression, LoadingMode, ModelVariant, ProfileName, ProfileSpec, RetrySettings,
};

const FRAME_RATE_HZ: u32 = 25;

static CATALOG: [ProfileSpec; 5] = [
    // Minimum delay; less robust to jitter.
    ProfileSpec {
        name: ProfileName::UltraLowLatency,
        model_variant: ModelVariant::Fast,
        output_width_px: 960,
        compression: Compression::None,
        idle_frame_handling: false,
        idle_video_enabled: None,
        loading_mode: LoadingMode::Async,
        retry: RetrySettings {
            max_attempts: 3,
            interval_seconds: 0.5,
            timeout_seconds: 10.0,
        },
        buffers: BufferDepths {
            input_depth: 0,
            output_depth: 2,
        },
        thread_hint: None,
        frame_rate_hz: FRAME_RATE_HZ,
    },
    ProfileSpec {
        name: ProfileName::Balanced,
        model_variant: ModelVariant::Fast,
        output_width_px: 1280,
        compression: Compression::Lossy,
        idle_frame_handling: true,
        idle_video_enabled: None,
        loading_mode: LoadingMode::Async,
        retry: RetrySettings {
            max_attempts: 5,
            interval_seconds: 1.5,
            timeout_seconds: 20.0,
        },
        buffers: BufferDepths {
            input_depth: 2,
            output_depth: 3,
        },
        thread_hint: None,
        frame_rate_hz: FRAME_RATE_HZ,
    },
    ProfileSpec {
        name: ProfileName::HighQuality,
        model_variant: ModelVariant::Expressive,
        output_width_px: 1280,
        compression: Compression::None,
        idle_frame_handling: true,
        idle_video_enabled: Some(true),
        loading_mode: LoadingMode::Sync,
        retry: RetrySettings {
            max_attempts: 5,
            interval_seconds: 2.0,
            timeout_seconds: 30.0,
        },
        buffers: BufferDepths {
            input_depth: 5,
            output_depth: 5,
        },
        thread_hint: None,
        frame_rate_hz: FRAME_RATE_HZ,
    },
    // Edge devices and slow links: more retries, longer timeouts, one thread.
    ProfileSpec {
        name: ProfileName::Constrained,
        model_variant: ModelVariant::Fast,
        output_width_px: 720,
        compression: Compression::Lossy,
        idle_frame_handling: false,
        idle_video_enabled: Some(false),
        loading_mode: LoadingMode::OnDemand,
        retry: RetrySettings {
            max_attempts: 5,
            interval_seconds: 2.0,
            timeout_seconds: 30.0,
        },
        buffers: BufferDepths {
            input_depth: 2,
            output_depth: 3,
        },
        thread_hint: Some(0),
        frame_rate_hz: FRAME_RATE_HZ,
    },
    ProfileSpec {
        name: ProfileName::Local,
        model_variant: ModelVariant::Fast,
        output_width_px: 1280,
        compression: Compression::Lossy,
        idle_frame_handling: true,
        idle_video_enabled: None,
        loading_mode: LoadingMode::Async,
        retry: RetrySettings {
            max_attempts: 5,
            interval_seconds: 1.5,
            timeout_seconds: 20.0,
        },
        buffers: BufferDepths {
            input_depth: 0,
            output_depth: 2,
        },
        thread_hint: Some(-1),
        frame_rate_hz: FRAME_RATE_HZ,
    },
];

/// Read-only view over the profile table.
pub struct ProfileCatalog;

impl ProfileCatalog {
    /// Spec for a known profile.
    pub fn get(name: ProfileName) -> &'static ProfileSpec {
        match name {
            ProfileName::UltraLowLatency => &CATALOG[0],
            ProfileName::Balanced => &CATALOG[1],
            ProfileName::HighQuality => &CATALOG[2],
            ProfileName::Constrained => &CATALOG[3],
            ProfileName::Local => &CATALOG[4],
        }
    }

    /// Look a profile up by its textual name.
    ///
    /// # Errors
    /// Returns `UnknownProfile` if `name` is outside the enumeration.
    pub fn lookup(name: &str) -> Result<ProfileSpec, ProfileError> {
        let parsed: ProfileName = name.parse()?;
        Ok(Self::get(parsed).clone())
    }

    pub fn all() -> impl Iterator<Item = &'static ProfileSpec> {
        CATALOG.iter()
    }
}
