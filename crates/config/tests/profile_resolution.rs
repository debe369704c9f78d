//! Profile resolution across catalog, probe, and session settings.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use avatar_config::*;
use std::collections::HashMap;
use std::sync::Arc;

struct FixedMetrics {
    cpus: usize,
    memory_gib: f64,
}

impl SystemMetrics for FixedMetrics {
    fn cpu_count(&self) -> usize {
        self.cpus
    }

    fn available_memory_gib(&self) -> f64 {
        self.memory_gib
    }
}

fn selector(cpus: usize, memory_gib: f64) -> ProfileSelector {
    ProfileSelector::new(ResourceProbe::new(Arc::new(FixedMetrics { cpus, memory_gib })))
}

fn settings(pairs: &[(&str, &str)]) -> SessionSettings {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    SessionSettings::from_lookup(|key| map.get(key).map(|v| v.to_string())).unwrap()
}

#[test]
fn test_precedence_with_all_inputs_present() {
    // High-capacity host would pick high-quality adaptively.
    let sel = selector(16, 32.0);

    let r = sel
        .resolve_with_source(Some("ultra-low-latency"), Some("constrained"), true)
        .unwrap();
    assert_eq!(r.spec.name, ProfileName::UltraLowLatency);
    assert_eq!(r.source, ResolutionSource::Explicit);

    let r = sel.resolve_with_source(None, Some("constrained"), true).unwrap();
    assert_eq!(r.spec.name, ProfileName::Constrained);
    assert_eq!(r.source, ResolutionSource::Environment);

    let r = sel.resolve_with_source(None, None, true).unwrap();
    assert_eq!(r.spec.name, ProfileName::HighQuality);
    assert_eq!(r.source, ResolutionSource::Adaptive);

    let r = sel.resolve_with_source(None, None, false).unwrap();
    assert_eq!(r.spec.name, DEFAULT_PROFILE);
    assert_eq!(r.source, ResolutionSource::Default);
}

#[test]
fn test_unknown_explicit_name_fails() {
    let err = selector(8, 8.0).resolve(Some("cinematic"), None, false).unwrap_err();
    assert_eq!(err, ProfileError::UnknownProfile("cinematic".to_string()));
}

#[test]
fn test_low_tier_resolves_single_threaded() {
    let spec = selector(2, 2.0).resolve(None, None, true).unwrap();
    assert_eq!(spec.name, ProfileName::Constrained);
    assert_eq!(spec.thread_hint, Some(0));
    assert_eq!(spec.output_width_px, 720);
}

#[test]
fn test_settings_drive_resolution_and_overrides() {
    let session = settings(&[
        ("AVATAR_PROFILE", "balanced"),
        ("OUTPUT_WIDTH", "960"),
        ("COMPRESS_METHOD", "NONE"),
    ]);
    let sel = ProfileSelector::with_overrides(
        ResourceProbe::new(Arc::new(FixedMetrics {
            cpus: 4,
            memory_gib: 4.0,
        })),
        session.overrides.clone(),
    );

    let spec = sel.resolve_settings(None, &session).unwrap();
    assert_eq!(spec.name, ProfileName::Balanced);
    assert_eq!(spec.output_width_px, 960);
    assert_eq!(spec.compression, Compression::None);
    assert_eq!(spec.retry, ProfileCatalog::get(ProfileName::Balanced).retry);
}

#[test]
fn test_override_to_unsupported_width_is_rejected() {
    let session = settings(&[("OUTPUT_WIDTH", "1000")]);
    let sel = ProfileSelector::with_overrides(
        ResourceProbe::new(Arc::new(FixedMetrics {
            cpus: 4,
            memory_gib: 4.0,
        })),
        session.overrides,
    );
    let err = sel.resolve(Some("balanced"), None, false).unwrap_err();
    assert_eq!(err, ProfileError::UnsupportedResolution(1000));
}

#[test]
fn test_catalog_specs_characterize_consistently() {
    for spec in ProfileCatalog::all() {
        let profile = spec.buffer_profile();
        let expected = characterize(
            spec.buffers.input_depth,
            spec.buffers.output_depth,
            spec.frame_rate_hz,
        );
        assert_eq!(profile, expected, "profile {}", spec.name);
        assert!(profile.approx_latency_ms > 0.0);
    }
}

#[test]
fn test_spec_survives_yaml() {
    let spec = ProfileCatalog::lookup("high-quality").unwrap();
    let yaml = serde_yaml::to_string(&spec).unwrap();
    let back: ProfileSpec = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, spec);
}
