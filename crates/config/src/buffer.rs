//! Derived characteristics of a buffer-depth configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackpressureClass {
    None,
    Bounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBound {
    Unbounded,
    Bounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterTolerance {
    Low,
    Medium,
    High,
}

impl fmt::Display for BackpressureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackpressureClass::None => "none",
            BackpressureClass::Bounded => "bounded",
        })
    }
}

impl fmt::Display for MemoryBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemoryBound::Unbounded => "unbounded",
            MemoryBound::Bounded => "bounded",
        })
    }
}

impl fmt::Display for JitterTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JitterTolerance::Low => "low",
            JitterTolerance::Medium => "medium",
            JitterTolerance::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferProfile {
    pub approx_latency_ms: f64,
    pub backpressure: BackpressureClass,
    pub memory: MemoryBound,
    pub jitter_tolerance: JitterTolerance,
}

/// Characterize buffer depths at a given frame rate.
///
/// Latency is the time the output queue holds when full. A frame rate of 0
/// is treated as 1 Hz.
pub fn characterize(input_depth: u32, output_depth: u32, frame_rate_hz: u32) -> BufferProfile {
    let frame_ms = 1000.0 / f64::from(frame_rate_hz.max(1));
    let unbounded_input = input_depth == 0;

    BufferProfile {
        approx_latency_ms: f64::from(output_depth) * frame_ms,
        backpressure: if unbounded_input {
            BackpressureClass::None
        } else {
            BackpressureClass::Bounded
        },
        memory: if unbounded_input {
            MemoryBound::Unbounded
        } else {
            MemoryBound::Bounded
        },
        jitter_tolerance: match output_depth {
            0..=2 => JitterTolerance::Low,
            3..=4 => JitterTolerance::Medium,
            _ => JitterTolerance::High,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_input_two_frames() {
        let profile = characterize(0, 2, 25);
        assert_eq!(profile.approx_latency_ms, 80.0);
        assert_eq!(profile.backpressure, BackpressureClass::None);
        assert_eq!(profile.memory, MemoryBound::Unbounded);
        assert_eq!(profile.jitter_tolerance, JitterTolerance::Low);
    }

    #[test]
    fn test_bounded_input() {
        let profile = characterize(2, 3, 25);
        assert_eq!(profile.approx_latency_ms, 120.0);
        assert_eq!(profile.backpressure, BackpressureClass::Bounded);
        assert_eq!(profile.memory, MemoryBound::Bounded);
        assert_eq!(profile.jitter_tolerance, JitterTolerance::Medium);
    }

    #[test]
    fn test_deep_output_buffer() {
        let profile = characterize(5, 5, 25);
        assert_eq!(profile.approx_latency_ms, 200.0);
        assert_eq!(profile.jitter_tolerance, JitterTolerance::High);
    }

    #[test]
    fn test_frame_rate_is_a_parameter() {
        assert_eq!(characterize(0, 3, 50).approx_latency_ms, 60.0);
        assert_eq!(characterize(0, 0, 25).approx_latency_ms, 0.0);
    }

    #[test]
    fn test_zero_frame_rate_does_not_divide_by_zero() {
        let profile = characterize(1, 2, 0);
        assert!(profile.approx_latency_ms.is_finite());
        assert_eq!(profile.approx_latency_ms, 2000.0);
    }

    #[test]
    fn test_labels_match_serialized_names() {
        fn serialized<T: Serialize>(value: &T) -> String {
            serde_json::to_value(value).unwrap().as_str().unwrap().to_string()
        }

        for class in [BackpressureClass::None, BackpressureClass::Bounded] {
            assert_eq!(class.to_string(), serialized(&class));
        }
        for bound in [MemoryBound::Unbounded, MemoryBound::Bounded] {
            assert_eq!(bound.to_string(), serialized(&bound));
        }
        for jitter in [JitterTolerance::Low, JitterTolerance::Medium, JitterTolerance::High] {
            assert_eq!(jitter.to_string(), serialized(&jitter));
        }
    }
}
