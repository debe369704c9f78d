//! Avatar session configuration.
//!
//! Named deployment profiles, buffer characterization, capacity probing and
//! the rules that turn a requested or inferred profile into a `ProfileSpec`.

pub mod buffer;
pub mod catalog;
pub mod error;
pub mod probe;
pub mod selector;
pub mod settings;
pub mod spec;

pub use buffer::{characterize, BackpressureClass, BufferProfile, JitterTolerance, MemoryBound};
pub use catalog::ProfileCatalog;
pub use error::ProfileError;
pub use probe::{CapacityTier, ResourceProbe, ResourceSnapshot, SysinfoMetrics, SystemMetrics};
pub use selector::{ProfileSelector, Resolution, ResolutionSource, DEFAULT_PROFILE};
pub use settings::{ProfileOverrides, SessionSettings};
pub use spec::{
    BufferDepths, Compression, LoadingMode, ModelVariant, ProfileName, ProfileSpec, RetrySettings,
    SUPPORTED_WIDTHS,
};
