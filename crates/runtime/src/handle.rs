//! The single live runtime of a session.

use crate::engine::{EngineError, EngineHandle};
use avatar_config::{BufferDepths, ProfileName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Local,
    Remote,
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Local => f.write_str("local"),
            RuntimeMode::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadCount {
    Auto,
    Single,
    Explicit(NonZeroU32),
}

impl ThreadCount {
    /// Map a profile hint; anything below zero means auto-detect.
    pub fn from_hint(hint: Option<i32>) -> Self {
        match hint {
            None => ThreadCount::Auto,
            Some(0) => ThreadCount::Single,
            Some(n) => u32::try_from(n)
                .ok()
                .and_then(NonZeroU32::new)
                .map(ThreadCount::Explicit)
                .unwrap_or(ThreadCount::Auto),
        }
    }

    /// Engine encoding: -1 auto, 0 single-threaded, >0 explicit.
    pub fn as_raw(&self) -> i32 {
        match self {
            ThreadCount::Auto => -1,
            ThreadCount::Single => 0,
            ThreadCount::Explicit(n) => i32::try_from(n.get()).unwrap_or(i32::MAX),
        }
    }
}

pub struct RuntimeHandle {
    mode: RuntimeMode,
    profile: ProfileName,
    thread_count: ThreadCount,
    buffers: BufferDepths,
    engine: EngineHandle,
}

impl RuntimeHandle {
    pub(crate) fn new(
        mode: RuntimeMode,
        profile: ProfileName,
        thread_count: ThreadCount,
        buffers: BufferDepths,
        engine: EngineHandle,
    ) -> Self {
        Self {
            mode,
            profile,
            thread_count,
            buffers,
            engine,
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn profile(&self) -> ProfileName {
        self.profile
    }

    pub fn thread_count(&self) -> ThreadCount {
        self.thread_count
    }

    pub fn buffers(&self) -> BufferDepths {
        self.buffers
    }

    pub fn session_id(&self) -> &str {
        self.engine.session_id()
    }

    /// Tear the runtime down and release engine resources.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        info!(
            mode = %self.mode,
            session_id = self.engine.session_id(),
            "Shutting down avatar runtime"
        );
        self.engine.shutdown().await
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("mode", &self.mode)
            .field("profile", &self.profile)
            .field("thread_count", &self.thread_count)
            .field("buffers", &self.buffers)
            .field("session_id", &self.engine.session_id())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_count_from_hint() {
        assert_eq!(ThreadCount::from_hint(None), ThreadCount::Auto);
        assert_eq!(ThreadCount::from_hint(Some(-1)), ThreadCount::Auto);
        assert_eq!(ThreadCount::from_hint(Some(0)), ThreadCount::Single);
        assert_eq!(
            ThreadCount::from_hint(Some(4)),
            ThreadCount::Explicit(NonZeroU32::new(4).unwrap())
        );
    }

    #[test]
    fn test_thread_count_raw_encoding() {
        assert_eq!(ThreadCount::Auto.as_raw(), -1);
        assert_eq!(ThreadCount::Single.as_raw(), 0);
        assert_eq!(ThreadCount::from_hint(Some(6)).as_raw(), 6);
    }
}
