//! Per-session configuration.

use crate::error::{Result, SurfaceError};
use crate::transform::ScaleMode;
use serde::{Deserialize, Serialize};

/// Behavior knobs for a [`PlaybackSession`](crate::PlaybackSession).
///
/// Deserializable so hosts can ship it alongside their layout/theme config;
/// every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Scale mode used until the host calls `set_scale_mode`.
    pub default_scale_mode: ScaleMode,

    /// Release the engine automatically when the surface is detached.
    pub auto_release: bool,

    /// Attach a tracing-backed telemetry logger to every bound engine.
    pub debug_event_logging: bool,

    /// Surface alpha while waiting for the first frame.
    pub hidden_alpha: f32,

    /// Surface alpha once the first frame has been presented.
    pub visible_alpha: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            default_scale_mode: ScaleMode::FitCenter,
            auto_release: true,
            debug_event_logging: false,
            hidden_alpha: 0.0,
            visible_alpha: 1.0,
        }
    }
}

impl SurfaceConfig {
    pub fn with_scale_mode(mut self, mode: ScaleMode) -> Self {
        self.default_scale_mode = mode;
        self
    }

    pub fn with_auto_release(mut self, auto_release: bool) -> Self {
        self.auto_release = auto_release;
        self
    }

    pub fn with_debug_event_logging(mut self, enabled: bool) -> Self {
        self.debug_event_logging = enabled;
        self
    }

    /// Checks that both alpha values are in `0.0..=1.0` and that the surface
    /// actually becomes more visible on the first frame.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("hidden_alpha", self.hidden_alpha), ("visible_alpha", self.visible_alpha)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SurfaceError::InvalidConfig(format!(
                    "{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }
        if self.hidden_alpha >= self.visible_alpha {
            return Err(SurfaceError::InvalidConfig(format!(
                "hidden_alpha ({}) must be lower than visible_alpha ({})",
                self.hidden_alpha, self.visible_alpha
            )));
        }
        Ok(())
    }
}
