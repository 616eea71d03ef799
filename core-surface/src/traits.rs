//! Host-facing callbacks.
//!
//! These are the capabilities the controller exposes *to* the host, as
//! opposed to the collaborator contracts in `bridge-traits` that the host
//! implements for the engine side. Both are invoked on the session's owning
//! thread only.

use crate::error::SurfaceError;
use bridge_traits::RenderSurface;

/// Notified once per bind cycle, after the first transform has been applied
/// and the surface made visible.
pub trait VideoRenderedListener: Send + Sync {
    fn on_rendered(&self, surface: &dyn RenderSurface);
}

/// Dedicated error channel for bind failures, playback errors and unresolved
/// sources.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &SurfaceError);
}
