//! # Core Surface
//!
//! Lifecycle controller that binds a platform playback engine to a render
//! surface.
//!
//! ## Overview
//!
//! A [`PlaybackSession`] owns at most one engine at a time. It creates the
//! engine lazily on `resume`/`acquire`, wires the surface and listeners,
//! keeps the displayed frame fitted to the surface according to the current
//! [`ScaleMode`], and tears everything down on `release` or when the surface
//! is detached.
//!
//! ## Modules
//!
//! - [`session`] - the session state machine
//! - [`transform`] - scale-mode matrix calculation
//! - [`listeners`] - telemetry listeners that survive engine rebinds
//! - [`notifier`] - first-frame reveal and rendered callback
//! - [`callback`] - engine-thread callback marshaling and stale filtering
//! - [`telemetry`] - debug event logger
//! - [`config`] - per-session policy
//! - [`traits`] - host-facing callbacks
//!
//! ## Example
//!
//! ```ignore
//! use core_surface::{PlaybackSession, ScaleMode, SurfaceConfig};
//!
//! let mut session = PlaybackSession::new(core_config, SurfaceConfig::default(), &surface)?;
//! session.set_scale_mode(ScaleMode::CenterCrop);
//! session.prepare("https://cdn.example.com/intro.mp4");
//! session.resume(None)?;
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod listeners;
pub mod notifier;
pub mod session;
pub mod telemetry;
pub mod traits;
pub mod transform;

pub use callback::{CallbackDisposition, EngineCallback, EngineCallbacks, EngineEvent, EngineId};
pub use config::SurfaceConfig;
pub use error::{BindStage, Result, SurfaceError};
pub use listeners::ListenerRegistry;
pub use notifier::RenderedNotifier;
pub use session::{PlaybackIntent, PlaybackSession, SessionSettings, SessionState};
pub use telemetry::TracingEventLogger;
pub use traits::{ErrorReporter, VideoRenderedListener};
pub use transform::ScaleMode;
