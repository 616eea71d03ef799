//! # Host Bridge Traits
//!
//! Capability traits that a host platform must implement for the video surface
//! controller.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the
//! platform-specific pieces it drives: the playback engine, the drawable
//! surface, media item resolution and host logging. Each trait represents a
//! capability that the core requires but that must be implemented differently
//! per platform (Android, iOS, desktop, web).
//!
//! ## Traits
//!
//! ### Playback
//! - [`VideoEngine`](video::VideoEngine) - A live engine instance (playlist, intent, surface binding)
//! - [`EngineFactory`](video::EngineFactory) - Builds fresh engine instances
//! - [`EngineListener`](video::EngineListener) - State / frame-size / error callbacks
//! - [`TelemetryListener`](video::TelemetryListener) - Analytics hooks attached to an engine
//! - [`MediaItemProvider`](video::MediaItemProvider) - Url to playlist resolution
//!
//! ### Rendering
//! - [`RenderSurface`](video::RenderSurface) - Drawable target with content transform and alpha
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert their native errors into it with an
//! actionable message.
//!
//! ## Thread Safety
//!
//! Engines call listeners from their own threads, so listeners, surfaces and
//! factories are `Send + Sync`. Engine instances themselves only need `Send`;
//! the core drives them from a single owning thread.

pub mod error;
pub mod time;
pub mod video;

pub use error::BridgeError;

// Re-export commonly used types
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
pub use video::{
    EngineFactory, EngineFailure, EngineListener, EngineState, MediaItem, MediaItemProvider,
    PixelSize, RenderSurface, TelemetryEvent, TelemetryListener, TransformMatrix, VideoEngine,
};
