//! # Core Configuration Module
//!
//! Capability wiring for video surface sessions.
//!
//! ## Overview
//!
//! `CoreConfig` collects the host-provided capabilities every session needs
//! and is shared (cheaply cloned) across all sessions of a host. The builder
//! enforces fail-fast validation: a missing required capability is reported
//! at startup with an actionable message rather than on the first `resume()`.
//!
//! ## Required Dependencies
//!
//! - `EngineFactory` - builds playback engine instances
//!
//! ## Optional Dependencies
//!
//! - `MediaItemProvider` - default url to playlist resolution
//! - `EventBus` - lifecycle event broadcasting
//! - `Clock` - time source (defaults to [`SystemClock`])
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .engine_factory(Arc::new(ExoPlayerFactory::new(context)))
//!     .media_item_provider(Arc::new(HlsProvider))
//!     .build()?;
//! ```
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Fails: no engine factory
//! let config = CoreConfig::builder().build().expect("engine factory is required");
//! ```

use crate::error::{Error, Result};
use crate::events::EventBus;
use bridge_traits::{Clock, EngineFactory, MediaItemProvider, SystemClock};
use std::sync::Arc;

/// Shared capabilities for playback sessions.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Engine constructor (required)
    pub engine_factory: Arc<dyn EngineFactory>,

    /// Provider used when a caller does not pass one explicitly
    pub media_item_provider: Option<Arc<dyn MediaItemProvider>>,

    /// Lifecycle event sink
    pub event_bus: Option<EventBus>,

    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine_factory", &"EngineFactory { ... }")
            .field(
                "media_item_provider",
                &self
                    .media_item_provider
                    .as_ref()
                    .map(|_| "MediaItemProvider { ... }"),
            )
            .field("event_bus", &self.event_bus)
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

fn engine_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "EngineFactory".to_string(),
        message: "An EngineFactory implementation is required to create playback engines. \
                 Android: wrap ExoPlayer.Builder. iOS: wrap AVPlayer. \
                 Desktop: wrap a GStreamer playbin or libmpv handle."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine_factory: Option<Arc<dyn EngineFactory>>,
    media_item_provider: Option<Arc<dyn MediaItemProvider>>,
    event_bus: Option<EventBus>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Sets the engine factory (required).
    pub fn engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Sets the default media item provider.
    ///
    /// Sessions fall back to it when `resume`/`acquire` are called without an
    /// explicit provider.
    pub fn media_item_provider(mut self, provider: Arc<dyn MediaItemProvider>) -> Self {
        self.media_item_provider = Some(provider);
        self
    }

    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Overrides the time source. Tests inject a `ManualClock` here.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// [`Error::CapabilityMissing`] if no engine factory was provided.
    pub fn build(self) -> Result<CoreConfig> {
        let engine_factory = self
            .engine_factory
            .ok_or_else(engine_factory_missing_error)?;

        Ok(CoreConfig {
            engine_factory,
            media_item_provider: self.media_item_provider,
            event_bus: self.event_bus,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}
