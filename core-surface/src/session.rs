//! # Playback Session
//!
//! Owns the lifecycle of one playback engine bound to one render surface.
//!
//! ## State machine
//!
//! ```text
//!            prepare                 resume / acquire
//!   Empty ─────────────► Empty ──────────────────────► Bound(Playing | Paused)
//!     ▲                                                  │    ▲
//!     │ prepare                       pause / resume     │    │
//!     │                                                  └────┘
//!  Released ◄──────────────────── release ───────────────┘
//!     │
//!     └──── resume / acquire (url retained) ───────────► Bound
//! ```
//!
//! At most one engine is alive per session. Every bind cycle gets a fresh
//! [`EngineId`]; engine callbacks carry the id of the engine that produced
//! them and are discarded once that engine is no longer the live one.
//!
//! ## Threading
//!
//! The session is driven from a single owning thread. Engines may call their
//! listeners from any thread; those callbacks are queued and only take effect
//! when the owner calls [`PlaybackSession::dispatch_pending`]. Hosts either
//! poll it from their UI loop or await [`PlaybackSession::callback_waker`]
//! before dispatching. Releasing the engine drops anything still queued.

use crate::callback::{CallbackDisposition, CallbackMailbox, EngineCallback, EngineEvent, EngineId};
use crate::config::SurfaceConfig;
use crate::error::{BindStage, Result, SurfaceError};
use crate::listeners::ListenerRegistry;
use crate::notifier::RenderedNotifier;
use crate::telemetry::TracingEventLogger;
use crate::traits::{ErrorReporter, VideoRenderedListener};
use crate::transform::{self, ScaleMode};
use bridge_traits::{
    BridgeError, EngineListener, MediaItem, MediaItemProvider, PixelSize, RenderSurface,
    TelemetryListener, VideoEngine,
};
use chrono::{DateTime, Utc};
use core_runtime::config::CoreConfig;
use core_runtime::events::SurfaceEvent;
use core_runtime::logging::redact_url;
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace, warn};

/// Playing/paused state requested from the engine, independent of whether it
/// is actually buffering or rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackIntent {
    Playing,
    Paused,
}

impl PlaybackIntent {
    fn play_when_ready(self) -> bool {
        matches!(self, PlaybackIntent::Playing)
    }
}

/// Externally observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No engine; a url may or may not be pending.
    Empty,
    /// An engine is bound to the surface.
    Bound {
        engine: EngineId,
        intent: PlaybackIntent,
    },
    /// The last engine was released. `resume`/`acquire` rebind with the
    /// retained url.
    Released,
}

impl SessionState {
    pub fn is_bound(&self) -> bool {
        matches!(self, SessionState::Bound { .. })
    }

    pub fn intent(&self) -> Option<PlaybackIntent> {
        match self {
            SessionState::Bound { intent, .. } => Some(*intent),
            _ => None,
        }
    }
}

/// Mutable per-session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub scale_mode: ScaleMode,
    pub auto_release: bool,
    /// Url handed to the next bind.
    pub url: Option<String>,
}

impl SessionSettings {
    fn from_config(config: &SurfaceConfig) -> Self {
        Self {
            scale_mode: config.default_scale_mode,
            auto_release: config.auto_release,
            url: None,
        }
    }
}

/// Everything owned by one bind cycle.
struct Binding {
    id: EngineId,
    engine: Box<dyn VideoEngine>,
    intent: PlaybackIntent,
    listener: Arc<dyn EngineListener>,
    debug_logger: Option<Arc<dyn TelemetryListener>>,
    frame_size: Option<PixelSize>,
    bound_at: DateTime<Utc>,
}

impl Binding {
    /// Stops, unwires and releases the engine. Never fails; individual step
    /// failures are logged.
    fn teardown(mut self, registry: &mut ListenerRegistry) {
        let id = self.id;
        self.engine.set_play_when_ready(false);
        if let Err(error) = self.engine.set_video_surface(None) {
            warn!(engine = %id, %error, "failed to detach surface from engine");
        }
        self.engine.remove_listener(&self.listener);
        if let Some(logger) = &self.debug_logger {
            self.engine.remove_telemetry_listener(logger);
        }
        registry.detach_all(id, self.engine.as_mut());
        self.engine.release();
    }
}

enum Phase {
    Empty,
    Bound(Binding),
    Released,
}

/// Controller for one render surface and the engine bound to it.
///
/// # Example
///
/// ```ignore
/// let mut session = PlaybackSession::new(core_config, SurfaceConfig::default(), &surface)?;
/// session.prepare("https://cdn.example.com/clip.m3u8");
/// session.resume(None)?;
///
/// // on the owning thread, whenever the host loop ticks
/// session.dispatch_pending();
/// ```
pub struct PlaybackSession {
    core: CoreConfig,
    config: SurfaceConfig,
    surface: Weak<dyn RenderSurface>,
    settings: SessionSettings,
    phase: Phase,
    registry: ListenerRegistry,
    notifier: RenderedNotifier,
    mailbox: CallbackMailbox,
    reporter: Option<Arc<dyn ErrorReporter>>,
    engines_created: u64,
}

impl PlaybackSession {
    /// Creates a session for `surface`. The session only keeps a weak
    /// reference; the host UI layer owns the surface.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::InvalidConfig`] if `config` fails validation.
    pub fn new<S>(core: CoreConfig, config: SurfaceConfig, surface: &Arc<S>) -> Result<Self>
    where
        S: RenderSurface + 'static,
    {
        config.validate()?;
        let weak: Weak<S> = Arc::downgrade(surface);
        let weak: Weak<dyn RenderSurface> = weak;
        Ok(Self {
            settings: SessionSettings::from_config(&config),
            notifier: RenderedNotifier::new(config.visible_alpha),
            core,
            config,
            surface: weak,
            phase: Phase::Empty,
            registry: ListenerRegistry::new(),
            mailbox: CallbackMailbox::new(),
            reporter: None,
            engines_created: 0,
        })
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Records `url` as the source for the next bind. Does not touch a bound
    /// engine.
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    pub fn prepare(&mut self, url: &str) {
        self.settings.url = Some(url.to_string());
        if matches!(self.phase, Phase::Released) {
            self.phase = Phase::Empty;
        }
        debug!("source prepared");
    }

    /// Binds an engine if needed and requests playback.
    ///
    /// Without a prepared url this reports [`SurfaceError::SourceUnresolved`]
    /// to the error reporter and returns `Ok(())` without doing anything.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::EngineBind`] if a new engine could not be wired up. The
    /// session is left released and the error is also reported.
    #[instrument(skip(self, provider), fields(engine = ?self.engine_id()))]
    pub fn resume(&mut self, provider: Option<&dyn MediaItemProvider>) -> Result<()> {
        if let Phase::Bound(binding) = &mut self.phase {
            binding.engine.set_play_when_ready(true);
            binding.intent = PlaybackIntent::Playing;
            debug!(engine = %binding.id, "resumed bound engine");
            return Ok(());
        }

        let Some(url) = self.settings.url.clone() else {
            warn!("resume called before prepare");
            self.report(&SurfaceError::SourceUnresolved);
            return Ok(());
        };
        self.bind(&url, provider, PlaybackIntent::Playing)
    }

    /// Sets the playback intent to paused. No-op when unbound.
    #[instrument(skip(self))]
    pub fn pause(&mut self) {
        if let Phase::Bound(binding) = &mut self.phase {
            binding.engine.set_play_when_ready(false);
            binding.intent = PlaybackIntent::Paused;
            debug!(engine = %binding.id, "paused");
        }
    }

    /// Seeks to the start and pauses. No-op when unbound.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        if let Phase::Bound(binding) = &mut self.phase {
            binding.engine.seek_to(Duration::ZERO);
            binding.engine.set_play_when_ready(false);
            binding.intent = PlaybackIntent::Paused;
            debug!(engine = %binding.id, "reset to start");
        }
    }

    /// Returns the bound engine, binding a paused one first if necessary.
    ///
    /// Returns `Ok(None)` when no url has been prepared; the unresolved
    /// source is reported as with [`resume`](Self::resume).
    ///
    /// # Errors
    ///
    /// [`SurfaceError::EngineBind`] if a new engine could not be wired up.
    #[instrument(skip(self, provider), fields(engine = ?self.engine_id()))]
    pub fn acquire(
        &mut self,
        provider: Option<&dyn MediaItemProvider>,
    ) -> Result<Option<&mut dyn VideoEngine>> {
        if !matches!(self.phase, Phase::Bound(_)) {
            let Some(url) = self.settings.url.clone() else {
                warn!("acquire called before prepare");
                self.report(&SurfaceError::SourceUnresolved);
                return Ok(None);
            };
            self.bind(&url, provider, PlaybackIntent::Paused)?;
        }
        Ok(self.engine_mut())
    }

    /// Pauses, detaches and releases the engine, leaving the session
    /// [`SessionState::Released`]. Without a live engine this is a no-op.
    #[instrument(skip(self), fields(engine = ?self.engine_id()))]
    pub fn release(&mut self) {
        match self.release_engine() {
            Some(id) => {
                info!(engine = %id, "engine released");
                self.emit(SurfaceEvent::Released { engine: id.get() });
            }
            None => trace!("no engine to release"),
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Changes the scale mode and re-applies the transform if a frame size is
    /// already known.
    #[instrument(skip(self), fields(mode = %mode))]
    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        self.settings.scale_mode = mode;
        self.apply_transform();
    }

    pub fn set_auto_release(&mut self, auto_release: bool) {
        self.settings.auto_release = auto_release;
    }

    pub fn set_video_rendered_listener(&mut self, listener: Option<Arc<dyn VideoRenderedListener>>) {
        self.notifier.set_listener(listener);
    }

    pub fn set_error_reporter(&mut self, reporter: Option<Arc<dyn ErrorReporter>>) {
        self.reporter = reporter;
    }

    /// Registers a telemetry listener for this and every future engine.
    /// Returns `false` if it was already registered.
    pub fn add_telemetry_listener(&mut self, listener: Arc<dyn TelemetryListener>) -> bool {
        if !self.registry.add(Arc::clone(&listener)) {
            return false;
        }
        if let Phase::Bound(binding) = &mut self.phase {
            binding.engine.add_telemetry_listener(listener);
        }
        true
    }

    /// Returns `false` if `listener` was not registered.
    pub fn remove_telemetry_listener(&mut self, listener: &Arc<dyn TelemetryListener>) -> bool {
        if !self.registry.remove(listener) {
            return false;
        }
        if let Phase::Bound(binding) = &mut self.phase {
            binding.engine.remove_telemetry_listener(listener);
        }
        true
    }

    pub fn clear_telemetry_listeners(&mut self) {
        let removed = self.registry.clear();
        if let Phase::Bound(binding) = &mut self.phase {
            for listener in &removed {
                binding.engine.remove_telemetry_listener(listener);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Host surface hooks
    // ------------------------------------------------------------------------

    /// Host hook: the surface left the UI tree.
    #[instrument(skip(self))]
    pub fn on_surface_detached(&mut self) {
        if self.settings.auto_release {
            self.release();
        } else {
            debug!("surface detached; auto-release disabled, keeping engine");
        }
    }

    /// Host hook: the surface was laid out with a new size.
    pub fn on_surface_resized(&mut self) {
        self.apply_transform();
    }

    // ------------------------------------------------------------------------
    // Engine callbacks
    // ------------------------------------------------------------------------

    /// Notified each time an engine queues a callback. Await it, then call
    /// [`dispatch_pending`](Self::dispatch_pending).
    pub fn callback_waker(&self) -> Arc<Notify> {
        self.mailbox.waker()
    }

    /// Number of engine callbacks waiting for [`dispatch_pending`](Self::dispatch_pending).
    pub fn pending_callbacks(&self) -> usize {
        self.mailbox.len()
    }

    /// Applies every queued engine callback. Returns how many came from the
    /// live engine.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(callback) = self.mailbox.try_next() {
            if self.handle_callback(callback) == CallbackDisposition::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Applies one engine callback if it came from the live engine.
    pub fn handle_callback(&mut self, callback: EngineCallback) -> CallbackDisposition {
        let EngineCallback { origin, event } = callback;
        let live = self.engine_id();
        if live != Some(origin) {
            trace!(origin = %origin, live = ?live, "discarding callback from stale engine");
            return CallbackDisposition::Stale;
        }

        match event {
            EngineEvent::PlaybackStateChanged(state) => {
                debug!(engine = %origin, %state, "playback state changed");
                self.emit(SurfaceEvent::PlaybackStateChanged {
                    engine: origin.get(),
                    state: state.to_string(),
                });
            }
            EngineEvent::IsPlayingChanged(playing) => {
                debug!(engine = %origin, playing, "is playing changed");
                self.emit(SurfaceEvent::IsPlayingChanged {
                    engine: origin.get(),
                    playing,
                });
            }
            EngineEvent::VideoSizeChanged(size) => {
                debug!(engine = %origin, width = size.width, height = size.height, "video size changed");
                if let Phase::Bound(binding) = &mut self.phase {
                    binding.frame_size = Some(size);
                }
                self.apply_transform();
            }
            EngineEvent::Error(failure) => {
                error!(engine = %origin, code = failure.code, message = %failure.message, "engine error");
                self.report(&SurfaceError::Playback {
                    engine: origin,
                    failure,
                });
            }
        }
        CallbackDisposition::Applied
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        match &self.phase {
            Phase::Empty => SessionState::Empty,
            Phase::Bound(binding) => SessionState::Bound {
                engine: binding.id,
                intent: binding.intent,
            },
            Phase::Released => SessionState::Released,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.settings.scale_mode
    }

    pub fn auto_release(&self) -> bool {
        self.settings.auto_release
    }

    /// Whether the current bind cycle has presented its first frame.
    pub fn is_prepared(&self) -> bool {
        matches!(self.phase, Phase::Bound(_)) && self.notifier.has_fired()
    }

    pub fn engine_id(&self) -> Option<EngineId> {
        match &self.phase {
            Phase::Bound(binding) => Some(binding.id),
            _ => None,
        }
    }

    /// Last frame size reported by the live engine.
    pub fn frame_size(&self) -> Option<PixelSize> {
        match &self.phase {
            Phase::Bound(binding) => binding.frame_size,
            _ => None,
        }
    }

    pub fn engine_mut(&mut self) -> Option<&mut dyn VideoEngine> {
        match &mut self.phase {
            Phase::Bound(binding) => Some(binding.engine.as_mut()),
            _ => None,
        }
    }

    pub fn telemetry_listeners(&self) -> &ListenerRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn bind(
        &mut self,
        url: &str,
        provider: Option<&dyn MediaItemProvider>,
        intent: PlaybackIntent,
    ) -> Result<()> {
        if let Some(stale) = self.release_engine() {
            warn!(engine = %stale, "released stale engine before bind");
        }

        let result = self.try_bind(url, provider, intent);
        if let Err(error) = &result {
            error!(url = %redact_url(url), %error, "engine bind failed");
            self.phase = Phase::Released;
            self.report(error);
        }
        result
    }

    fn try_bind(
        &mut self,
        url: &str,
        provider: Option<&dyn MediaItemProvider>,
        intent: PlaybackIntent,
    ) -> Result<()> {
        let surface = self.surface.upgrade().ok_or_else(|| {
            SurfaceError::bind(
                BindStage::AttachSurface,
                BridgeError::SurfaceGone("render surface was dropped".to_string()),
            )
        })?;

        let engine = self
            .core
            .engine_factory
            .create()
            .map_err(|e| SurfaceError::bind(BindStage::Construct, e))?;
        self.engines_created += 1;
        let id = EngineId::new(self.engines_created);

        let mut binding = Binding {
            id,
            engine,
            intent,
            listener: Arc::new(self.mailbox.listener_for(id)),
            debug_logger: None,
            frame_size: None,
            bound_at: self.core.clock.now(),
        };

        match self.wire(&mut binding, surface, url, provider) {
            Ok(items) => {
                self.phase = Phase::Bound(binding);
                self.notifier.arm();
                info!(engine = %id, items, url = %redact_url(url), ?intent, "engine bound");
                self.emit(SurfaceEvent::Bound {
                    engine: id.get(),
                    items,
                });
                Ok(())
            }
            Err(error) => {
                binding.teardown(&mut self.registry);
                Err(error)
            }
        }
    }

    /// Runs the bind steps in order. Returns the playlist length.
    fn wire(
        &mut self,
        binding: &mut Binding,
        surface: Arc<dyn RenderSurface>,
        url: &str,
        provider: Option<&dyn MediaItemProvider>,
    ) -> Result<usize> {
        surface.set_alpha(self.config.hidden_alpha);
        binding
            .engine
            .set_video_surface(Some(surface))
            .map_err(|e| SurfaceError::bind(BindStage::AttachSurface, e))?;

        binding.engine.add_listener(Arc::clone(&binding.listener));
        if self.config.debug_event_logging {
            let logger: Arc<dyn TelemetryListener> = Arc::new(TracingEventLogger::new(binding.id));
            binding.engine.add_telemetry_listener(Arc::clone(&logger));
            binding.debug_logger = Some(logger);
        }
        self.registry.attach_all(binding.id, binding.engine.as_mut());

        let items = self.resolve_items(url, provider);
        let count = items.len();
        binding
            .engine
            .set_media_items(items)
            .map_err(|e| SurfaceError::bind(BindStage::SetMediaItems, e))?;

        binding.engine.set_play_when_ready(binding.intent.play_when_ready());
        binding
            .engine
            .prepare()
            .map_err(|e| SurfaceError::bind(BindStage::Prepare, e))?;
        Ok(count)
    }

    fn resolve_items(&self, url: &str, provider: Option<&dyn MediaItemProvider>) -> Vec<MediaItem> {
        let provided = match provider {
            Some(provider) => provider.provide(url),
            None => self
                .core
                .media_item_provider
                .as_ref()
                .and_then(|provider| provider.provide(url)),
        };
        match provided {
            Some(items) if !items.is_empty() => items,
            _ => {
                debug!("no provider items, using url as the only media item");
                vec![MediaItem::from_uri(url)]
            }
        }
    }

    /// Tears down the live engine and moves to `Released`. Leaves any other
    /// phase untouched.
    fn release_engine(&mut self) -> Option<EngineId> {
        let binding = match std::mem::replace(&mut self.phase, Phase::Released) {
            Phase::Bound(binding) => binding,
            other => {
                self.phase = other;
                return None;
            }
        };
        let id = binding.id;
        binding.teardown(&mut self.registry);
        self.notifier.disarm();
        let dropped = self.mailbox.discard_all();
        if dropped > 0 {
            trace!(engine = %id, dropped, "discarded callbacks queued by released engine");
        }
        Some(id)
    }

    /// Recomputes and applies the content transform. Returns `false` when
    /// there is nothing to apply yet.
    fn apply_transform(&mut self) -> bool {
        let Phase::Bound(binding) = &self.phase else {
            return false;
        };
        let (id, bound_at) = (binding.id, binding.bound_at);
        let Some(frame) = binding.frame_size else {
            return false;
        };
        let Some(surface) = self.surface.upgrade() else {
            debug!(engine = %id, "surface dropped, skipping transform");
            return false;
        };

        let surface_size = surface.size();
        let mode = self.settings.scale_mode;
        let Some(matrix) = transform::try_compute(surface_size, frame, mode) else {
            debug!(surface = %surface_size, frame = %frame, "degenerate size, transform deferred");
            return false;
        };
        trace!(surface = %surface_size, frame = %frame, %mode, ?matrix, "applying transform");

        if self.notifier.present(surface.as_ref(), &matrix) {
            let elapsed = self.core.clock.millis_since(bound_at);
            info!(
                engine = %id,
                width = frame.width,
                height = frame.height,
                time_to_first_frame_ms = elapsed,
                "first frame rendered"
            );
            self.emit(SurfaceEvent::Rendered {
                engine: id.get(),
                width: frame.width,
                height: frame.height,
                time_to_first_frame_ms: elapsed,
            });
        }
        true
    }

    fn report(&self, error: &SurfaceError) {
        if let Some(reporter) = &self.reporter {
            reporter.report(error);
        }
        self.emit(SurfaceEvent::Error {
            engine: error.engine().map(EngineId::get),
            message: error.to_string(),
            recoverable: !error.is_fatal(),
        });
    }

    fn emit(&self, event: SurfaceEvent) {
        if let Some(bus) = &self.core.event_bus {
            // No subscribers is fine.
            let _ = bus.emit_surface(event);
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if let Some(id) = self.release_engine() {
            debug!(engine = %id, "released engine on session drop");
        }
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &self.state())
            .field("scale_mode", &self.settings.scale_mode)
            .field("auto_release", &self.settings.auto_release)
            .field("has_url", &self.settings.url.is_some())
            .field("registry", &self.registry)
            .field("notifier", &self.notifier)
            .finish()
    }
}
