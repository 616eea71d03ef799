//! Recording fakes shared by the session integration tests.

#![allow(dead_code)]

use bridge_traits::error::Result;
use bridge_traits::{
    BridgeError, EngineFactory, EngineListener, ManualClock, MediaItem, MediaItemProvider,
    PixelSize, RenderSurface, TelemetryEvent, TelemetryListener, TransformMatrix, VideoEngine,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, SurfaceEvent};
use core_surface::{
    BindStage, ErrorReporter, PlaybackSession, SurfaceConfig, SurfaceError, VideoRenderedListener,
};
use mockall::mock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

// ============================================================================
// Fake Engine
// ============================================================================

/// Everything a [`FakeEngine`] was asked to do.
#[derive(Default)]
pub struct EngineRecord {
    pub calls: Vec<String>,
    pub items: Vec<MediaItem>,
    pub play_when_ready: bool,
    pub surface_attached: bool,
    pub listeners: Vec<Arc<dyn EngineListener>>,
    pub telemetry: Vec<Arc<dyn TelemetryListener>>,
    pub seeks: Vec<Duration>,
    pub release_count: usize,
}

impl EngineRecord {
    pub fn released(&self) -> bool {
        self.release_count > 0
    }

    pub fn position_of(&self, call: &str) -> Option<usize> {
        self.calls.iter().position(|c| c.starts_with(call))
    }
}

pub type EngineHandle = Arc<Mutex<EngineRecord>>;

fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

pub struct FakeEngine {
    record: EngineHandle,
    fail_at: Option<BindStage>,
}

impl VideoEngine for FakeEngine {
    fn set_media_items(&mut self, items: Vec<MediaItem>) -> Result<()> {
        let mut record = self.record.lock();
        record.calls.push(format!("set_media_items({})", items.len()));
        if self.fail_at == Some(BindStage::SetMediaItems) {
            return Err(BridgeError::OperationFailed("unsupported container".into()));
        }
        record.items = items;
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        self.record.lock().calls.push("prepare".into());
        if self.fail_at == Some(BindStage::Prepare) {
            return Err(BridgeError::OperationFailed("no decoder for codec".into()));
        }
        Ok(())
    }

    fn play_when_ready(&self) -> bool {
        self.record.lock().play_when_ready
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        let mut record = self.record.lock();
        record.calls.push(format!("set_play_when_ready({play_when_ready})"));
        record.play_when_ready = play_when_ready;
    }

    fn seek_to(&mut self, position: Duration) {
        let mut record = self.record.lock();
        record.calls.push("seek_to".into());
        record.seeks.push(position);
    }

    fn set_video_surface(&mut self, surface: Option<Arc<dyn RenderSurface>>) -> Result<()> {
        let mut record = self.record.lock();
        record.calls.push(format!("set_video_surface({})", surface.is_some()));
        if surface.is_some() && self.fail_at == Some(BindStage::AttachSurface) {
            return Err(BridgeError::SurfaceGone("surface not ready".into()));
        }
        record.surface_attached = surface.is_some();
        Ok(())
    }

    fn add_listener(&mut self, listener: Arc<dyn EngineListener>) {
        let mut record = self.record.lock();
        record.calls.push("add_listener".into());
        record.listeners.push(listener);
    }

    fn remove_listener(&mut self, listener: &Arc<dyn EngineListener>) {
        let mut record = self.record.lock();
        record.calls.push("remove_listener".into());
        record.listeners.retain(|l| !same(l, listener));
    }

    fn add_telemetry_listener(&mut self, listener: Arc<dyn TelemetryListener>) {
        let mut record = self.record.lock();
        record.calls.push("add_telemetry_listener".into());
        record.telemetry.push(listener);
    }

    fn remove_telemetry_listener(&mut self, listener: &Arc<dyn TelemetryListener>) {
        let mut record = self.record.lock();
        record.calls.push("remove_telemetry_listener".into());
        record.telemetry.retain(|l| !same(l, listener));
    }

    fn release(&mut self) {
        let mut record = self.record.lock();
        record.calls.push("release".into());
        record.release_count += 1;
    }
}

/// Factory that hands out [`FakeEngine`]s and keeps a handle on each.
#[derive(Default)]
pub struct FakeFactory {
    engines: Mutex<Vec<EngineHandle>>,
    fail_at: Mutex<Option<BindStage>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every subsequently created engine fail at `stage`.
    pub fn fail_at(&self, stage: Option<BindStage>) {
        *self.fail_at.lock() = stage;
    }

    pub fn created(&self) -> usize {
        self.engines.lock().len()
    }

    /// Engines created and not yet released.
    pub fn live(&self) -> usize {
        self.engines.lock().iter().filter(|e| !e.lock().released()).count()
    }

    pub fn engine(&self, index: usize) -> EngineHandle {
        Arc::clone(&self.engines.lock()[index])
    }

    /// The session's callback listener registered on engine `index`.
    pub fn listener(&self, index: usize) -> Arc<dyn EngineListener> {
        Arc::clone(&self.engine(index).lock().listeners[0])
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self) -> Result<Box<dyn VideoEngine>> {
        let fail_at = *self.fail_at.lock();
        if fail_at == Some(BindStage::Construct) {
            return Err(BridgeError::NotAvailable("codec pool exhausted".into()));
        }
        let record = EngineHandle::default();
        self.engines.lock().push(Arc::clone(&record));
        Ok(Box::new(FakeEngine { record, fail_at }))
    }
}

// ============================================================================
// Fake Surface
// ============================================================================

pub struct FakeSurface {
    size: Mutex<PixelSize>,
    pub transforms: Mutex<Vec<TransformMatrix>>,
    pub alphas: Mutex<Vec<f32>>,
    pub invalidations: AtomicUsize,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(PixelSize::new(width, height)),
            transforms: Mutex::new(Vec::new()),
            alphas: Mutex::new(Vec::new()),
            invalidations: AtomicUsize::new(0),
        })
    }

    pub fn resize(&self, width: u32, height: u32) {
        *self.size.lock() = PixelSize::new(width, height);
    }

    pub fn last_transform(&self) -> Option<TransformMatrix> {
        self.transforms.lock().last().copied()
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.lock().len()
    }

    pub fn alphas(&self) -> Vec<f32> {
        self.alphas.lock().clone()
    }
}

impl RenderSurface for FakeSurface {
    fn size(&self) -> PixelSize {
        *self.size.lock()
    }

    fn set_transform(&self, matrix: &TransformMatrix) {
        self.transforms.lock().push(*matrix);
    }

    fn set_alpha(&self, alpha: f32) {
        self.alphas.lock().push(alpha);
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Listeners
// ============================================================================

#[derive(Default)]
pub struct RenderedCounter {
    calls: AtomicUsize,
}

impl RenderedCounter {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VideoRenderedListener for RenderedCounter {
    fn on_rendered(&self, _surface: &dyn RenderSurface) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct TelemetryCounter {
    pub events: Mutex<Vec<String>>,
}

impl TelemetryListener for TelemetryCounter {
    fn on_event(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.name.clone());
    }
}

mock! {
    pub Reporter {}
    impl ErrorReporter for Reporter {
        fn report(&self, error: &SurfaceError);
    }
}

mock! {
    pub Provider {}
    impl MediaItemProvider for Provider {
        fn provide(&self, url: &str) -> Option<Vec<MediaItem>>;
    }
}

// ============================================================================
// Harness
// ============================================================================

pub const CLIP_URL: &str = "https://cdn.example.com/v/clip.mp4?token=abc";

pub struct Harness {
    pub factory: Arc<FakeFactory>,
    pub surface: Arc<FakeSurface>,
    pub clock: Arc<ManualClock>,
    pub bus: EventBus,
    pub events: Receiver<CoreEvent>,
    pub session: PlaybackSession,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(SurfaceConfig::default(), FakeSurface::new(100, 200), None)
    }

    pub fn with_config(config: SurfaceConfig) -> Self {
        Self::with(config, FakeSurface::new(100, 200), None)
    }

    pub fn with(
        config: SurfaceConfig,
        surface: Arc<FakeSurface>,
        provider: Option<Arc<dyn MediaItemProvider>>,
    ) -> Self {
        let factory = FakeFactory::new();
        let clock = Arc::new(ManualClock::default());
        let bus = EventBus::new(32);
        let events = bus.subscribe();

        let mut builder = CoreConfig::builder()
            .engine_factory(factory.clone())
            .event_bus(bus.clone())
            .clock(clock.clone());
        if let Some(provider) = provider {
            builder = builder.media_item_provider(provider);
        }
        let core = builder.build().expect("core config");
        let session = PlaybackSession::new(core, config, &surface).expect("session");

        Self {
            factory,
            surface,
            clock,
            bus,
            events,
            session,
        }
    }

    /// Prepares the default clip and resumes.
    pub fn bound(mut self) -> Self {
        self.session.prepare(CLIP_URL);
        self.session.resume(None).expect("bind");
        self
    }

    /// Delivers a frame size from engine `index` and dispatches it.
    pub fn frame(&mut self, index: usize, width: u32, height: u32) -> usize {
        self.factory
            .listener(index)
            .on_video_size_changed(PixelSize::new(width, height));
        self.session.dispatch_pending()
    }

    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        let mut out = Vec::new();
        while let Ok(CoreEvent::Surface(event)) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
