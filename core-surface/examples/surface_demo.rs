//! Session lifecycle demonstration
//!
//! Drives a playback session against an in-process engine that "decodes" a
//! frame on a background thread, and prints the resulting transforms.
//!
//! Run with:
//! ```bash
//! cargo run -p core-surface --example surface_demo
//!
//! # JSON logs, center-crop
//! cargo run -p core-surface --example surface_demo -- json center_crop
//! ```

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::time::LogLevel;
use bridge_traits::{
    EngineFactory, EngineListener, EngineState, MediaItem, PixelSize, RenderSurface,
    TelemetryEvent, TelemetryListener, TransformMatrix, VideoEngine,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_surface::{PlaybackSession, ScaleMode, SurfaceConfig, VideoRenderedListener};
use std::env;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::info;

/// Engine that reports a 1920x1080 frame from a worker thread once prepared.
#[derive(Default)]
struct ThreadedEngine {
    listeners: Vec<Arc<dyn EngineListener>>,
    telemetry: Vec<Arc<dyn TelemetryListener>>,
    play_when_ready: bool,
    worker: Option<JoinHandle<()>>,
}

impl VideoEngine for ThreadedEngine {
    fn set_media_items(&mut self, items: Vec<MediaItem>) -> BridgeResult<()> {
        info!(count = items.len(), "demo engine received playlist");
        Ok(())
    }

    fn prepare(&mut self) -> BridgeResult<()> {
        let listeners = self.listeners.clone();
        let telemetry = self.telemetry.clone();
        self.worker = Some(std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            for listener in &listeners {
                listener.on_playback_state_changed(EngineState::Ready);
                listener.on_video_size_changed(PixelSize::new(1920, 1080));
            }
            for listener in &telemetry {
                listener.on_event(&TelemetryEvent::new("firstFrame").with_position_ms(0));
            }
        }));
        Ok(())
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
    }

    fn seek_to(&mut self, _position: Duration) {}

    fn set_video_surface(&mut self, _surface: Option<Arc<dyn RenderSurface>>) -> BridgeResult<()> {
        Ok(())
    }

    fn add_listener(&mut self, listener: Arc<dyn EngineListener>) {
        self.listeners.push(listener);
    }

    fn remove_listener(&mut self, listener: &Arc<dyn EngineListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    fn add_telemetry_listener(&mut self, listener: Arc<dyn TelemetryListener>) {
        self.telemetry.push(listener);
    }

    fn remove_telemetry_listener(&mut self, listener: &Arc<dyn TelemetryListener>) {
        self.telemetry.retain(|l| !Arc::ptr_eq(l, listener));
    }

    fn release(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.listeners.clear();
        self.telemetry.clear();
    }
}

struct ThreadedFactory;

impl EngineFactory for ThreadedFactory {
    fn create(&self) -> BridgeResult<Box<dyn VideoEngine>> {
        Ok(Box::<ThreadedEngine>::default())
    }
}

/// Portrait phone-sized surface that prints what it is asked to do.
struct PrintingSurface {
    transform: Mutex<TransformMatrix>,
}

impl RenderSurface for PrintingSurface {
    fn size(&self) -> PixelSize {
        PixelSize::new(1080, 1920)
    }

    fn set_transform(&self, matrix: &TransformMatrix) {
        println!("  transform -> {:?}", matrix.to_row_major());
        if let Ok(mut current) = self.transform.lock() {
            *current = *matrix;
        }
    }

    fn set_alpha(&self, alpha: f32) {
        println!("  alpha     -> {alpha}");
    }
}

struct PrintRendered;

impl VideoRenderedListener for PrintRendered {
    fn on_rendered(&self, surface: &dyn RenderSurface) {
        println!("  rendered on {} surface", surface.size());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::Compact,
    };
    let mode = match args.get(2).map(String::as_str) {
        Some("center_crop") => ScaleMode::CenterCrop,
        Some("fit_xy") => ScaleMode::FitXY,
        _ => ScaleMode::FitCenter,
    };

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )?;

    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let core = CoreConfig::builder()
        .engine_factory(Arc::new(ThreadedFactory))
        .event_bus(bus)
        .build()?;

    let surface = Arc::new(PrintingSurface {
        transform: Mutex::new(TransformMatrix::IDENTITY),
    });
    let config = SurfaceConfig::default()
        .with_scale_mode(mode)
        .with_debug_event_logging(true);
    let mut session = PlaybackSession::new(core, config, &surface)?;
    session.set_video_rendered_listener(Some(Arc::new(PrintRendered)));

    println!("== resume ({mode})");
    session.prepare("https://cdn.example.com/v/demo.mp4?sig=secret");
    session.resume(None)?;

    // Stand-in for the host's UI loop.
    while !session.is_prepared() {
        std::thread::sleep(Duration::from_millis(5));
        session.dispatch_pending();
    }

    println!("== switch to center crop");
    session.set_scale_mode(ScaleMode::CenterCrop);

    println!("== release");
    session.release();

    while let Ok(CoreEvent::Surface(event)) = events.try_recv() {
        println!("  event: {event:?}");
    }
    Ok(())
}
