//! Video engine bridge traits and supporting types.
//!
//! These abstractions let the surface controller drive a platform playback
//! engine (ExoPlayer, AVPlayer, GStreamer, an `HtmlVideoElement` shim) without
//! knowing anything about its decoding or buffering pipeline. Hosts provide
//! concrete implementations; the core only ever talks to the traits below.
//!
//! Engines deliver [`EngineListener`] callbacks from their own internal
//! threads, which is why every object handed to an engine is `Send + Sync`.

use crate::error::Result;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Width and height in pixels. Either dimension may be zero while a surface is
/// still being laid out or before an engine has decoded its first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Scale + translate affine transform applied by a [`RenderSurface`] to the
/// content it displays.
///
/// Surfaces stretch decoded frames to their own bounds before applying the
/// transform, so [`TransformMatrix::IDENTITY`] means "fill the surface".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformMatrix {
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl TransformMatrix {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub const fn new(scale_x: f32, scale_y: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale_x,
            scale_y,
            translate_x,
            translate_y,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Row-major 2x3 coefficients `[sx, 0, tx, 0, sy, ty]`, the layout used by
    /// Android's `Matrix.setValues` and CSS `matrix()` after transposition.
    pub fn to_row_major(&self) -> [f32; 6] {
        [
            self.scale_x,
            0.0,
            self.translate_x,
            0.0,
            self.scale_y,
            self.translate_y,
        ]
    }

    pub fn to_affine(&self) -> Affine {
        Affine::new([
            f64::from(self.scale_x),
            0.0,
            0.0,
            f64::from(self.scale_y),
            f64::from(self.translate_x),
            f64::from(self.translate_y),
        ])
    }

    pub fn map_point(&self, point: Point) -> Point {
        self.to_affine() * point
    }

    /// Bounding box of `rect` after the transform. Exact, since the transform
    /// never rotates or skews.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        self.to_affine().transform_rect_bbox(rect)
    }
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<TransformMatrix> for Affine {
    fn from(matrix: TransformMatrix) -> Self {
        matrix.to_affine()
    }
}

/// A playable item handed to the engine's playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItem {
    pub uri: String,
    /// Optional stable identifier (e.g. for analytics correlation).
    pub media_id: Option<String>,
    /// Container hint such as `application/x-mpegURL`.
    pub mime_type: Option<String>,
}

impl MediaItem {
    /// Item built straight from a url, with no extra hints.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            media_id: None,
            mime_type: None,
        }
    }

    pub fn with_media_id(mut self, media_id: impl Into<String>) -> Self {
        self.media_id = Some(media_id.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Engine buffering state as reported through
/// [`EngineListener::on_playback_state_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Buffering => "buffering",
            EngineState::Ready => "ready",
            EngineState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Opaque runtime failure reported by an engine after a successful bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFailure {
    /// Engine-specific error code.
    pub code: i32,
    pub message: String,
}

impl EngineFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// A single analytics/telemetry record emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Event name, e.g. `droppedFrames` or `bandwidthEstimate`.
    pub name: String,
    /// Playback position when the event was produced, if known.
    pub position_ms: Option<u64>,
    pub fields: HashMap<String, String>,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_position_ms(mut self, position_ms: u64) -> Self {
        self.position_ms = Some(position_ms);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Drawable target the engine renders decoded frames into. Owned by the host
/// UI layer.
pub trait RenderSurface: Send + Sync {
    /// Current laid-out size. May be zero before layout.
    fn size(&self) -> PixelSize;

    /// Replace the content transform.
    fn set_transform(&self, matrix: &TransformMatrix);

    /// Content opacity, `0.0..=1.0`.
    fn set_alpha(&self, alpha: f32);

    /// Request a redraw after the transform changed.
    fn invalidate(&self) {}
}

/// Receives engine state callbacks. Invoked from engine-internal threads.
pub trait EngineListener: Send + Sync {
    fn on_playback_state_changed(&self, state: EngineState);

    fn on_is_playing_changed(&self, _playing: bool) {}

    fn on_video_size_changed(&self, size: PixelSize);

    fn on_player_error(&self, failure: EngineFailure);
}

/// Receives analytics events from an engine. Membership in listener sets is by
/// `Arc` identity.
pub trait TelemetryListener: Send + Sync {
    fn on_event(&self, event: &TelemetryEvent);
}

/// A live playback engine instance.
///
/// Implementations must make [`VideoEngine::release`] idempotent and must stop
/// delivering listener callbacks once it returns.
pub trait VideoEngine: Send {
    /// Replace the playlist.
    fn set_media_items(&mut self, items: Vec<MediaItem>) -> Result<()>;

    /// Start asynchronous preparation of the current playlist.
    fn prepare(&mut self) -> Result<()>;

    /// Current playback intent.
    fn play_when_ready(&self) -> bool;

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn seek_to(&mut self, position: Duration);

    /// Bind (`Some`) or unbind (`None`) the render target.
    fn set_video_surface(&mut self, surface: Option<Arc<dyn RenderSurface>>) -> Result<()>;

    fn add_listener(&mut self, listener: Arc<dyn EngineListener>);

    fn remove_listener(&mut self, listener: &Arc<dyn EngineListener>);

    fn add_telemetry_listener(&mut self, listener: Arc<dyn TelemetryListener>);

    fn remove_telemetry_listener(&mut self, listener: &Arc<dyn TelemetryListener>);

    /// Free every native resource held by the engine.
    fn release(&mut self);
}

/// Builds fresh engine instances.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn VideoEngine>>;
}

/// Resolves a url into the playlist handed to the engine. Returning `None` or
/// an empty list selects the single default item built from the url.
pub trait MediaItemProvider: Send + Sync {
    fn provide(&self, url: &str) -> Option<Vec<MediaItem>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_empty_when_any_dimension_is_zero() {
        assert!(PixelSize::new(0, 10).is_empty());
        assert!(PixelSize::new(10, 0).is_empty());
        assert!(PixelSize::default().is_empty());
        assert!(!PixelSize::new(1, 1).is_empty());
        assert_eq!(PixelSize::new(1920, 1080).to_string(), "1920x1080");
    }

    #[test]
    fn identity_maps_points_onto_themselves() {
        let p = Point::new(12.0, 34.0);
        assert!(TransformMatrix::default().is_identity());
        assert_eq!(TransformMatrix::IDENTITY.map_point(p), p);
    }

    #[test]
    fn map_rect_scales_then_translates() {
        let matrix = TransformMatrix::new(1.0, 0.5, 0.0, 50.0);
        let mapped = matrix.map_rect(Rect::new(0.0, 0.0, 100.0, 200.0));
        assert_eq!(mapped, Rect::new(0.0, 50.0, 100.0, 150.0));
    }

    #[test]
    fn row_major_layout_matches_affine_coefficients() {
        let matrix = TransformMatrix::new(2.0, 1.0, -50.0, 0.0);
        assert_eq!(matrix.to_row_major(), [2.0, 0.0, -50.0, 0.0, 1.0, 0.0]);
        let affine: Affine = matrix.into();
        assert_eq!(affine.as_coeffs(), [2.0, 0.0, 0.0, 1.0, -50.0, 0.0]);
    }

    #[test]
    fn media_item_builders() {
        let item = MediaItem::from_uri("https://cdn.example/v.m3u8")
            .with_media_id("clip-1")
            .with_mime_type("application/x-mpegURL");
        assert_eq!(item.uri, "https://cdn.example/v.m3u8");
        assert_eq!(item.media_id.as_deref(), Some("clip-1"));
        assert_eq!(item.mime_type.as_deref(), Some("application/x-mpegURL"));
    }

    #[test]
    fn engine_failure_display_includes_code() {
        let failure = EngineFailure::new(4001, "decoder init failed");
        assert_eq!(failure.to_string(), "decoder init failed (code 4001)");
        assert_eq!(EngineState::Buffering.to_string(), "buffering");
    }
}
