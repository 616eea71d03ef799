//! Scale-mode transform calculation.
//!
//! The render surface stretches every decoded frame to its own bounds before
//! applying its content transform. The matrices computed here therefore map
//! *stretched* content onto the surface: [`ScaleMode::FitXY`] is the identity,
//! and the aspect-preserving modes undo the stretch on one axis and center the
//! result.

use crate::error::SurfaceError;
use bridge_traits::{PixelSize, TransformMatrix};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How decoded frames are fitted into the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Stretch to fill both dimensions. Aspect ratio is not preserved.
    #[serde(rename = "fit_xy")]
    FitXY,
    /// Scale uniformly until the frame fits, letterboxing the other axis.
    #[default]
    #[serde(rename = "fit_center")]
    FitCenter,
    /// Scale uniformly until the surface is covered, cropping the overflow.
    #[serde(rename = "center_crop")]
    CenterCrop,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 3] = [ScaleMode::FitXY, ScaleMode::FitCenter, ScaleMode::CenterCrop];

    /// Returns `true` if the mode keeps the frame's aspect ratio.
    pub fn preserves_aspect(self) -> bool {
        !matches!(self, ScaleMode::FitXY)
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScaleMode::FitXY => "fit_xy",
            ScaleMode::FitCenter => "fit_center",
            ScaleMode::CenterCrop => "center_crop",
        };
        f.write_str(name)
    }
}

/// Integer codes used by hosts that persist the mode as a layout attribute
/// (`0` fit-xy, `1` fit-center, `2` center-crop).
impl TryFrom<i32> for ScaleMode {
    type Error = SurfaceError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ScaleMode::FitXY),
            1 => Ok(ScaleMode::FitCenter),
            2 => Ok(ScaleMode::CenterCrop),
            other => Err(SurfaceError::InvalidConfig(format!(
                "unknown scale mode code {other}"
            ))),
        }
    }
}

impl From<ScaleMode> for i32 {
    fn from(mode: ScaleMode) -> Self {
        match mode {
            ScaleMode::FitXY => 0,
            ScaleMode::FitCenter => 1,
            ScaleMode::CenterCrop => 2,
        }
    }
}

/// Computes the surface content transform for `frame` shown in `surface`.
///
/// Both sizes must be non-empty; use [`try_compute`] when either may still be
/// zero.
///
/// # Examples
///
/// ```
/// use bridge_traits::{PixelSize, TransformMatrix};
/// use core_surface::transform::{compute, ScaleMode};
///
/// let m = compute(PixelSize::new(100, 200), PixelSize::new(50, 50), ScaleMode::FitCenter);
/// assert_eq!(m, TransformMatrix::new(1.0, 0.5, 0.0, 50.0));
/// ```
pub fn compute(surface: PixelSize, frame: PixelSize, mode: ScaleMode) -> TransformMatrix {
    debug_assert!(!surface.is_empty() && !frame.is_empty());

    let (w, h) = (surface.width as f32, surface.height as f32);
    let (vw, vh) = (frame.width as f32, frame.height as f32);
    let sx = w / vw;
    let sy = h / vh;

    match mode {
        ScaleMode::FitXY => TransformMatrix::IDENTITY,
        ScaleMode::FitCenter => {
            let s = sx.min(sy);
            let (tx, ty) = if sx > sy {
                ((w - vw * s) / 2.0, 0.0)
            } else {
                (0.0, (h - vh * s) / 2.0)
            };
            TransformMatrix::new(vw * s / w, vh * s / h, tx, ty)
        }
        ScaleMode::CenterCrop => {
            let s = sx.max(sy);
            let (tx, ty) = if sx < sy {
                ((w - vw * s) / 2.0, 0.0)
            } else {
                (0.0, (h - vh * s) / 2.0)
            };
            TransformMatrix::new(vw * s / w, vh * s / h, tx, ty)
        }
    }
}

/// Like [`compute`], but returns `None` while either size is degenerate.
pub fn try_compute(surface: PixelSize, frame: PixelSize, mode: ScaleMode) -> Option<TransformMatrix> {
    if surface.is_empty() || frame.is_empty() {
        return None;
    }
    Some(compute(surface, frame, mode))
}

/// Transform from raw frame pixels to surface pixels, for hosts that draw
/// frames themselves instead of relying on a pre-stretching surface.
pub fn frame_to_surface(surface: PixelSize, frame: PixelSize, mode: ScaleMode) -> TransformMatrix {
    let content = compute(surface, frame, mode);
    let stretch_x = surface.width as f32 / frame.width as f32;
    let stretch_y = surface.height as f32 / frame.height as f32;
    TransformMatrix::new(
        content.scale_x * stretch_x,
        content.scale_y * stretch_y,
        content.translate_x,
        content.translate_y,
    )
}

/// Rectangle, in surface pixels, that the frame occupies after the transform.
/// Extends past the surface bounds for [`ScaleMode::CenterCrop`].
pub fn content_rect(surface: PixelSize, frame: PixelSize, mode: ScaleMode) -> Rect {
    let bounds = Rect::new(0.0, 0.0, surface.width as f64, surface.height as f64);
    compute(surface, frame, mode).map_rect(bounds)
}
