//! The crop + resize compositing stage applied to each frame before
//! encoding.
//!
//! Compositing happens in two stages: the frame is first placed onto an
//! intermediate buffer sized to the full source geometry, and the crop
//! rectangle is then sampled from that buffer. A crop that touches the
//! frame edges must read real pixel data, not an extrapolated fill, which
//! is why the full-geometry buffer exists even when the crop is interior.

use crate::frame::Frame;
use crate::geometry::{CaptureGeometry, SourceRect};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Output dimensions for one export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl TargetSize {
    /// Create a new target size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Derive a target from an output width, preserving the source aspect
    /// ratio.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_width(geometry: CaptureGeometry, width: u32) -> Self {
        let scale = f64::from(width) / f64::from(geometry.width.max(1));
        let height = (scale * f64::from(geometry.height)).round().max(1.0) as u32;
        Self { width, height }
    }
}

/// Crop `rect` out of `frame` and resample it to `target`.
///
/// The rectangle is clamped into the source bounds rather than rejected; if
/// clamping shrank it, the requested target is scaled down proportionally
/// per axis so the output never exceeds `target` and no pixels are
/// invented. Resampling uses a triangle (bilinear) filter, which is the
/// identity for a 1:1 scale.
#[must_use]
pub fn transform(
    frame: &Frame,
    geometry: CaptureGeometry,
    rect: SourceRect,
    target: TargetSize,
) -> RgbaImage {
    // Stage one: composite onto a buffer at the full source geometry so
    // edge-touching crops read real pixels.
    let mut canvas = RgbaImage::new(geometry.width, geometry.height);
    imageops::replace(&mut canvas, &frame.pixels, 0, 0);

    // Stage two: clamp, crop, resample.
    let clamped = rect.clamp_to(geometry);
    let cropped = imageops::crop_imm(
        &canvas,
        clamped.x,
        clamped.y,
        clamped.width,
        clamped.height,
    )
    .to_image();

    let effective = effective_target(rect, clamped, target);
    if cropped.dimensions() == (effective.width, effective.height) {
        return cropped;
    }
    imageops::resize(&cropped, effective.width, effective.height, FilterType::Triangle)
}

/// Scale the requested target down by however much clamping shrank the
/// crop rectangle, independently per axis.
fn effective_target(requested: SourceRect, clamped: SourceRect, target: TargetSize) -> TargetSize {
    let scale = |t: u32, clamped_dim: u32, requested_dim: u32| -> u32 {
        if clamped_dim >= requested_dim {
            return t;
        }
        let scaled =
            u64::from(t) * u64::from(clamped_dim) / u64::from(requested_dim.max(1));
        u32::try_from(scaled).unwrap_or(t).max(1)
    };

    TargetSize {
        width: scale(target.width, clamped.width, requested.width),
        height: scale(target.height, clamped.height, requested.height),
    }
}
