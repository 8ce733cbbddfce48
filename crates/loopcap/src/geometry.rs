//! Capture geometry and crop-rectangle coordinate handling.
//!
//! A crop rectangle is drawn in *display* space: the live preview may be
//! rendered at a different size than the source's native resolution, so the
//! rectangle must be scaled by `source / display` independently per axis
//! before it means anything in pixel terms.

use serde::{Deserialize, Serialize};

/// Native pixel dimensions of the capture source.
///
/// Queried once from the source when recording starts and fixed for the
/// lifetime of one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureGeometry {
    /// Source width in pixels
    pub width: u32,
    /// Source height in pixels
    pub height: u32,
}

impl CaptureGeometry {
    /// Create a new capture geometry
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A crop rectangle in display coordinate space.
///
/// Coordinates are fractional because the preview may be scaled by a
/// non-integer factor relative to the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge in display pixels
    pub x: f64,
    /// Top edge in display pixels
    pub y: f64,
    /// Width in display pixels
    pub width: f64,
    /// Height in display pixels
    pub height: f64,
}

impl CropRegion {
    /// Create a new crop region in display space
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translate this display-space rectangle into source pixel space.
    ///
    /// Each axis is scaled independently by `source / display`, because the
    /// preview aspect may not match the source exactly. The result is
    /// rounded to whole pixels; callers clamp it to the source bounds via
    /// [`SourceRect::clamp_to`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_source(
        &self,
        display_width: f64,
        display_height: f64,
        geometry: CaptureGeometry,
    ) -> SourceRect {
        let scale_x = f64::from(geometry.width) / display_width.max(1.0);
        let scale_y = f64::from(geometry.height) / display_height.max(1.0);

        SourceRect {
            x: (self.x * scale_x).round().max(0.0) as u32,
            y: (self.y * scale_y).round().max(0.0) as u32,
            width: (self.width * scale_x).round().max(1.0) as u32,
            height: (self.height * scale_y).round().max(1.0) as u32,
        }
    }
}

/// A rectangle in source pixel space, ready for the transform stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRect {
    /// Left edge in source pixels
    pub x: u32,
    /// Top edge in source pixels
    pub y: u32,
    /// Width in source pixels
    pub width: u32,
    /// Height in source pixels
    pub height: u32,
}

impl SourceRect {
    /// Create a new source-space rectangle
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full-frame rectangle for the given geometry
    #[must_use]
    pub const fn full(geometry: CaptureGeometry) -> Self {
        Self {
            x: 0,
            y: 0,
            width: geometry.width,
            height: geometry.height,
        }
    }

    /// Clamp this rectangle into the source bounds.
    ///
    /// A rectangle that partially exceeds the bounds is shrunk to fit; one
    /// that starts past the bounds collapses to a 1x1 rectangle at the
    /// nearest edge. Clamping never fails, even against a zero-area
    /// geometry, where the result degenerates to a 1x1 rectangle at the
    /// origin.
    #[must_use]
    pub fn clamp_to(&self, geometry: CaptureGeometry) -> Self {
        let x = self.x.min(geometry.width.saturating_sub(1));
        let y = self.y.min(geometry.height.saturating_sub(1));
        let width = self.width.clamp(1, (geometry.width - x).max(1));
        let height = self.height.clamp(1, (geometry.height - y).max(1));
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod crop_translation_tests {
        use super::*;

        #[test]
        fn test_identity_scale() {
            // Preview rendered at native resolution: no scaling
            let geometry = CaptureGeometry::new(1920, 1080);
            let crop = CropRegion::new(100.0, 50.0, 400.0, 300.0);

            let rect = crop.to_source(1920.0, 1080.0, geometry);
            assert_eq!(rect, SourceRect::new(100, 50, 400, 300));
        }

        #[test]
        fn test_preview_scaled_down() {
            // Preview at half size: display coords double into source space
            let geometry = CaptureGeometry::new(1920, 1080);
            let crop = CropRegion::new(100.0, 50.0, 400.0, 300.0);

            let rect = crop.to_source(960.0, 540.0, geometry);
            assert_eq!(rect, SourceRect::new(200, 100, 800, 600));
        }

        #[test]
        fn test_independent_axis_scaling() {
            // Display aspect differs from source aspect
            let geometry = CaptureGeometry::new(1000, 1000);
            let crop = CropRegion::new(50.0, 50.0, 100.0, 100.0);

            let rect = crop.to_source(500.0, 250.0, geometry);
            assert_eq!(rect, SourceRect::new(100, 200, 200, 400));
        }

        #[test]
        fn test_fractional_coordinates_round() {
            let geometry = CaptureGeometry::new(100, 100);
            let crop = CropRegion::new(10.4, 10.6, 20.5, 20.4);

            let rect = crop.to_source(100.0, 100.0, geometry);
            assert_eq!(rect.x, 10);
            assert_eq!(rect.y, 11);
        }

        #[test]
        fn test_zero_sized_crop_becomes_one_pixel() {
            let geometry = CaptureGeometry::new(100, 100);
            let crop = CropRegion::new(10.0, 10.0, 0.0, 0.0);

            let rect = crop.to_source(100.0, 100.0, geometry);
            assert_eq!(rect.width, 1);
            assert_eq!(rect.height, 1);
        }
    }

    mod clamp_tests {
        use super::*;

        #[test]
        fn test_in_bounds_unchanged() {
            let geometry = CaptureGeometry::new(640, 480);
            let rect = SourceRect::new(10, 10, 100, 100);
            assert_eq!(rect.clamp_to(geometry), rect);
        }

        #[test]
        fn test_overhanging_rect_shrinks() {
            let geometry = CaptureGeometry::new(640, 480);
            let rect = SourceRect::new(600, 450, 100, 100);

            let clamped = rect.clamp_to(geometry);
            assert_eq!(clamped, SourceRect::new(600, 450, 40, 30));
        }

        #[test]
        fn test_rect_past_bounds_collapses_to_edge() {
            let geometry = CaptureGeometry::new(640, 480);
            let rect = SourceRect::new(10_000, 10_000, 50, 50);

            let clamped = rect.clamp_to(geometry);
            assert_eq!(clamped.x, 639);
            assert_eq!(clamped.y, 479);
            assert_eq!(clamped.width, 1);
            assert_eq!(clamped.height, 1);
        }

        #[test]
        fn test_zero_area_geometry_degenerates_without_panic() {
            let geometry = CaptureGeometry::new(0, 0);
            let clamped = SourceRect::full(geometry).clamp_to(geometry);
            assert_eq!(clamped, SourceRect::new(0, 0, 1, 1));

            let clamped = SourceRect::new(5, 5, 10, 10).clamp_to(geometry);
            assert_eq!(clamped, SourceRect::new(0, 0, 1, 1));
        }

        #[test]
        fn test_full_rect_is_already_clamped() {
            let geometry = CaptureGeometry::new(800, 600);
            let rect = SourceRect::full(geometry);
            assert_eq!(rect.clamp_to(geometry), rect);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_clamped_rect_always_in_bounds(
                x in 0u32..10_000,
                y in 0u32..10_000,
                w in 0u32..10_000,
                h in 0u32..10_000,
                gw in 1u32..4096,
                gh in 1u32..4096
            ) {
                let geometry = CaptureGeometry::new(gw, gh);
                let clamped = SourceRect::new(x, y, w, h).clamp_to(geometry);

                prop_assert!(clamped.x + clamped.width <= gw);
                prop_assert!(clamped.y + clamped.height <= gh);
                prop_assert!(clamped.width >= 1);
                prop_assert!(clamped.height >= 1);
            }

            #[test]
            fn prop_translation_never_produces_zero_size(
                x in 0.0f64..500.0,
                y in 0.0f64..500.0,
                w in 0.0f64..500.0,
                h in 0.0f64..500.0
            ) {
                let geometry = CaptureGeometry::new(1920, 1080);
                let rect = CropRegion::new(x, y, w, h).to_source(500.0, 500.0, geometry);

                prop_assert!(rect.width >= 1);
                prop_assert!(rect.height >= 1);
            }
        }
    }
}
