//! The frame source capability.
//!
//! Acquisition itself (display grab, camera, synthetic test pattern) lives
//! outside this crate; the pipeline only needs a native geometry and a way
//! to pull one complete RGBA raster on demand.

use crate::geometry::CaptureGeometry;
use crate::result::LoopcapResult;
use async_trait::async_trait;
use image::RgbaImage;

/// A live raster source the sampler can pull snapshots from.
///
/// Implementations must report a fixed native geometry for the lifetime of
/// one recording, and every snapshot must be a complete RGBA raster at that
/// geometry.
#[async_trait]
pub trait FrameSource: Send {
    /// Native pixel dimensions of the source, or `None` if the source
    /// cannot be acquired (the sampler then fails with
    /// [`LoopcapError::CaptureUnavailable`](crate::LoopcapError::CaptureUnavailable)).
    fn geometry(&self) -> Option<CaptureGeometry>;

    /// Produce one raster snapshot.
    async fn snapshot(&mut self) -> LoopcapResult<RgbaImage>;
}
