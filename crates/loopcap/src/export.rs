//! The export orchestrator: walk a frame buffer, transform each frame,
//! drive an encoder to completion, report progress, and yield to the host
//! scheduler between frames.
//!
//! Frames are processed strictly in buffer order, one at a time; the host
//! is never blocked for longer than one frame's transform-plus-encode time
//! because the orchestrator yields after every frame. Cancellation is
//! checked at the same per-frame boundary and discards the partially-fed
//! encoder (encoders are single-use, so there is nothing to resume).

use crate::encode::{EncodedArtifact, Encoder, ImageFormat};
use crate::frame::FrameBuffer;
use crate::geometry::{CaptureGeometry, SourceRect};
use crate::result::{LoopcapError, LoopcapResult};
use crate::sampler::Recording;
use crate::transform::{transform, TargetSize};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Parameters of one export run, immutable for its duration.
///
/// The crop rectangle is already in source pixel space; translate a
/// display-space [`CropRegion`](crate::CropRegion) with
/// [`CropRegion::to_source`](crate::CropRegion::to_source) first. No crop
/// means the full frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Output dimensions
    pub target: TargetSize,
    /// Source-space crop, or `None` for the full frame
    pub crop: Option<SourceRect>,
}

impl ExportRequest {
    /// Full-frame export at the given target size
    #[must_use]
    pub const fn new(target: TargetSize) -> Self {
        Self { target, crop: None }
    }

    /// Restrict the export to a source-space crop rectangle
    #[must_use]
    pub const fn with_crop(mut self, crop: SourceRect) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// Export `frames` through `encoder`.
///
/// Progress is reported through `on_progress` as a fraction: `i / len`
/// before frame `i` is processed, and exactly `1.0` once the encoder has
/// finished. Reported values are monotonically non-decreasing over one
/// run. After every frame the orchestrator yields to the scheduler, and a
/// cancelled `cancel` token observed at that boundary aborts the run with
/// [`LoopcapError::Cancelled`]; no partial artifact is ever returned.
///
/// # Errors
///
/// - [`LoopcapError::EmptySequence`] if `frames` is empty; the encoder is
///   never started.
/// - [`LoopcapError::Cancelled`] if the token was cancelled mid-run.
/// - [`LoopcapError::EncodingFailure`] if the encoder faults; the run
///   aborts and the partial output is discarded.
#[allow(clippy::cast_precision_loss)]
pub async fn export(
    frames: &FrameBuffer,
    geometry: CaptureGeometry,
    request: &ExportRequest,
    mut encoder: Box<dyn Encoder>,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(f64),
) -> LoopcapResult<EncodedArtifact> {
    if frames.is_empty() {
        return Err(LoopcapError::EmptySequence);
    }

    let rect = request
        .crop
        .unwrap_or_else(|| SourceRect::full(geometry));
    debug!(
        frames = frames.len(),
        ?rect,
        target_width = request.target.width,
        target_height = request.target.height,
        format = ?encoder.format(),
        "export starting"
    );

    encoder.start()?;

    let total = frames.len();
    let mut previous_timestamp = 0_u64;
    for (index, frame) in frames.iter().enumerate() {
        if cancel.is_cancelled() {
            debug!(frame = index, "export cancelled");
            return Err(LoopcapError::Cancelled);
        }

        on_progress(index as f64 / total as f64);

        let pixels = transform(frame, geometry, rect, request.target);
        let delay_ms = if index == 0 {
            0
        } else {
            frame.timestamp_ms.saturating_sub(previous_timestamp)
        };
        previous_timestamp = frame.timestamp_ms;

        encoder.add_frame(&pixels, delay_ms)?;
        trace!(frame = index, delay_ms, "frame encoded");

        // Let the host scheduler service pending work before the next
        // frame.
        tokio::task::yield_now().await;
    }

    let artifact = encoder.finish()?;
    on_progress(1.0);
    debug!(
        bytes = artifact.len(),
        frames = artifact.frame_count(),
        "export finished"
    );
    Ok(artifact)
}

/// Export a finished [`Recording`] in the given format, building the
/// matching encoder internally.
///
/// # Errors
///
/// Same error surface as [`export`].
pub async fn export_recording(
    recording: &Recording,
    request: &ExportRequest,
    format: ImageFormat,
    cancel: &CancellationToken,
    on_progress: impl FnMut(f64),
) -> LoopcapResult<EncodedArtifact> {
    let encoder = format.encoder(request.target);
    export(
        &recording.frames,
        recording.geometry,
        request,
        encoder,
        cancel,
        on_progress,
    )
    .await
}
