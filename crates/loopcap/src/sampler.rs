//! Periodic frame sampling from a live source.
//!
//! The sampler owns an explicit, cancellable periodic task: it ticks at the
//! configured interval, pulls one snapshot per tick, and appends it to a
//! frame buffer it owns exclusively. Stopping the task hands back a frozen
//! [`Recording`] that export runs may then borrow read-only.

use crate::frame::{Frame, FrameBuffer};
use crate::geometry::CaptureGeometry;
use crate::result::{LoopcapError, LoopcapResult};
use crate::source::FrameSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Configuration for periodic sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Interval between snapshots
    pub interval: Duration,
    /// Hard cap on the recording length (`None` = record until stopped)
    pub max_duration: Option<Duration>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_duration: None,
        }
    }
}

impl SamplerConfig {
    /// Create a configuration with the default 100 ms interval
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling interval (clamped to at least 1 ms)
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Cap the recording length
    #[must_use]
    pub const fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = Some(max);
        self
    }
}

/// A finished recording: the source geometry plus the frozen frame buffer.
///
/// Never mutated after the sampler stops; independent export runs borrow it
/// concurrently.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Native geometry of the source, fixed for this recording
    pub geometry: CaptureGeometry,
    /// All captured frames in timestamp order
    pub frames: FrameBuffer,
}

/// Handle to an in-flight recording task.
///
/// Dropping the handle without calling [`stop`](Self::stop) aborts the
/// sampling task and discards the frames.
#[derive(Debug)]
pub struct RecordingHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<Recording>>,
}

impl RecordingHandle {
    /// Stop sampling and return the frozen recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the sampling task panicked.
    pub async fn stop(mut self) -> LoopcapResult<Recording> {
        // The task may already have ended (snapshot failure, max duration);
        // a closed channel is fine.
        let _ = self.stop_tx.send(true);
        let task = self.task.take().ok_or_else(|| LoopcapError::InvalidState {
            message: "recording already stopped".to_string(),
        })?;
        task.await.map_err(|e| LoopcapError::InvalidState {
            message: format!("sampling task failed: {e}"),
        })
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Periodic capture driver. See [`Sampler::start`] and
/// [`Sampler::capture_once`].
#[derive(Debug)]
pub struct Sampler;

impl Sampler {
    /// Start sampling `source` at the configured interval.
    ///
    /// The first successful snapshot defines the timestamp origin, so the
    /// first frame always carries timestamp 0. Sampling runs until
    /// [`RecordingHandle::stop`] is called, the configured `max_duration`
    /// elapses, or the source fails a snapshot (frames captured up to that
    /// point survive).
    ///
    /// # Errors
    ///
    /// Returns [`LoopcapError::CaptureUnavailable`] if the source reports
    /// no geometry or a zero-area geometry. That failure is not retried
    /// here.
    pub fn start<S>(mut source: S, config: SamplerConfig) -> LoopcapResult<RecordingHandle>
    where
        S: FrameSource + 'static,
    {
        let geometry = resolve_geometry(&source)?;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        debug!(
            width = geometry.width,
            height = geometry.height,
            interval_ms = config.interval.as_millis() as u64,
            "sampler starting"
        );

        let task = tokio::spawn(async move {
            let mut frames = FrameBuffer::new();
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut origin: Option<Instant> = None;

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => {
                        if let (Some(max), Some(t0)) = (config.max_duration, origin) {
                            if t0.elapsed() >= max {
                                debug!("sampler reached max duration");
                                break;
                            }
                        }
                        match source.snapshot().await {
                            Ok(pixels) => {
                                let now = Instant::now();
                                let t0 = *origin.get_or_insert(now);
                                let timestamp_ms = now.duration_since(t0).as_millis() as u64;
                                frames.push(Frame::new(timestamp_ms, pixels));
                            }
                            Err(e) => {
                                warn!(error = %e, "snapshot failed, stopping sampler");
                                break;
                            }
                        }
                    }
                }
            }

            debug!(frames = frames.len(), "sampler stopped");
            Recording { geometry, frames }
        });

        Ok(RecordingHandle {
            stop_tx,
            task: Some(task),
        })
    }

    /// Single-shot screenshot mode: capture exactly one frame at
    /// timestamp 0 and return the finished recording immediately.
    ///
    /// # Errors
    ///
    /// Returns [`LoopcapError::CaptureUnavailable`] if the source reports
    /// no geometry or a zero-area geometry, or the snapshot error if the
    /// capture itself fails.
    pub async fn capture_once<S>(mut source: S) -> LoopcapResult<Recording>
    where
        S: FrameSource,
    {
        let geometry = resolve_geometry(&source)?;

        let pixels = source.snapshot().await?;
        let mut frames = FrameBuffer::new();
        frames.push(Frame::new(0, pixels));

        Ok(Recording { geometry, frames })
    }
}

/// Query the source's geometry and verify it describes a usable area.
fn resolve_geometry<S: FrameSource + ?Sized>(source: &S) -> LoopcapResult<CaptureGeometry> {
    let geometry = source
        .geometry()
        .ok_or_else(|| LoopcapError::CaptureUnavailable {
            message: "frame source reports no geometry".to_string(),
        })?;
    if geometry.width == 0 || geometry.height == 0 {
        return Err(LoopcapError::CaptureUnavailable {
            message: format!(
                "frame source reports zero-area geometry ({}x{})",
                geometry.width, geometry.height
            ),
        });
    }
    Ok(geometry)
}
