//! Streaming animated-GIF encoding.

use super::{EncodedArtifact, Encoder, ImageFormat};
use crate::result::{LoopcapError, LoopcapResult};
use gif::Repeat;
use image::RgbaImage;
use tracing::trace;

/// Streaming GIF encoder.
///
/// Frames are palette-reduced and LZW-compressed as they arrive, so memory
/// stays proportional to the *output*, not to the raw frame sequence. The
/// output is still buffered whole before it is returned; artifacts are
/// modest in size, and a sink-streaming rewrite would change only
/// `finish`.
///
/// Accepts RGBA input and performs its own color reduction. Frame delays
/// are rounded to the GIF centisecond unit.
pub struct GifEncoder {
    width: u32,
    height: u32,
    quality: u8,
    inner: Option<gif::Encoder<Vec<u8>>>,
    frame_count: usize,
}

impl std::fmt::Debug for GifEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GifEncoder")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("quality", &self.quality)
            .field("started", &self.inner.is_some())
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

impl GifEncoder {
    /// Create an encoder for the given output dimensions
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            quality: 80,
            inner: None,
            frame_count: 0,
        }
    }

    /// Set palette quantization quality (1-100, clamped)
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Convert quality (1-100) to the gif crate's quantization speed
    /// (1-30, lower is slower and better).
    fn quality_to_speed(&self) -> i32 {
        // Round up so the lowest quality reaches the fastest speed tier.
        let normalized = u32::from(100 - self.quality);
        ((normalized * 29).div_ceil(100) + 1).clamp(1, 30) as i32
    }
}

/// Round a millisecond delay to GIF centiseconds, never negative.
fn delay_to_centiseconds(delay_ms: u64) -> u16 {
    u16::try_from(delay_ms.saturating_add(5) / 10).unwrap_or(u16::MAX)
}

#[allow(clippy::cast_possible_truncation)]
impl Encoder for GifEncoder {
    fn start(&mut self) -> LoopcapResult<()> {
        if self.inner.is_some() {
            return Err(LoopcapError::InvalidState {
                message: "GIF encoder already started".to_string(),
            });
        }

        // The GIF logical screen descriptor caps dimensions at u16.
        let (width, height) = match (u16::try_from(self.width), u16::try_from(self.height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(LoopcapError::EncodingFailure {
                    message: format!(
                        "GIF dimensions are limited to {max}x{max}, got {}x{}",
                        self.width,
                        self.height,
                        max = u16::MAX
                    ),
                })
            }
        };

        let mut inner = gif::Encoder::new(Vec::new(), width, height, &[]).map_err(|e| {
            LoopcapError::EncodingFailure {
                message: format!("failed to create GIF encoder: {e}"),
            }
        })?;
        inner
            .set_repeat(Repeat::Infinite)
            .map_err(|e| LoopcapError::EncodingFailure {
                message: format!("failed to set GIF repeat: {e}"),
            })?;

        self.inner = Some(inner);
        Ok(())
    }

    fn add_frame(&mut self, pixels: &RgbaImage, delay_ms: u64) -> LoopcapResult<()> {
        assert_eq!(
            pixels.dimensions(),
            (self.width, self.height),
            "frame dimensions must match the encoder's"
        );
        let speed = self.quality_to_speed();
        let inner = self.inner.as_mut().ok_or_else(|| LoopcapError::InvalidState {
            message: "GIF encoder not started".to_string(),
        })?;
        let mut data = pixels.as_raw().clone();
        let mut frame =
            gif::Frame::from_rgba_speed(self.width as u16, self.height as u16, &mut data, speed);
        frame.delay = delay_to_centiseconds(delay_ms);

        inner
            .write_frame(&frame)
            .map_err(|e| LoopcapError::EncodingFailure {
                message: format!("failed to write GIF frame: {e}"),
            })?;
        self.frame_count += 1;
        trace!(frame = self.frame_count, delay_cs = frame.delay, "GIF frame written");
        Ok(())
    }

    fn finish(self: Box<Self>) -> LoopcapResult<EncodedArtifact> {
        let inner = self.inner.ok_or_else(|| LoopcapError::InvalidState {
            message: "GIF encoder not started".to_string(),
        })?;

        let bytes = inner
            .into_inner()
            .map_err(|e| LoopcapError::EncodingFailure {
                message: format!("failed to finalize GIF: {e}"),
            })?;

        Ok(EncodedArtifact::new(ImageFormat::Gif, bytes, self.frame_count))
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Gif
    }
}
