//! Batched animated-PNG (APNG) encoding.

use super::{EncodedArtifact, Encoder, ImageFormat};
use crate::result::{LoopcapError, LoopcapResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// PNG compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompressionLevel {
    /// Fast compression (good balance)
    Fast,
    /// Default compression
    #[default]
    Default,
    /// Best compression (slowest, smallest files)
    Best,
}

impl CompressionLevel {
    fn to_png_compression(self) -> png::Compression {
        match self {
            Self::Fast => png::Compression::Fast,
            Self::Default => png::Compression::Balanced,
            Self::Best => png::Compression::High,
        }
    }
}

/// Animated-PNG encoder.
///
/// The PNG animation control chunk carries the total frame count and is
/// written into the header, so this encoder has no streaming mode: it
/// accumulates every frame's raw pixel buffer and delay, then performs one
/// batched encode at `finish`. Unlike the GIF path, memory grows with the
/// whole recording; callers exporting long captures should account for
/// that.
///
/// Output is 8-bit-per-channel RGBA with the alpha channel preserved and
/// per-frame delays in milliseconds.
#[derive(Debug)]
pub struct ApngEncoder {
    width: u32,
    height: u32,
    compression: CompressionLevel,
    started: bool,
    frames: Vec<Vec<u8>>,
    delays_ms: Vec<u64>,
}

impl ApngEncoder {
    /// Create an encoder for the given output dimensions
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            compression: CompressionLevel::Default,
            started: false,
            frames: Vec::new(),
            delays_ms: Vec::new(),
        }
    }

    /// Set the compression level
    #[must_use]
    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    fn encode(&self) -> LoopcapResult<Vec<u8>> {
        let mut output = Vec::new();

        {
            let mut encoder = png::Encoder::new(&mut output, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(self.compression.to_png_compression());
            encoder
                .set_animated(
                    u32::try_from(self.frames.len()).unwrap_or(u32::MAX),
                    0, // loop forever
                )
                .map_err(|e| LoopcapError::EncodingFailure {
                    message: format!("failed to mark PNG as animated: {e}"),
                })?;

            let mut writer =
                encoder
                    .write_header()
                    .map_err(|e| LoopcapError::EncodingFailure {
                        message: format!("failed to write PNG header: {e}"),
                    })?;

            for (data, delay_ms) in self.frames.iter().zip(&self.delays_ms) {
                let numerator = u16::try_from(*delay_ms).unwrap_or(u16::MAX);
                writer
                    .set_frame_delay(numerator, 1000)
                    .map_err(|e| LoopcapError::EncodingFailure {
                        message: format!("failed to set APNG frame delay: {e}"),
                    })?;
                writer
                    .write_image_data(data)
                    .map_err(|e| LoopcapError::EncodingFailure {
                        message: format!("failed to write APNG frame: {e}"),
                    })?;
            }

            writer
                .finish()
                .map_err(|e| LoopcapError::EncodingFailure {
                    message: format!("failed to finalize APNG: {e}"),
                })?;
        }

        Ok(output)
    }
}

impl Encoder for ApngEncoder {
    fn start(&mut self) -> LoopcapResult<()> {
        if self.started {
            return Err(LoopcapError::InvalidState {
                message: "APNG encoder already started".to_string(),
            });
        }
        self.started = true;
        Ok(())
    }

    fn add_frame(&mut self, pixels: &RgbaImage, delay_ms: u64) -> LoopcapResult<()> {
        if !self.started {
            return Err(LoopcapError::InvalidState {
                message: "APNG encoder not started".to_string(),
            });
        }
        assert_eq!(
            pixels.dimensions(),
            (self.width, self.height),
            "frame dimensions must match the encoder's"
        );

        self.frames.push(pixels.as_raw().clone());
        self.delays_ms.push(delay_ms);
        trace!(frame = self.frames.len(), delay_ms, "APNG frame buffered");
        Ok(())
    }

    fn finish(self: Box<Self>) -> LoopcapResult<EncodedArtifact> {
        if !self.started {
            return Err(LoopcapError::InvalidState {
                message: "APNG encoder not started".to_string(),
            });
        }
        if self.frames.is_empty() {
            return Err(LoopcapError::EncodingFailure {
                message: "APNG requires at least one frame".to_string(),
            });
        }

        let frame_count = self.frames.len();
        let bytes = self.encode()?;
        Ok(EncodedArtifact::new(ImageFormat::Apng, bytes, frame_count))
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Apng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgba(color);
        }
        img
    }

    fn encode_two_frames() -> EncodedArtifact {
        let mut encoder = ApngEncoder::new(64, 64);
        encoder.start().unwrap();
        encoder
            .add_frame(&solid(64, 64, [255, 0, 0, 255]), 0)
            .unwrap();
        encoder
            .add_frame(&solid(64, 64, [0, 0, 255, 255]), 100)
            .unwrap();
        Box::new(encoder).finish().unwrap()
    }

    #[test]
    fn test_magic_bytes_and_frame_count() {
        let artifact = encode_two_frames();
        assert_eq!(&artifact.as_bytes()[0..8], &PNG_MAGIC);
        assert_eq!(artifact.frame_count(), 2);
        assert_eq!(artifact.format(), ImageFormat::Apng);
    }

    #[test]
    fn test_animation_control_matches_input() {
        let artifact = encode_two_frames();

        let decoder = png::Decoder::new(Cursor::new(artifact.as_bytes()));
        let reader = decoder.read_info().unwrap();

        let actl = reader.info().animation_control().copied().unwrap();
        assert_eq!(actl.num_frames, 2);
        assert_eq!(actl.num_plays, 0); // infinite

        // First frame control carries the 0 ms delay over a 1000 denominator.
        let fctl = reader.info().frame_control().copied().unwrap();
        assert_eq!(fctl.delay_num, 0);
        assert_eq!(fctl.delay_den, 1000);
    }

    #[test]
    fn test_frames_decode_with_alpha_preserved() {
        let mut encoder = ApngEncoder::new(8, 8);
        encoder.start().unwrap();
        encoder.add_frame(&solid(8, 8, [255, 0, 0, 128]), 0).unwrap();
        encoder.add_frame(&solid(8, 8, [0, 0, 255, 64]), 50).unwrap();
        let artifact = Box::new(encoder).finish().unwrap();

        let decoder = png::Decoder::new(Cursor::new(artifact.as_bytes()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0u8; reader.output_buffer_size().unwrap()];

        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (8, 8));
        assert_eq!(&buf[0..4], &[255, 0, 0, 128]);

        reader.next_frame(&mut buf).unwrap();
        assert_eq!(&buf[0..4], &[0, 0, 255, 64]);
    }

    #[test]
    fn test_every_compression_level_encodes() {
        for level in [
            CompressionLevel::Fast,
            CompressionLevel::Default,
            CompressionLevel::Best,
        ] {
            let mut encoder = ApngEncoder::new(4, 4).with_compression(level);
            encoder.start().unwrap();
            encoder.add_frame(&solid(4, 4, [9, 9, 9, 255]), 10).unwrap();
            let artifact = Box::new(encoder).finish().unwrap();
            assert_eq!(&artifact.as_bytes()[0..8], &PNG_MAGIC);
        }
    }

    #[test]
    fn test_start_twice_fails() {
        let mut encoder = ApngEncoder::new(4, 4);
        encoder.start().unwrap();
        assert!(matches!(
            encoder.start(),
            Err(LoopcapError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_add_frame_before_start_fails() {
        let mut encoder = ApngEncoder::new(4, 4);
        let result = encoder.add_frame(&solid(4, 4, [0, 0, 0, 255]), 0);
        assert!(matches!(result, Err(LoopcapError::InvalidState { .. })));
    }

    #[test]
    fn test_finish_without_frames_fails() {
        let mut encoder = ApngEncoder::new(4, 4);
        encoder.start().unwrap();
        assert!(matches!(
            Box::new(encoder).finish(),
            Err(LoopcapError::EncodingFailure { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "frame dimensions")]
    fn test_dimension_mismatch_panics() {
        let mut encoder = ApngEncoder::new(8, 8);
        encoder.start().unwrap();
        let _ = encoder.add_frame(&solid(4, 4, [0, 0, 0, 255]), 0);
    }

    #[test]
    fn test_oversized_delay_saturates() {
        let mut encoder = ApngEncoder::new(2, 2);
        encoder.start().unwrap();
        encoder
            .add_frame(&solid(2, 2, [1, 2, 3, 255]), u64::from(u16::MAX) * 10)
            .unwrap();
        let artifact = Box::new(encoder).finish().unwrap();
        assert_eq!(artifact.frame_count(), 1);
    }
}
