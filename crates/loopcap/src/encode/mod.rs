//! The encoder capability: turn a sequence of (pixels, delay) pairs into
//! one encoded artifact.
//!
//! Two implementations share the contract: [`GifEncoder`] streams frames
//! through an LZW encoder as they arrive, [`ApngEncoder`] accumulates and
//! encodes in one batch at `finish`. The export orchestrator is ignorant of
//! which is in use.

mod apng;
mod gif;

pub use apng::{ApngEncoder, CompressionLevel};
pub use gif::GifEncoder;

use crate::result::LoopcapResult;
use crate::transform::TargetSize;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Output format of one export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Animated GIF (LZW, palette-based, centisecond frame delays)
    Gif,
    /// Animated PNG (APNG, 8-bit RGBA with alpha preserved, millisecond
    /// frame delays)
    Apng,
}

impl ImageFormat {
    /// Build a fresh single-use encoder for this format at the given
    /// output size.
    #[must_use]
    pub fn encoder(self, target: TargetSize) -> Box<dyn Encoder> {
        match self {
            Self::Gif => Box::new(GifEncoder::new(target.width, target.height)),
            Self::Apng => Box::new(ApngEncoder::new(target.width, target.height)),
        }
    }

    /// MIME type of the encoded artifact
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Apng => "image/apng",
        }
    }
}

/// A single-use frame-sequence encoder.
///
/// Call order is `start`, then `add_frame` once per output frame in display
/// order, then `finish`. `finish` consumes the encoder, so frames cannot be
/// appended to a finished artifact. All rasters fed to one instance must
/// share the dimensions the encoder was built with; a mismatch is a
/// programming error and panics rather than returning a recoverable error.
pub trait Encoder: Send {
    /// Prepare internal state. Calling `start` a second time is an
    /// [`InvalidState`](crate::LoopcapError::InvalidState) error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying encoder cannot be set up.
    fn start(&mut self) -> LoopcapResult<()>;

    /// Append one frame with its display duration in milliseconds.
    ///
    /// The first frame of a sequence conventionally carries delay 0.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `start` or if the underlying
    /// encoder rejects the frame.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` does not match the encoder's dimensions.
    fn add_frame(&mut self, pixels: &RgbaImage, delay_ms: u64) -> LoopcapResult<()>;

    /// Flush and return the final artifact, consuming the encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `start` or if encoding fails.
    fn finish(self: Box<Self>) -> LoopcapResult<EncodedArtifact>;

    /// The format this encoder produces
    fn format(&self) -> ImageFormat;
}

/// The output of one export run: an opaque byte sequence plus its format
/// tag. Produced once, never mutated.
#[derive(Debug, Clone)]
pub struct EncodedArtifact {
    format: ImageFormat,
    bytes: Vec<u8>,
    frame_count: usize,
}

impl EncodedArtifact {
    pub(crate) const fn new(format: ImageFormat, bytes: Vec<u8>, frame_count: usize) -> Self {
        Self {
            format,
            bytes,
            frame_count,
        }
    }

    /// Format tag of the artifact
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Encoded bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the artifact, returning the encoded bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the encoded output in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the artifact holds no bytes (never the case for a
    /// successful export)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of frames embedded in the artifact
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Base64 rendering of the encoded bytes
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URL suitable for handing straight to a host UI
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageFormat::Gif.mime_type(), "image/gif");
        assert_eq!(ImageFormat::Apng.mime_type(), "image/apng");
    }

    #[test]
    fn test_encoder_factory_matches_format() {
        let target = TargetSize::new(4, 4);
        assert_eq!(ImageFormat::Gif.encoder(target).format(), ImageFormat::Gif);
        assert_eq!(
            ImageFormat::Apng.encoder(target).format(),
            ImageFormat::Apng
        );
    }

    #[test]
    fn test_artifact_accessors() {
        let artifact = EncodedArtifact::new(ImageFormat::Gif, vec![1, 2, 3], 2);
        assert_eq!(artifact.format(), ImageFormat::Gif);
        assert_eq!(artifact.as_bytes(), &[1, 2, 3]);
        assert_eq!(artifact.len(), 3);
        assert!(!artifact.is_empty());
        assert_eq!(artifact.frame_count(), 2);
    }

    #[test]
    fn test_data_url_prefix() {
        let artifact = EncodedArtifact::new(ImageFormat::Apng, vec![0xDE, 0xAD], 1);
        let url = artifact.data_url();
        assert!(url.starts_with("data:image/apng;base64,"));
        assert_eq!(artifact.to_base64(), "3q0=");
    }
}
