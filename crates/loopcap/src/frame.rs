//! Captured frames and the append-only frame buffer.

use image::RgbaImage;

/// One timestamped raster snapshot captured from the source.
///
/// Immutable once appended to a [`FrameBuffer`].
#[derive(Debug, Clone)]
pub struct Frame {
    /// Milliseconds since the first snapshot of the recording.
    ///
    /// The first frame of a recording always carries timestamp 0.
    pub timestamp_ms: u64,
    /// RGBA pixel data at the source's native geometry
    pub pixels: RgbaImage,
}

impl Frame {
    /// Create a new frame
    #[must_use]
    pub const fn new(timestamp_ms: u64, pixels: RgbaImage) -> Self {
        Self {
            timestamp_ms,
            pixels,
        }
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// The ordered, append-only collection of all frames in one recording.
///
/// Timestamps are non-decreasing in append order by construction: a push
/// with a timestamp behind the last frame's is clamped up to it. The buffer
/// is mutated only by the capture side; export runs borrow it read-only and
/// never consume it, so independent exports may read the same recording.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
}

impl FrameBuffer {
    /// Create an empty frame buffer
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of captured frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Append a frame, clamping its timestamp so ordering never regresses
    pub fn push(&mut self, mut frame: Frame) {
        if let Some(last) = self.frames.last() {
            frame.timestamp_ms = frame.timestamp_ms.max(last.timestamp_ms);
        }
        self.frames.push(frame);
    }

    /// Iterate over frames in capture order
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// The frame at `index`, if present
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Timestamp of the last frame, i.e. the captured duration in
    /// milliseconds (0 for an empty buffer).
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map_or(0, |f| f.timestamp_ms)
    }
}

impl<'a> IntoIterator for &'a FrameBuffer {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(timestamp_ms: u64, width: u32, height: u32) -> Frame {
        Frame::new(timestamp_ms, RgbaImage::new(width, height))
    }

    mod frame_tests {
        use super::*;

        #[test]
        fn test_frame_dimensions() {
            let frame = solid_frame(0, 64, 48);
            assert_eq!(frame.width(), 64);
            assert_eq!(frame.height(), 48);
            assert_eq!(frame.timestamp_ms, 0);
        }
    }

    mod frame_buffer_tests {
        use super::*;

        #[test]
        fn test_empty_buffer() {
            let buffer = FrameBuffer::new();
            assert!(buffer.is_empty());
            assert_eq!(buffer.len(), 0);
            assert_eq!(buffer.duration_ms(), 0);
        }

        #[test]
        fn test_append_preserves_order() {
            let mut buffer = FrameBuffer::new();
            buffer.push(solid_frame(0, 8, 8));
            buffer.push(solid_frame(100, 8, 8));
            buffer.push(solid_frame(250, 8, 8));

            assert_eq!(buffer.len(), 3);
            let timestamps: Vec<u64> = buffer.iter().map(|f| f.timestamp_ms).collect();
            assert_eq!(timestamps, vec![0, 100, 250]);
            assert_eq!(buffer.duration_ms(), 250);
        }

        #[test]
        fn test_regressing_timestamp_is_clamped() {
            let mut buffer = FrameBuffer::new();
            buffer.push(solid_frame(100, 8, 8));
            buffer.push(solid_frame(40, 8, 8));

            assert_eq!(buffer.get(1).unwrap().timestamp_ms, 100);
        }

        #[test]
        fn test_get_out_of_range() {
            let buffer = FrameBuffer::new();
            assert!(buffer.get(0).is_none());
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_timestamps_non_decreasing(timestamps in proptest::collection::vec(0u64..100_000, 0..50)) {
                let mut buffer = FrameBuffer::new();
                for ts in timestamps {
                    buffer.push(solid_frame(ts, 2, 2));
                }

                let stored: Vec<u64> = buffer.iter().map(|f| f.timestamp_ms).collect();
                for pair in stored.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
            }
        }
    }
}
