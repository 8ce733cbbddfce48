//! Loopcap: capture a live raster source and export the captured interval
//! as an animated GIF or an animated PNG.
//!
//! The crate is the frame capture, transform, and multi-format encoding
//! pipeline of a recording application. The host supplies a
//! [`FrameSource`]; everything downstream of it is in here.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   tick    ┌─────────┐  stop   ┌───────────┐
//! │  Frame   │──────────►│ Sampler │────────►│ Recording │
//! │  Source  │ snapshot  └─────────┘         │ (frozen)  │
//! └──────────┘                               └─────┬─────┘
//!                                                  │ export
//!                          ┌───────────┐           ▼
//!                          │ Transform │◄── Export Orchestrator
//!                          │ crop+size │           │  per frame,
//!                          └───────────┘           ▼  yielding
//!                                        ┌──────────────────┐
//!                                        │ Encoder (GIF or  │
//!                                        │ APNG, single-use)│
//!                                        └────────┬─────────┘
//!                                                 ▼
//!                                          EncodedArtifact
//! ```
//!
//! Scheduling is single-threaded cooperative: the sampler suspends between
//! ticks and the orchestrator yields after every frame, so an interactive
//! host is never blocked for the duration of an export.
//!
//! # Example
//!
//! ```ignore
//! use loopcap::{ExportRequest, ImageFormat, Sampler, SamplerConfig, TargetSize};
//! use tokio_util::sync::CancellationToken;
//!
//! let handle = Sampler::start(my_source, SamplerConfig::new())?;
//! // ... user stops recording ...
//! let recording = handle.stop().await?;
//!
//! let request = ExportRequest::new(TargetSize::from_width(recording.geometry, 1024));
//! let gif = loopcap::export_recording(
//!     &recording,
//!     &request,
//!     ImageFormat::Gif,
//!     &CancellationToken::new(),
//!     |p| println!("{:.0}%", p * 100.0),
//! )
//! .await?;
//! std::fs::write("capture.gif", gif.as_bytes())?;
//! ```

#![warn(missing_docs)]

mod encode;
mod export;
mod frame;
mod geometry;
mod result;
mod sampler;
mod source;
mod transform;

pub use encode::{ApngEncoder, CompressionLevel, EncodedArtifact, Encoder, GifEncoder, ImageFormat};
pub use export::{export, export_recording, ExportRequest};
pub use frame::{Frame, FrameBuffer};
pub use geometry::{CaptureGeometry, CropRegion, SourceRect};
pub use result::{LoopcapError, LoopcapResult};
pub use sampler::{Recording, RecordingHandle, Sampler, SamplerConfig};
pub use source::FrameSource;
pub use transform::{transform, TargetSize};

// Re-exported so hosts don't need a direct tokio-util dependency to cancel
// an export.
pub use tokio_util::sync::CancellationToken;
