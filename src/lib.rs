//! Framemix draws raw video frames onto each other.
//!
//! The mixer takes a destination frame and composites source frames onto it
//! at arbitrary integer offsets, blending by alpha where the pixel format has
//! an alpha channel and falling back to a plain copy where it does not. It is
//! format-agnostic: packed and planar layouts, RGB and YUV, 8/16/32-bit
//! words, either byte order, with or without chroma subsampling — all drawn
//! by the same small set of kernels driven by a per-format descriptor.
//!
//! # Pipeline overview
//!
//! 1. **begin**: bind a destination; derive its channel layout, blend
//!    tables and kernel selection ([`VideoMixer::begin`]).
//! 2. **draw**: clip the placement, look up (or build) the cached coordinate
//!    mapping for this draw call, then run the selected kernel over the
//!    overlap — row-parallel when the working area is large enough
//!    ([`MixerSession::draw`]).
//! 3. **end**: release the destination. Geometry stays cached for the next
//!    frame as long as formats and offsets repeat.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No ownership of pixels**: the mixer only borrows frames.
//! - **Integer-exact blending**: all arithmetic is fixed point; two mixers
//!   given the same inputs produce byte-identical output regardless of cache
//!   mode or parallelism.
//!
//! # Getting started
//!
//! ```
//! use framemix::{Fps, PixelFormat, VideoCaps, VideoMixer, VideoPacket};
//!
//! # fn main() -> framemix::MixResult<()> {
//! let fps = Fps::new(30, 1)?;
//! let mut base = VideoPacket::new(VideoCaps::new(PixelFormat::Argb8888, 640, 480, fps))?;
//! let overlay = VideoPacket::new(VideoCaps::new(PixelFormat::Argb8888, 64, 64, fps))?;
//!
//! let mut mixer = VideoMixer::new();
//! let mut session = mixer.begin(&mut base);
//! assert!(session.draw(16, 16, &overlay));
//! session.end();
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod blend;
mod caps;
mod format;
mod foundation;
mod geometry;
mod mixer;
mod packet;

pub use blend::BlendTables;
pub use caps::{Fps, VideoCaps};
pub use format::{ByteOrder, ColorModel, Component, FormatSpec, PixelFormat, PlaneSpec, WordDepth};
pub use foundation::error::{MixError, MixResult};
pub use mixer::{MixerFlags, MixerSession, VideoMixer};
pub use packet::VideoPacket;
