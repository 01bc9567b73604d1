use serde::{Deserialize, Serialize};

use crate::foundation::error::{MixError, MixResult};
use crate::format::PixelFormat;

/// Frame rate as a rational. `den` must be > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub fn new(num: u32, den: u32) -> MixResult<Self> {
        if den == 0 {
            return Err(MixError::invalid_caps("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(MixError::invalid_caps("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

/// Format plus geometry plus frame rate of a video stream.
///
/// Equality compares every field; [`VideoCaps::same_picture`] ignores the
/// frame rate, which has no bearing on how a frame is laid out in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCaps {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

impl VideoCaps {
    pub fn new(format: PixelFormat, width: u32, height: u32, fps: Fps) -> Self {
        Self {
            format,
            width,
            height,
            fps,
        }
    }

    /// Same pixel layout and geometry, frame rate ignored.
    pub fn same_picture(&self, other: &Self) -> bool {
        self.format == other.format && self.width == other.width && self.height == other.height
    }

    /// Byte size of one frame with these caps.
    pub fn data_size(&self) -> usize {
        self.format
            .spec()
            .frame_bytes(self.width as usize, self.height as usize)
    }
}
