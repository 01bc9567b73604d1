//! Pixel format descriptors.
//!
//! Every supported layout is described by a [`FormatSpec`]: its planes, the
//! position of each channel inside those planes (byte offset, bit shift, byte
//! step, subsampling divisor, bit depth) and the word width the draw kernels
//! read samples with. The descriptor is a pure lookup; nothing here touches
//! pixel data.

use serde::{Deserialize, Serialize};

/// Identifier of a concrete pixel layout.
///
/// `None` is the invalid format: its descriptor is empty and buffers cannot
/// be allocated for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    None,
    Argb8888,
    Rgba8888,
    Bgra8888,
    Abgr8888,
    /// ARGB packed in one 32-bit word (word order, not byte order).
    Argb32Le,
    Argb32Be,
    Rgb888,
    Bgr888,
    Gray8,
    GrayAlpha88,
    Gray16Le,
    Rgb565Le,
    Rgb565Be,
    Argb1555Le,
    Rgba5551Le,
    Argb4444Le,
    Argb2101010Le,
    Rgba64Le,
    Rgba64Be,
    Ayuv64Le,
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Yuva420p,
    Yuva444p,
    Nv12,
    Yuyv422,
    Uyvy422,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorModel {
    Rgb,
    /// Luma/chroma layouts. Gray formats are luma-only YUV.
    Yuv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }
}

/// Width of the machine word a kernel reads one sample with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordDepth {
    Bits8,
    Bits16,
    Bits32,
}

impl WordDepth {
    pub fn bytes(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Bits32 => 4,
        }
    }
}

/// Location of one logical channel inside a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Component {
    /// Plane holding the channel.
    pub plane: usize,
    /// Byte offset of the sample inside its step group.
    pub offset: usize,
    /// Bit shift of the value inside the word.
    pub shift: u32,
    /// Bytes between consecutive samples.
    pub step: usize,
    /// log2 horizontal subsampling.
    pub width_div: u32,
    /// Significant bits.
    pub depth: u32,
}

impl Component {
    /// Largest representable value.
    pub fn max(&self) -> u64 {
        (1u64 << self.depth) - 1
    }

    /// Mask that clears this channel's bits and keeps everything else.
    pub fn write_mask(&self) -> u64 {
        !(self.max() << self.shift)
    }
}

/// Memory geometry of one plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneSpec {
    pub width_div: u32,
    pub height_div: u32,
    /// Bytes per stored sample group on a line of this plane.
    pub step: usize,
}

impl PlaneSpec {
    pub fn line_size(&self, width: usize) -> usize {
        width.div_ceil(1 << self.width_div) * self.step
    }

    pub fn rows(&self, height: usize) -> usize {
        height.div_ceil(1 << self.height_div)
    }
}

/// Full descriptor of a pixel layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatSpec {
    pub format: PixelFormat,
    pub model: ColorModel,
    pub byte_order: ByteOrder,
    pub word: WordDepth,
    /// 1 for gray-like layouts, 3 for RGB/YUV.
    pub main_components: usize,
    pub planes: Vec<PlaneSpec>,
    /// R or Y (or the single gray channel).
    pub comp_x: Option<Component>,
    /// G or U. Absent for 1-component layouts.
    pub comp_y: Option<Component>,
    /// B or V. Absent for 1-component layouts.
    pub comp_z: Option<Component>,
    pub comp_a: Option<Component>,
}

impl FormatSpec {
    fn none() -> Self {
        Self {
            format: PixelFormat::None,
            model: ColorModel::Rgb,
            byte_order: ByteOrder::native(),
            word: WordDepth::Bits8,
            main_components: 0,
            planes: Vec::new(),
            comp_x: None,
            comp_y: None,
            comp_z: None,
            comp_a: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.planes.is_empty() && self.comp_x.is_some()
    }

    pub fn has_alpha(&self) -> bool {
        self.comp_a.is_some()
    }

    /// A layout is fast when samples can be read without repacking: every
    /// channel fills a whole native-order word.
    pub fn is_fast(&self) -> bool {
        let word_bits = self.word.bytes() as u32 * 8;
        let full_word = |c: &Option<Component>| match c {
            Some(c) => c.shift == 0 && c.depth == word_bits,
            None => true,
        };
        self.is_valid()
            && self.byte_order == ByteOrder::native()
            && full_word(&self.comp_x)
            && full_word(&self.comp_y)
            && full_word(&self.comp_z)
            && full_word(&self.comp_a)
    }

    /// Frame size in bytes for the given geometry.
    pub fn frame_bytes(&self, width: usize, height: usize) -> usize {
        self.planes
            .iter()
            .map(|p| p.line_size(width) * p.rows(height))
            .sum()
    }

    /// Row alignment (in destination rows) that keeps every plane's rows
    /// disjoint across a split, i.e. `1 << max(height_div)`.
    pub fn row_alignment(&self) -> usize {
        1 << self
            .planes
            .iter()
            .map(|p| p.height_div)
            .max()
            .unwrap_or(0)
    }
}

fn comp(plane: usize, offset: usize, shift: u32, step: usize, width_div: u32, depth: u32) -> Option<Component> {
    Some(Component {
        plane,
        offset,
        shift,
        step,
        width_div,
        depth,
    })
}

/// Packed single-plane RGB layout with 8-bit channels at the given byte
/// offsets, `step` bytes per pixel.
fn packed_rgb8(
    format: PixelFormat,
    step: usize,
    r: usize,
    g: usize,
    b: usize,
    a: Option<usize>,
) -> FormatSpec {
    FormatSpec {
        format,
        model: ColorModel::Rgb,
        byte_order: ByteOrder::native(),
        word: WordDepth::Bits8,
        main_components: 3,
        planes: vec![PlaneSpec {
            width_div: 0,
            height_div: 0,
            step,
        }],
        comp_x: comp(0, r, 0, step, 0, 8),
        comp_y: comp(0, g, 0, step, 0, 8),
        comp_z: comp(0, b, 0, step, 0, 8),
        comp_a: a.and_then(|off| comp(0, off, 0, step, 0, 8)),
    }
}

/// Packed single-plane RGB layout stored in one 16- or 32-bit word per pixel,
/// channels at the given `(shift, depth)` positions.
fn packed_rgb_word(
    format: PixelFormat,
    word: WordDepth,
    byte_order: ByteOrder,
    r: (u32, u32),
    g: (u32, u32),
    b: (u32, u32),
    a: Option<(u32, u32)>,
) -> FormatSpec {
    let step = word.bytes();
    FormatSpec {
        format,
        model: ColorModel::Rgb,
        byte_order,
        word,
        main_components: 3,
        planes: vec![PlaneSpec {
            width_div: 0,
            height_div: 0,
            step,
        }],
        comp_x: comp(0, 0, r.0, step, 0, r.1),
        comp_y: comp(0, 0, g.0, step, 0, g.1),
        comp_z: comp(0, 0, b.0, step, 0, b.1),
        comp_a: a.and_then(|(shift, depth)| comp(0, 0, shift, step, 0, depth)),
    }
}

/// Planar 8-bit YUV with chroma subsampled by `(chroma_wd, chroma_hd)` and an
/// optional full-resolution alpha plane.
fn planar_yuv8(format: PixelFormat, chroma_wd: u32, chroma_hd: u32, alpha: bool) -> FormatSpec {
    let chroma = PlaneSpec {
        width_div: chroma_wd,
        height_div: chroma_hd,
        step: 1,
    };
    let full = PlaneSpec {
        width_div: 0,
        height_div: 0,
        step: 1,
    };
    let mut planes = vec![full, chroma, chroma];
    if alpha {
        planes.push(full);
    }
    FormatSpec {
        format,
        model: ColorModel::Yuv,
        byte_order: ByteOrder::native(),
        word: WordDepth::Bits8,
        main_components: 3,
        planes,
        comp_x: comp(0, 0, 0, 1, 0, 8),
        comp_y: comp(1, 0, 0, 1, chroma_wd, 8),
        comp_z: comp(2, 0, 0, 1, chroma_wd, 8),
        comp_a: alpha.then(|| Component {
            plane: 3,
            offset: 0,
            shift: 0,
            step: 1,
            width_div: 0,
            depth: 8,
        }),
    }
}

/// Packed 4:2:2 with luma at `y_off` (step 2) and chroma at `u_off`/`v_off`
/// (step 4, horizontally halved).
fn packed_yuv422(format: PixelFormat, y_off: usize, u_off: usize, v_off: usize) -> FormatSpec {
    FormatSpec {
        format,
        model: ColorModel::Yuv,
        byte_order: ByteOrder::native(),
        word: WordDepth::Bits8,
        main_components: 3,
        planes: vec![PlaneSpec {
            width_div: 0,
            height_div: 0,
            step: 2,
        }],
        comp_x: comp(0, y_off, 0, 2, 0, 8),
        comp_y: comp(0, u_off, 0, 4, 1, 8),
        comp_z: comp(0, v_off, 0, 4, 1, 8),
        comp_a: None,
    }
}

impl PixelFormat {
    /// Descriptor lookup. Pure; unknown (`None`) yields an empty spec whose
    /// `is_valid()` is false.
    pub fn spec(self) -> FormatSpec {
        use ByteOrder::{BigEndian, LittleEndian};
        use PixelFormat as F;

        match self {
            F::None => FormatSpec::none(),

            F::Argb8888 => packed_rgb8(self, 4, 1, 2, 3, Some(0)),
            F::Rgba8888 => packed_rgb8(self, 4, 0, 1, 2, Some(3)),
            F::Bgra8888 => packed_rgb8(self, 4, 2, 1, 0, Some(3)),
            F::Abgr8888 => packed_rgb8(self, 4, 3, 2, 1, Some(0)),
            F::Rgb888 => packed_rgb8(self, 3, 0, 1, 2, None),
            F::Bgr888 => packed_rgb8(self, 3, 2, 1, 0, None),

            F::Argb32Le => packed_rgb_word(
                self,
                WordDepth::Bits32,
                LittleEndian,
                (16, 8),
                (8, 8),
                (0, 8),
                Some((24, 8)),
            ),
            F::Argb32Be => packed_rgb_word(
                self,
                WordDepth::Bits32,
                BigEndian,
                (16, 8),
                (8, 8),
                (0, 8),
                Some((24, 8)),
            ),

            F::Gray8 => FormatSpec {
                format: self,
                model: ColorModel::Yuv,
                byte_order: ByteOrder::native(),
                word: WordDepth::Bits8,
                main_components: 1,
                planes: vec![PlaneSpec {
                    width_div: 0,
                    height_div: 0,
                    step: 1,
                }],
                comp_x: comp(0, 0, 0, 1, 0, 8),
                comp_y: None,
                comp_z: None,
                comp_a: None,
            },
            F::GrayAlpha88 => FormatSpec {
                format: self,
                model: ColorModel::Yuv,
                byte_order: ByteOrder::native(),
                word: WordDepth::Bits8,
                main_components: 1,
                planes: vec![PlaneSpec {
                    width_div: 0,
                    height_div: 0,
                    step: 2,
                }],
                comp_x: comp(0, 0, 0, 2, 0, 8),
                comp_y: None,
                comp_z: None,
                comp_a: comp(0, 1, 0, 2, 0, 8),
            },
            F::Gray16Le => FormatSpec {
                format: self,
                model: ColorModel::Yuv,
                byte_order: LittleEndian,
                word: WordDepth::Bits16,
                main_components: 1,
                planes: vec![PlaneSpec {
                    width_div: 0,
                    height_div: 0,
                    step: 2,
                }],
                comp_x: comp(0, 0, 0, 2, 0, 16),
                comp_y: None,
                comp_z: None,
                comp_a: None,
            },

            F::Rgb565Le => packed_rgb_word(
                self,
                WordDepth::Bits16,
                LittleEndian,
                (11, 5),
                (5, 6),
                (0, 5),
                None,
            ),
            F::Rgb565Be => packed_rgb_word(
                self,
                WordDepth::Bits16,
                BigEndian,
                (11, 5),
                (5, 6),
                (0, 5),
                None,
            ),
            F::Argb1555Le => packed_rgb_word(
                self,
                WordDepth::Bits16,
                LittleEndian,
                (10, 5),
                (5, 5),
                (0, 5),
                Some((15, 1)),
            ),
            F::Rgba5551Le => packed_rgb_word(
                self,
                WordDepth::Bits16,
                LittleEndian,
                (11, 5),
                (6, 5),
                (1, 5),
                Some((0, 1)),
            ),
            F::Argb4444Le => packed_rgb_word(
                self,
                WordDepth::Bits16,
                LittleEndian,
                (8, 4),
                (4, 4),
                (0, 4),
                Some((12, 4)),
            ),
            F::Argb2101010Le => packed_rgb_word(
                self,
                WordDepth::Bits32,
                LittleEndian,
                (20, 10),
                (10, 10),
                (0, 10),
                Some((30, 2)),
            ),

            F::Rgba64Le | F::Rgba64Be => FormatSpec {
                format: self,
                model: ColorModel::Rgb,
                byte_order: if self == F::Rgba64Le {
                    LittleEndian
                } else {
                    BigEndian
                },
                word: WordDepth::Bits16,
                main_components: 3,
                planes: vec![PlaneSpec {
                    width_div: 0,
                    height_div: 0,
                    step: 8,
                }],
                comp_x: comp(0, 0, 0, 8, 0, 16),
                comp_y: comp(0, 2, 0, 8, 0, 16),
                comp_z: comp(0, 4, 0, 8, 0, 16),
                comp_a: comp(0, 6, 0, 8, 0, 16),
            },
            F::Ayuv64Le => FormatSpec {
                format: self,
                model: ColorModel::Yuv,
                byte_order: LittleEndian,
                word: WordDepth::Bits16,
                main_components: 3,
                planes: vec![PlaneSpec {
                    width_div: 0,
                    height_div: 0,
                    step: 8,
                }],
                comp_x: comp(0, 2, 0, 8, 0, 16),
                comp_y: comp(0, 4, 0, 8, 0, 16),
                comp_z: comp(0, 6, 0, 8, 0, 16),
                comp_a: comp(0, 0, 0, 8, 0, 16),
            },

            F::Yuv420p => planar_yuv8(self, 1, 1, false),
            F::Yuv422p => planar_yuv8(self, 1, 0, false),
            F::Yuv444p => planar_yuv8(self, 0, 0, false),
            F::Yuva420p => planar_yuv8(self, 1, 1, true),
            F::Yuva444p => planar_yuv8(self, 0, 0, true),

            F::Nv12 => FormatSpec {
                format: self,
                model: ColorModel::Yuv,
                byte_order: ByteOrder::native(),
                word: WordDepth::Bits8,
                main_components: 3,
                planes: vec![
                    PlaneSpec {
                        width_div: 0,
                        height_div: 0,
                        step: 1,
                    },
                    PlaneSpec {
                        width_div: 1,
                        height_div: 1,
                        step: 2,
                    },
                ],
                comp_x: comp(0, 0, 0, 1, 0, 8),
                comp_y: comp(1, 0, 0, 2, 1, 8),
                comp_z: comp(1, 1, 0, 2, 1, 8),
                comp_a: None,
            },

            F::Yuyv422 => packed_yuv422(self, 0, 1, 3),
            F::Uyvy422 => packed_yuv422(self, 1, 0, 2),
        }
    }
}
