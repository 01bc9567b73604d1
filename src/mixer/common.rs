//! Per-destination derived draw state.
//!
//! Rebuilt whenever the destination caps or the mixer flags change; every
//! draw call reads it, none of them mutate it. Stale state here silently
//! produces wrong pixels, so [`crate::mixer::VideoMixer::begin`] guards the
//! rebuild with a full caps + flags comparison.

use crate::blend::BlendTables;
use crate::caps::VideoCaps;
use crate::format::{ByteOrder, Component, FormatSpec, PixelFormat, WordDepth};
use crate::mixer::MixerFlags;
use crate::mixer::fast::{FastRowBlend, PackedAlpha8Row};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum DrawType {
    #[default]
    OneComponent,
    ThreeComponents,
}

/// Addressing constants for one logical channel, flattened out of the format
/// descriptor so the kernels touch a single struct.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ChannelParams {
    pub plane: usize,
    pub offset: usize,
    pub shift: u32,
    pub step: usize,
    pub width_div: u32,
    pub max: u64,
    pub mask: u64,
}

impl ChannelParams {
    fn from_component(c: Component) -> Self {
        Self {
            plane: c.plane,
            offset: c.offset,
            shift: c.shift,
            step: c.step,
            width_div: c.width_div,
            max: c.max(),
            mask: c.write_mask(),
        }
    }
}

/// Logical channel tag, used by the coordinate providers to pick the right
/// mapping table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Channel {
    X = 0,
    Y = 1,
    Z = 2,
    A = 3,
}

pub(crate) struct CommonDrawParameters {
    /// Caps + flags this state was configured for.
    pub configured: Option<(VideoCaps, MixerFlags)>,

    pub spec: FormatSpec,
    pub lightweight_cache: bool,
    pub draw_type: DrawType,
    pub word: WordDepth,
    pub fast_draw: bool,
    pub optimized_for_8bits: bool,
    pub fast_format: bool,
    pub swap_bytes: bool,

    pub x: ChannelParams,
    pub y: ChannelParams,
    pub z: ChannelParams,
    pub a: ChannelParams,
    pub depth_a: u32,

    pub blend: Option<BlendTables>,
    pub fast_row: Option<Box<dyn FastRowBlend>>,

    pub parallelization_threshold: usize,
}

impl Default for CommonDrawParameters {
    fn default() -> Self {
        Self {
            configured: None,
            spec: PixelFormat::None.spec(),
            lightweight_cache: false,
            draw_type: DrawType::default(),
            word: WordDepth::Bits8,
            fast_draw: false,
            optimized_for_8bits: false,
            fast_format: false,
            swap_bytes: false,
            x: ChannelParams::default(),
            y: ChannelParams::default(),
            z: ChannelParams::default(),
            a: ChannelParams::default(),
            depth_a: 0,
            blend: None,
            fast_row: None,
            parallelization_threshold: 0,
        }
    }
}

impl CommonDrawParameters {
    pub fn configure(&mut self, caps: &VideoCaps, flags: MixerFlags) {
        let spec = caps.format.spec();

        self.word = spec.word;
        self.draw_type = if spec.main_components == 3 {
            DrawType::ThreeComponents
        } else {
            DrawType::OneComponent
        };
        self.swap_bytes = spec.byte_order != ByteOrder::native();

        self.x = ChannelParams::from_component(spec.comp_x.unwrap_or_default());
        self.y = ChannelParams::from_component(spec.comp_y.unwrap_or_default());
        self.z = ChannelParams::from_component(spec.comp_z.unwrap_or_default());
        self.a = ChannelParams::from_component(spec.comp_a.unwrap_or_default());
        self.depth_a = spec.comp_a.map_or(0, |c| c.depth);

        self.fast_draw =
            flags.contains(MixerFlags::FORCE_BLIT) || !spec.has_alpha() || !spec.is_valid();
        self.lightweight_cache = flags.contains(MixerFlags::LIGHTWEIGHT_CACHE);

        let depth8 = |c: Option<Component>| c.is_some_and(|c| c.depth == 8);
        self.optimized_for_8bits = depth8(spec.comp_x)
            && depth8(spec.comp_y)
            && depth8(spec.comp_z)
            && depth8(spec.comp_a);
        self.fast_format = spec.is_fast();

        // The table-driven kernels are exactly the 8-bit-alpha ones, so the
        // tables are only materialized where an index can reach them.
        self.blend = if !self.fast_draw
            && (self.optimized_for_8bits || (self.fast_format && self.depth_a == 8))
        {
            Some(BlendTables::for_depth(self.depth_a))
        } else {
            None
        };

        self.fast_row = self.select_fast_row(&spec);

        let ops_per_byte = if self.fast_draw {
            2
        } else if self.optimized_for_8bits {
            if spec.main_components == 3 { 20 } else { 12 }
        } else if spec.main_components == 3 {
            28
        } else {
            16
        };
        self.parallelization_threshold = parallel_bytes_threshold(ops_per_byte);

        tracing::debug!(
            format = ?caps.format,
            ?flags,
            fast_draw = self.fast_draw,
            fast_format = self.fast_format,
            threshold = self.parallelization_threshold,
            "configured mixer draw state"
        );

        self.spec = spec;
        self.configured = Some((*caps, flags));
    }

    /// Picks the packed-row strategy when the destination is a single packed
    /// plane of whole-byte 8-bit channels; everything else stays on the
    /// scalar loops.
    fn select_fast_row(&self, spec: &FormatSpec) -> Option<Box<dyn FastRowBlend>> {
        if self.fast_draw || !self.fast_format || self.depth_a != 8 {
            return None;
        }
        let chans: Vec<ChannelParams> = match self.draw_type {
            DrawType::ThreeComponents => vec![self.x, self.y, self.z],
            DrawType::OneComponent => vec![self.x],
        };
        let step = self.a.step;
        let packed = spec.planes.len() == 1
            && self.a.plane == 0
            && self.a.width_div == 0
            && chans
                .iter()
                .all(|c| c.plane == 0 && c.width_div == 0 && c.step == step);
        if !packed {
            return None;
        }

        let color_offsets = chans.iter().map(|c| c.offset).collect();
        Some(Box::new(PackedAlpha8Row {
            step,
            color_offsets,
            alpha_offset: self.a.offset,
        }))
    }

    pub fn reset(&mut self) {
        tracing::debug!("resetting mixer draw state");
        *self = Self::default();
    }

    /// All four channels in X/Y/Z/A order (absent ones zeroed).
    pub fn channels(&self) -> [ChannelParams; 4] {
        [self.x, self.y, self.z, self.a]
    }

    /// The color channels a kernel iterates: `[x]` or `[x, y, z]`.
    pub fn color_channels<const N: usize>(&self) -> [(Channel, ChannelParams); N] {
        let all = [
            (Channel::X, self.x),
            (Channel::Y, self.y),
            (Channel::Z, self.z),
        ];
        std::array::from_fn(|i| all[i])
    }
}

fn simd_lane_bytes() -> usize {
    if cfg!(target_feature = "avx512f") {
        64
    } else if cfg!(target_feature = "avx2") {
        32
    } else if cfg!(any(target_feature = "sse2", target_feature = "neon")) {
        16
    } else {
        8
    }
}

/// Working-set size below which the per-row fan-out costs more than it buys.
/// Wider SIMD means more throughput per core, so the bar rises with it and
/// falls with the per-byte operation count of the selected kernel.
fn parallel_bytes_threshold(ops_per_byte: usize) -> usize {
    simd_lane_bytes() * (1 << 16) / ops_per_byte.max(1)
}
