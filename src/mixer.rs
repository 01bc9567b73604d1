//! The mixer: begin/draw/end session over a destination frame.

use rayon::prelude::*;

use crate::geometry::{DrawKey, DrawParameters};
use crate::mixer::common::{CommonDrawParameters, DrawType};
use crate::mixer::kernels::{
    InlineMap, KernelCtx, SampleMap, TableMap, Word, blend_rows_fast8, blend_rows_generic,
    blend_rows_tabled, blit_rows,
};
use crate::packet::{DstView, VideoPacket};

pub(crate) mod common;
pub(crate) mod fast;
pub(crate) mod kernels;

bitflags::bitflags! {
    /// Mixer configuration bitmask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MixerFlags: u32 {
        /// Always use the memory-copy path, ignoring alpha.
        const FORCE_BLIT = 1 << 0;
        /// Recompute source coordinates per pixel instead of materializing
        /// width/height-sized mapping tables. Trades CPU for memory; useful
        /// for very large frames or one-shot draws.
        const LIGHTWEIGHT_CACHE = 1 << 1;
    }
}

/// Geometry cache sizing: grown in blocks, hard-capped.
const CACHE_BLOCK: usize = 8;
const MAX_CACHE_SLOTS: usize = 1 << 16;

/// Draws source frames onto a destination frame.
///
/// The mixer holds no frame data itself: [`VideoMixer::begin`] borrows the
/// destination for a bracket of [`MixerSession::draw`] calls, and the
/// geometry computed for each draw stays cached across brackets for as long
/// as formats and offsets repeat.
pub struct VideoMixer {
    flags: MixerFlags,
    cdp: CommonDrawParameters,
    cache: Vec<DrawParameters>,
    cache_index: usize,
}

impl Default for VideoMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoMixer {
    pub fn new() -> Self {
        Self {
            flags: MixerFlags::empty(),
            cdp: CommonDrawParameters::default(),
            cache: Vec::new(),
            cache_index: 0,
        }
    }

    pub fn flags(&self) -> MixerFlags {
        self.flags
    }

    /// Takes effect at the next [`VideoMixer::begin`].
    pub fn set_flags(&mut self, flags: MixerFlags) {
        self.flags = flags;
    }

    /// Binds `base` as the destination for a bracket of draw calls. The
    /// per-destination draw state is rebuilt only when the destination caps
    /// or the flags changed since the last bracket.
    pub fn begin<'m, 'b>(&'m mut self, base: &'b mut VideoPacket) -> MixerSession<'m, 'b> {
        self.cache_index = 0;
        let key = (base.caps(), self.flags);
        if self.cdp.configured != Some(key) {
            self.cdp.configure(&base.caps(), self.flags);
        }
        MixerSession { mixer: self, base }
    }

    /// Releases all cached geometry and blend tables.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.cache_index = 0;
        self.cdp.reset();
    }
}

/// A begin/draw/end bracket. Dropping the session releases the destination;
/// the mixer's geometry cache survives for the next bracket.
pub struct MixerSession<'m, 'b> {
    mixer: &'m mut VideoMixer,
    base: &'b mut VideoPacket,
}

impl MixerSession<'_, '_> {
    /// Draws `src` onto the destination with its top-left corner at
    /// `(x, y)` (destination coordinates, may be negative).
    ///
    /// Returns `false` — and mutates nothing — when either frame is empty,
    /// the pixel formats differ, the geometry cache is exhausted, or the
    /// placement has no drawable overlap.
    pub fn draw(&mut self, x: i32, y: i32, src: &VideoPacket) -> bool {
        if self.base.is_empty()
            || src.is_empty()
            || src.caps().format != self.base.caps().format
        {
            return false;
        }

        let mixer = &mut *self.mixer;
        let lightweight = mixer.cdp.lightweight_cache;

        let index = if lightweight {
            if mixer.cache.len() != 1 {
                mixer.cache.clear();
                mixer.cache.push(DrawParameters::default());
            }
            0
        } else {
            let index = mixer.cache_index;
            if index >= mixer.cache.len() && index < MAX_CACHE_SLOTS {
                let new_len = (index + CACHE_BLOCK).clamp(CACHE_BLOCK, MAX_CACHE_SLOTS);
                mixer.cache.resize_with(new_len, DrawParameters::default);
            }
            index
        };
        if index >= MAX_CACHE_SLOTS {
            return false;
        }

        let icaps = src.caps();
        let ocaps = self.base.caps();
        let cdp = &mixer.cdp;
        let dp = &mut mixer.cache[index];

        let stale = dp
            .key
            .is_none_or(|k| !k.matches(&icaps, &ocaps, x, y));
        if stale {
            dp.configure(x, y, &icaps, &ocaps, cdp);
            dp.key = Some(DrawKey {
                input: icaps,
                output: ocaps,
                x,
                y,
            });
        }

        let ok = dp.can_draw;
        if ok {
            dispatch(cdp, dp, src, self.base);
        }

        if !lightweight {
            mixer.cache_index += 1;
        }
        ok
    }

    /// Draws `src` at the origin.
    pub fn draw_origin(&mut self, src: &VideoPacket) -> bool {
        self.draw(0, 0, src)
    }

    /// Addresses an explicit geometry cache slot for the next draw, instead
    /// of the sequential per-bracket counter. Lets a caller re-draw the same
    /// placement repeatedly without growing the cache.
    pub fn set_cache_index(&mut self, index: usize) {
        self.mixer.cache_index = index;
    }

    /// Ends the bracket. Equivalent to dropping the session.
    pub fn end(self) {}
}

fn dispatch(
    cdp: &CommonDrawParameters,
    dp: &DrawParameters,
    src: &VideoPacket,
    base: &mut VideoPacket,
) {
    let ctx = KernelCtx { cdp, dp, src };

    if cdp.fast_draw {
        blit_rows(&ctx, base);
        return;
    }

    let y0 = dp.o_y as usize;
    let y1 = dp.o_height as usize;
    if y1 <= y0 || dp.o_width <= dp.o_x {
        return;
    }

    let align = cdp.spec.row_alignment();
    if dp.parallelize {
        let mut bands = base.split_bands(y0, y1, align, rayon::current_num_threads());
        bands
            .par_iter_mut()
            .for_each(|band| run_kernel(&ctx, band));
    } else {
        let mut bands = base.split_bands(y0, y1, align, 1);
        for band in &mut bands {
            run_kernel(&ctx, band);
        }
    }
}

/// Kernel selection: fast 8-bit when the format allows byte addressing,
/// otherwise by destination word depth; each crossed with the cache mode's
/// coordinate provider.
fn run_kernel(ctx: &KernelCtx<'_>, band: &mut DstView<'_>) {
    let cdp = ctx.cdp;

    if cdp.fast_format && cdp.depth_a == 8 {
        if cdp.lightweight_cache {
            let map = InlineMap::new(cdp, ctx.dp);
            run_fast8(ctx, &map, band);
        } else {
            let map = TableMap { dp: ctx.dp };
            run_fast8(ctx, &map, band);
        }
        return;
    }

    match cdp.word {
        crate::format::WordDepth::Bits8 => run_word::<u8>(ctx, band),
        crate::format::WordDepth::Bits16 => run_word::<u16>(ctx, band),
        crate::format::WordDepth::Bits32 => run_word::<u32>(ctx, band),
    }
}

fn run_fast8<M: SampleMap>(ctx: &KernelCtx<'_>, map: &M, band: &mut DstView<'_>) {
    match ctx.cdp.draw_type {
        DrawType::ThreeComponents => blend_rows_fast8::<M, 3>(ctx, map, band),
        DrawType::OneComponent => blend_rows_fast8::<M, 1>(ctx, map, band),
    }
}

fn run_word<W: Word>(ctx: &KernelCtx<'_>, band: &mut DstView<'_>) {
    if ctx.cdp.lightweight_cache {
        let map = InlineMap::new(ctx.cdp, ctx.dp);
        run_mapped::<W, _>(ctx, &map, band);
    } else {
        let map = TableMap { dp: ctx.dp };
        run_mapped::<W, _>(ctx, &map, band);
    }
}

fn run_mapped<W: Word, M: SampleMap>(ctx: &KernelCtx<'_>, map: &M, band: &mut DstView<'_>) {
    match (ctx.cdp.optimized_for_8bits, ctx.cdp.draw_type) {
        (true, DrawType::ThreeComponents) => blend_rows_tabled::<W, M, 3>(ctx, map, band),
        (true, DrawType::OneComponent) => blend_rows_tabled::<W, M, 1>(ctx, map, band),
        (false, DrawType::ThreeComponents) => blend_rows_generic::<W, M, 3>(ctx, map, band),
        (false, DrawType::OneComponent) => blend_rows_generic::<W, M, 1>(ctx, map, band),
    }
}
