//! Draw kernels.
//!
//! Twelve historical kernel variants collapse into three generic functions
//! parameterized by the destination word type `W`, the color component count
//! `N`, and a [`SampleMap`] coordinate provider:
//!
//! - [`blend_rows_generic`]: any channel depth, inline 64-bit source-over
//!   arithmetic behind shifts/masks and optional byte swapping.
//! - [`blend_rows_tabled`]: 8-bit-deep channels behind shifts/masks, blend
//!   weights from the precomputed tables.
//! - [`blend_rows_fast8`]: byte-aligned 8-bit channels, direct byte reads,
//!   with an optional packed-row fast prefix per row.
//!
//! [`blit_rows`] is the alpha-less path: a plain row copy per plane.

use crate::geometry::DrawParameters;
use crate::mixer::common::{Channel, CommonDrawParameters};
use crate::packet::{DstView, VideoPacket};

/// Everything a kernel reads; nothing it writes.
pub(crate) struct KernelCtx<'a> {
    pub cdp: &'a CommonDrawParameters,
    pub dp: &'a DrawParameters,
    pub src: &'a VideoPacket,
}

/// Destination word type. Samples are read and written in native order;
/// `swapped` undoes a foreign byte order.
pub(crate) trait Word: Copy + Send + Sync {
    fn load(line: &[u8], off: usize) -> Self;
    fn store(line: &mut [u8], off: usize, v: Self);
    fn swapped(self) -> Self;
    fn widen(self) -> u64;
    fn narrow(v: u64) -> Self;
}

impl Word for u8 {
    fn load(line: &[u8], off: usize) -> Self {
        line[off]
    }
    fn store(line: &mut [u8], off: usize, v: Self) {
        line[off] = v;
    }
    fn swapped(self) -> Self {
        self
    }
    fn widen(self) -> u64 {
        u64::from(self)
    }
    fn narrow(v: u64) -> Self {
        v as u8
    }
}

impl Word for u16 {
    fn load(line: &[u8], off: usize) -> Self {
        u16::from_ne_bytes([line[off], line[off + 1]])
    }
    fn store(line: &mut [u8], off: usize, v: Self) {
        line[off..off + 2].copy_from_slice(&v.to_ne_bytes());
    }
    fn swapped(self) -> Self {
        self.swap_bytes()
    }
    fn widen(self) -> u64 {
        u64::from(self)
    }
    fn narrow(v: u64) -> Self {
        v as u16
    }
}

impl Word for u32 {
    fn load(line: &[u8], off: usize) -> Self {
        u32::from_ne_bytes([line[off], line[off + 1], line[off + 2], line[off + 3]])
    }
    fn store(line: &mut [u8], off: usize, v: Self) {
        line[off..off + 4].copy_from_slice(&v.to_ne_bytes());
    }
    fn swapped(self) -> Self {
        self.swap_bytes()
    }
    fn widen(self) -> u64 {
        u64::from(self)
    }
    fn narrow(v: u64) -> Self {
        v as u32
    }
}

/// Coordinate provider: where in the source (and destination) line a given
/// destination column's sample lives.
pub(crate) trait SampleMap: Sync {
    fn src_row(&self, y: usize) -> usize;
    fn src_offset(&self, ch: Channel, x: usize) -> usize;
    fn dst_offset(&self, ch: Channel, x: usize) -> usize;
}

/// Reads the per-column/per-row tables precomputed by
/// [`DrawParameters::configure`].
pub(crate) struct TableMap<'a> {
    pub dp: &'a DrawParameters,
}

impl SampleMap for TableMap<'_> {
    #[inline]
    fn src_row(&self, y: usize) -> usize {
        self.dp.src_height[y]
    }
    #[inline]
    fn src_offset(&self, ch: Channel, x: usize) -> usize {
        self.dp.src_width_offset[ch as usize][x]
    }
    #[inline]
    fn dst_offset(&self, ch: Channel, x: usize) -> usize {
        self.dp.dst_width_offset[ch as usize][x]
    }
}

/// Lightweight-cache provider: recomputes the nearest-neighbor ratio per
/// sample instead of holding width-sized tables.
pub(crate) struct InlineMap {
    i_diff_x: i32,
    o_diff_x: i32,
    o_mult_x: i32,
    i_diff_y: i32,
    o_diff_y: i32,
    o_mult_y: i32,
    max_xs: i32,
    max_ys: i32,
    ch: [(u32, usize); 4],
}

impl InlineMap {
    pub fn new(cdp: &CommonDrawParameters, dp: &DrawParameters) -> Self {
        Self {
            i_diff_x: dp.i_diff_x,
            o_diff_x: dp.o_diff_x,
            o_mult_x: dp.o_mult_x,
            i_diff_y: dp.i_diff_y,
            o_diff_y: dp.o_diff_y,
            o_mult_y: dp.o_mult_y,
            max_xs: (dp.i_width - 1).max(0),
            max_ys: (dp.i_height - 1).max(0),
            ch: cdp.channels().map(|c| (c.width_div, c.step)),
        }
    }
}

impl SampleMap for InlineMap {
    #[inline]
    fn src_row(&self, y: usize) -> usize {
        let ys = (y as i32 * self.i_diff_y + self.o_mult_y) / self.o_diff_y;
        ys.clamp(0, self.max_ys) as usize
    }
    #[inline]
    fn src_offset(&self, ch: Channel, x: usize) -> usize {
        let xs = (x as i32 * self.i_diff_x + self.o_mult_x) / self.o_diff_x;
        let (width_div, step) = self.ch[ch as usize];
        ((xs.clamp(0, self.max_xs) as usize) >> width_div) * step
    }
    #[inline]
    fn dst_offset(&self, ch: Channel, x: usize) -> usize {
        let (width_div, step) = self.ch[ch as usize];
        (x >> width_div) * step
    }
}

#[inline]
fn read_native<W: Word>(line: &[u8], off: usize, swap: bool) -> u64 {
    let w = W::load(line, off);
    let w = if swap { w.swapped() } else { w };
    w.widen()
}

/// Read-modify-write of one sample: clears the channel's bits through its
/// write mask and ors the new value in, preserving neighbors sharing the word.
#[inline]
fn merge_native<W: Word>(
    line: &mut [u8],
    off: usize,
    swap: bool,
    mask: u64,
    value: u64,
    shift: u32,
) {
    let raw = W::load(line, off);
    let native = if swap { raw.swapped() } else { raw };
    let merged = (native.widen() & mask) | (value << shift);
    let out = W::narrow(merged);
    W::store(line, off, if swap { out.swapped() } else { out });
}

/// Generic source-over kernel: any channel depth, inline 64-bit arithmetic.
pub(crate) fn blend_rows_generic<W: Word, M: SampleMap, const N: usize>(
    ctx: &KernelCtx<'_>,
    map: &M,
    dst: &mut DstView<'_>,
) {
    let cdp = ctx.cdp;
    let dp = ctx.dp;
    let chans = cdp.color_channels::<N>();
    let a = cdp.a;
    let swap = cdp.swap_bytes;
    let max_a = a.max as i64;
    let max_a2 = max_a * max_a;
    let (x0, x1) = (dp.o_x as usize, dp.o_width as usize);

    for y in dst.y0..dst.y1 {
        let ys = map.src_row(y);

        for x in x0..x1 {
            let mut vin = [0i64; N];
            for (i, (ch, c)) in chans.iter().enumerate() {
                let off = c.offset + map.src_offset(*ch, x);
                let w = read_native::<W>(ctx.src.const_line(c.plane, ys), off, swap);
                vin[i] = ((w >> c.shift) & c.max) as i64;
            }
            let ai = {
                let off = a.offset + map.src_offset(Channel::A, x);
                let w = read_native::<W>(ctx.src.const_line(a.plane, ys), off, swap);
                ((w >> a.shift) & a.max) as i64
            };

            let mut vdst = [0i64; N];
            let mut doffs = [0usize; N];
            for (i, (ch, c)) in chans.iter().enumerate() {
                doffs[i] = c.offset + map.dst_offset(*ch, x);
                let w = read_native::<W>(dst.line(c.plane, y), doffs[i], swap);
                vdst[i] = ((w >> c.shift) & c.max) as i64;
            }
            let a_doff = a.offset + map.dst_offset(Channel::A, x);
            let ao = {
                let w = read_native::<W>(dst.line(a.plane, y), a_doff, swap);
                ((w >> a.shift) & a.max) as i64
            };

            let diff_ai = max_a - ai;
            let an = max_a2 - (max_a - ao) * diff_ai;

            let mut vt = [0i64; N];
            let mut at = 0i64;
            if an != 0 {
                let mi = ai * max_a;
                let mo = ao * diff_ai;
                for i in 0..N {
                    vt[i] = (vin[i] * mi + vdst[i] * mo) / an;
                }
                at = an / max_a;
            }

            for (i, (_, c)) in chans.iter().enumerate() {
                merge_native::<W>(dst.line_mut(c.plane, y), doffs[i], swap, c.mask, vt[i] as u64, c.shift);
            }
            merge_native::<W>(dst.line_mut(a.plane, y), a_doff, swap, a.mask, at as u64, a.shift);
        }
    }
}

/// Table-weight kernel for 8-bit-deep channels that still need the
/// shift/mask extraction.
pub(crate) fn blend_rows_tabled<W: Word, M: SampleMap, const N: usize>(
    ctx: &KernelCtx<'_>,
    map: &M,
    dst: &mut DstView<'_>,
) {
    let cdp = ctx.cdp;
    let dp = ctx.dp;
    let Some(tables) = cdp.blend.as_ref() else {
        debug_assert!(false, "tabled kernel dispatched without blend tables");
        return;
    };
    let chans = cdp.color_channels::<N>();
    let a = cdp.a;
    let swap = cdp.swap_bytes;
    let depth = tables.depth();
    let (x0, x1) = (dp.o_x as usize, dp.o_width as usize);

    for y in dst.y0..dst.y1 {
        let ys = map.src_row(y);

        for x in x0..x1 {
            let mut vin = [0i64; N];
            for (i, (ch, c)) in chans.iter().enumerate() {
                let off = c.offset + map.src_offset(*ch, x);
                let w = read_native::<W>(ctx.src.const_line(c.plane, ys), off, swap);
                vin[i] = ((w >> c.shift) & c.max) as i64;
            }
            let ai = {
                let off = a.offset + map.src_offset(Channel::A, x);
                let w = read_native::<W>(ctx.src.const_line(a.plane, ys), off, swap);
                (w >> a.shift) & a.max
            };

            let mut vdst = [0i64; N];
            let mut doffs = [0usize; N];
            for (i, (ch, c)) in chans.iter().enumerate() {
                doffs[i] = c.offset + map.dst_offset(*ch, x);
                let w = read_native::<W>(dst.line(c.plane, y), doffs[i], swap);
                vdst[i] = ((w >> c.shift) & c.max) as i64;
            }
            let a_doff = a.offset + map.dst_offset(Channel::A, x);
            let ao = {
                let w = read_native::<W>(dst.line(a.plane, y), a_doff, swap);
                (w >> a.shift) & a.max
            };

            let m = tables.index(ai, ao);
            let sw = tables.src_weight(m);
            let dw = tables.dst_weight(m);

            for (i, (_, c)) in chans.iter().enumerate() {
                let vt = (vin[i] * sw + vdst[i] * dw) >> depth;
                merge_native::<W>(dst.line_mut(c.plane, y), doffs[i], swap, c.mask, vt as u64, c.shift);
            }
            let at = tables.out_alpha(m);
            merge_native::<W>(dst.line_mut(a.plane, y), a_doff, swap, a.mask, at as u64, a.shift);
        }
    }
}

/// Byte-addressed kernel for fast formats with an 8-bit alpha. Each row may
/// hand a prefix to the configured [`FastRowBlend`] strategy; the scalar loop
/// always finishes whatever is left.
pub(crate) fn blend_rows_fast8<M: SampleMap, const N: usize>(
    ctx: &KernelCtx<'_>,
    map: &M,
    dst: &mut DstView<'_>,
) {
    let cdp = ctx.cdp;
    let dp = ctx.dp;
    let Some(tables) = cdp.blend.as_ref() else {
        debug_assert!(false, "fast kernel dispatched without blend tables");
        return;
    };
    let chans = cdp.color_channels::<N>();
    let a = cdp.a;
    let depth = tables.depth();
    let (x0, x1) = (dp.o_x as usize, dp.o_width as usize);

    for y in dst.y0..dst.y1 {
        let ys = map.src_row(y);

        let mut x_start = x0;
        if let Some(fast) = cdp.fast_row.as_deref() {
            x_start += fast.blend_prefix(ctx, dst, y, ys, x0, x1);
        }

        for x in x_start..x1 {
            let mut vin = [0i64; N];
            for (i, (ch, c)) in chans.iter().enumerate() {
                let off = c.offset + map.src_offset(*ch, x);
                vin[i] = i64::from(ctx.src.const_line(c.plane, ys)[off]);
            }
            let ai = {
                let off = a.offset + map.src_offset(Channel::A, x);
                u64::from(ctx.src.const_line(a.plane, ys)[off])
            };

            let mut vdst = [0i64; N];
            let mut doffs = [0usize; N];
            for (i, (ch, c)) in chans.iter().enumerate() {
                doffs[i] = c.offset + map.dst_offset(*ch, x);
                vdst[i] = i64::from(dst.line(c.plane, y)[doffs[i]]);
            }
            let a_doff = a.offset + map.dst_offset(Channel::A, x);
            let ao = u64::from(dst.line(a.plane, y)[a_doff]);

            let m = tables.index(ai, ao);
            let sw = tables.src_weight(m);
            let dw = tables.dst_weight(m);

            for (i, (_, c)) in chans.iter().enumerate() {
                let vt = (vin[i] * sw + vdst[i] * dw) >> depth;
                dst.line_mut(c.plane, y)[doffs[i]] = vt as u8;
            }
            dst.line_mut(a.plane, y)[a_doff] = tables.out_alpha(m) as u8;
        }
    }
}

/// Alpha-less path: copy the overlapping region row by row, per plane. Never
/// parallelized; it is already a straight memcpy.
pub(crate) fn blit_rows(ctx: &KernelCtx<'_>, dst: &mut VideoPacket) {
    let dp = ctx.dp;
    let diff_x = (dp.o_width - dp.o_x).max(0) as usize;
    let diff_y = (dp.o_height - dp.o_y).max(0) as usize;

    for (plane, ps) in ctx.cdp.spec.planes.iter().enumerate() {
        let src_off = ((dp.i_x as usize) >> ps.width_div) * ps.step;
        let dst_off = ((dp.o_x as usize) >> ps.width_div) * ps.step;
        let copy = (diff_x >> ps.width_div) * ps.step;
        if copy == 0 {
            continue;
        }

        let src_row0 = (dp.i_y as usize) >> ps.height_div;
        let dst_row0 = (dp.o_y as usize) >> ps.height_div;
        let max_y = diff_y >> ps.height_div;

        for r in 0..max_y {
            let src_line = ctx.src.plane_row(plane, src_row0 + r);
            let dst_line = dst.plane_row_mut(plane, dst_row0 + r);
            dst_line[dst_off..dst_off + copy].copy_from_slice(&src_line[src_off..src_off + copy]);
        }
    }
}
