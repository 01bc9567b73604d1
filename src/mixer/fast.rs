//! Row fast-path strategy.
//!
//! A [`FastRowBlend`] gets first crack at every row of the byte-addressed
//! kernel. It blends however many pixels from the row start it can prove it
//! handles correctly and reports the count; the scalar loop finishes the
//! rest. A strategy that cannot help simply returns 0 — there is no other
//! contract, so the scalar path is always a complete fallback.

use crate::mixer::kernels::KernelCtx;
use crate::packet::DstView;

pub(crate) trait FastRowBlend: Send + Sync {
    /// Blend a prefix of columns `[x0, x1)` of destination row `y` (source
    /// row `ys`), returning how many pixels were handled.
    fn blend_prefix(
        &self,
        ctx: &KernelCtx<'_>,
        dst: &mut DstView<'_>,
        y: usize,
        ys: usize,
        x0: usize,
        x1: usize,
    ) -> usize;
}

/// Bulk path for single-plane packed layouts with 8-bit channels: when the
/// horizontal mapping is a pure translation, source and destination rows are
/// walked as parallel fixed-width chunks, which keeps the inner loop free of
/// gathers and lets it vectorize.
pub(crate) struct PackedAlpha8Row {
    pub step: usize,
    pub color_offsets: Vec<usize>,
    pub alpha_offset: usize,
}

impl FastRowBlend for PackedAlpha8Row {
    fn blend_prefix(
        &self,
        ctx: &KernelCtx<'_>,
        dst: &mut DstView<'_>,
        y: usize,
        ys: usize,
        x0: usize,
        x1: usize,
    ) -> usize {
        let dp = ctx.dp;
        if !dp.is_translation_x() || x1 <= x0 {
            return 0;
        }
        let Some(tables) = ctx.cdp.blend.as_ref() else {
            return 0;
        };
        let depth = tables.depth();

        // Pure translation: destination column x reads source column
        // x + (i_x - o_x).
        let shift = (dp.i_x - dp.o_x) as isize;
        let s0 = (x0 as isize + shift) as usize;
        let s1 = (x1 as isize + shift) as usize;

        let src_line = ctx.src.const_line(0, ys);
        let src_row = &src_line[s0 * self.step..s1 * self.step];
        let dst_line = dst.line_mut(0, y);
        let dst_row = &mut dst_line[x0 * self.step..x1 * self.step];

        for (d, s) in dst_row
            .chunks_exact_mut(self.step)
            .zip(src_row.chunks_exact(self.step))
        {
            let ai = u64::from(s[self.alpha_offset]);
            let ao = u64::from(d[self.alpha_offset]);
            let m = tables.index(ai, ao);
            let sw = tables.src_weight(m);
            let dw = tables.dst_weight(m);

            for &off in &self.color_offsets {
                d[off] = ((i64::from(s[off]) * sw + i64::from(d[off]) * dw) >> depth) as u8;
            }
            d[self.alpha_offset] = tables.out_alpha(m) as u8;
        }

        x1 - x0
    }
}
