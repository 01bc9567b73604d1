//! Per-draw geometry: clipping and coordinate mapping.
//!
//! A [`DrawParameters`] records the overlap between a source frame translated
//! by `(x, y)` and the destination, both in source and destination space, and
//! (outside lightweight-cache mode) the per-column/per-row nearest-neighbor
//! mapping tables the kernels index instead of dividing per pixel.

use crate::caps::VideoCaps;
use crate::mixer::common::CommonDrawParameters;

/// Identity of a cached geometry entry. A slot is stale when the picture
/// layout of either side or the offset changed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DrawKey {
    pub input: VideoCaps,
    pub output: VideoCaps,
    pub x: i32,
    pub y: i32,
}

impl DrawKey {
    pub fn matches(&self, input: &VideoCaps, output: &VideoCaps, x: i32, y: i32) -> bool {
        self.input.same_picture(input) && self.output.same_picture(output) && self.x == x && self.y == y
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct DrawParameters {
    pub key: Option<DrawKey>,

    pub can_draw: bool,

    // Overlap rectangle in source space...
    pub i_x: i32,
    pub i_y: i32,
    pub i_width: i32,
    pub i_height: i32,

    // ...and in destination space.
    pub o_x: i32,
    pub o_y: i32,
    pub o_width: i32,
    pub o_height: i32,

    // Integer-ratio state: src_index(d) = (d * i_diff + o_mult) / o_diff.
    pub i_diff_x: i32,
    pub i_diff_y: i32,
    pub o_diff_x: i32,
    pub o_diff_y: i32,
    pub o_mult_x: i32,
    pub o_mult_y: i32,

    /// Per-channel source byte offset for every destination column.
    pub src_width_offset: [Vec<usize>; 4],
    /// Source row for every destination row.
    pub src_height: Vec<usize>,
    /// Per-channel destination byte offset for every destination column.
    pub dst_width_offset: [Vec<usize>; 4],

    pub parallelize: bool,
}

impl DrawParameters {
    /// True when the horizontal mapping is a pure translation by
    /// `i_x - o_x` (the fast row path relies on this).
    pub fn is_translation_x(&self) -> bool {
        self.i_diff_x == self.o_diff_x
    }

    pub fn configure(
        &mut self,
        x: i32,
        y: i32,
        icaps: &VideoCaps,
        ocaps: &VideoCaps,
        cdp: &CommonDrawParameters,
    ) {
        let iw = icaps.width as i32;
        let ih = icaps.height as i32;
        let ow = ocaps.width as i32;
        let oh = ocaps.height as i32;

        if x < 0 {
            self.i_x = -x;
            self.o_x = 0;
        } else {
            self.i_x = 0;
            self.o_x = x;
        }

        if x + iw <= ow {
            self.i_width = iw;
            self.o_width = iw + x;
        } else {
            self.i_width = ow - x;
            self.o_width = ow;
        }

        if y < 0 {
            self.i_y = -y;
            self.o_y = 0;
        } else {
            self.i_y = 0;
            self.o_y = y;
        }

        if y + ih <= oh {
            self.i_height = ih;
            self.o_height = ih + y;
        } else {
            self.i_height = oh - y;
            self.o_height = oh;
        }

        self.can_draw = self.i_x >= 0
            && self.i_x < iw
            && self.i_y >= 0
            && self.i_y < ih
            && self.o_x >= 0
            && self.o_x < ow
            && self.o_y >= 0
            && self.o_y < oh
            && self.i_width >= 0
            && self.i_width <= iw
            && self.i_height >= 0
            && self.i_height <= ih
            && self.o_width >= 0
            && self.o_width <= ow
            && self.o_height >= 0
            && self.o_height <= oh;

        self.i_diff_x = self.i_width - self.i_x - 1;
        self.o_diff_x = (self.o_width - self.o_x - 1).max(1);
        self.o_mult_x = self.i_x * self.o_diff_x - self.o_x * self.i_diff_x;

        self.i_diff_y = self.i_height - self.i_y - 1;
        self.o_diff_y = (self.o_height - self.o_y - 1).max(1);
        self.o_mult_y = self.i_y * self.o_diff_y - self.o_y * self.i_diff_y;

        if cdp.lightweight_cache {
            for table in &mut self.src_width_offset {
                table.clear();
            }
            for table in &mut self.dst_width_offset {
                table.clear();
            }
            self.src_height.clear();
        } else {
            let width = ocaps.width as usize;
            let height = ocaps.height as usize;
            let max_xs = (self.i_width - 1).max(0);
            let max_ys = (self.i_height - 1).max(0);
            let (i_diff_x, o_diff_x, o_mult_x) = (self.i_diff_x, self.o_diff_x, self.o_mult_x);
            let (i_diff_y, o_diff_y, o_mult_y) = (self.i_diff_y, self.o_diff_y, self.o_mult_y);

            for (ci, ch) in cdp.channels().into_iter().enumerate() {
                let src = &mut self.src_width_offset[ci];
                src.clear();
                src.extend((0..width).map(|col| {
                    let xs = (col as i32 * i_diff_x + o_mult_x) / o_diff_x;
                    ((xs.clamp(0, max_xs) as usize) >> ch.width_div) * ch.step
                }));

                let dst = &mut self.dst_width_offset[ci];
                dst.clear();
                dst.extend((0..width).map(|col| (col >> ch.width_div) * ch.step));
            }

            self.src_height.clear();
            self.src_height.extend((0..height).map(|row| {
                let ys = (row as i32 * i_diff_y + o_mult_y) / o_diff_y;
                ys.clamp(0, max_ys) as usize
            }));
        }

        let work_w = (self.o_width - self.o_x).max(0) as usize;
        let work_h = (self.o_height - self.o_y).max(0) as usize;
        self.parallelize =
            cdp.spec.frame_bytes(work_w, work_h) > cdp.parallelization_threshold;
    }
}
