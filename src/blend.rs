//! Alpha blend lookup tables.
//!
//! For an alpha depth `d` the blend of a source sample `s` over a destination
//! sample `o` with alphas `(ai, ao)` is
//!
//! ```text
//! out = (s * src_weight + o * dst_weight) >> d
//! ```
//!
//! where the weights depend only on the alpha pair. The three tables here are
//! indexed by `(ai << d) | ao` and hold exact integer weights, so the per
//! pixel work reduces to two multiplies, an add and a shift.

/// Source-over weight tables for one alpha depth.
#[derive(Clone, Debug)]
pub struct BlendTables {
    depth: u32,
    src_weight: Vec<i64>,
    dst_weight: Vec<i64>,
    out_alpha: Vec<i64>,
}

impl BlendTables {
    /// Builds the three tables of `2^(2 * depth)` entries.
    ///
    /// Entry `(ai << depth) | ao` with `max = 2^depth - 1`:
    /// let `num = ai*max + ao*(max - ai)`; when `num` is zero every entry is
    /// zero, otherwise `src_weight = 2^depth * ai*max / num`,
    /// `dst_weight = 2^depth * ao*(max - ai) / num` and `out_alpha = num / max`
    /// (integer division throughout).
    pub fn for_depth(depth: u32) -> Self {
        assert!(
            (1..=8).contains(&depth),
            "blend tables are only built for alpha depths 1..=8"
        );

        let levels = 1usize << depth;
        let max_a = (levels - 1) as i64;
        let size = levels * levels;

        let mut src_weight = vec![0i64; size];
        let mut dst_weight = vec![0i64; size];
        let mut out_alpha = vec![0i64; size];

        for ai in 0..levels as i64 {
            for ao in 0..levels as i64 {
                let m = ((ai as usize) << depth) | ao as usize;
                let ai_mult = ai * max_a;
                let ao_mult = ao * (max_a - ai);
                let a = ai_mult + ao_mult;

                if a != 0 {
                    src_weight[m] = levels as i64 * ai_mult / a;
                    dst_weight[m] = levels as i64 * ao_mult / a;
                }
                out_alpha[m] = a / max_a;
            }
        }

        Self {
            depth,
            src_weight,
            dst_weight,
            out_alpha,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn index(&self, src_alpha: u64, dst_alpha: u64) -> usize {
        ((src_alpha as usize) << self.depth) | dst_alpha as usize
    }

    #[inline]
    pub fn src_weight(&self, index: usize) -> i64 {
        self.src_weight[index]
    }

    #[inline]
    pub fn dst_weight(&self, index: usize) -> i64 {
        self.dst_weight[index]
    }

    #[inline]
    pub fn out_alpha(&self, index: usize) -> i64 {
        self.out_alpha[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_numerator_rows_are_all_zero() {
        let t = BlendTables::for_depth(8);
        let m = t.index(0, 0);
        assert_eq!(t.src_weight(m), 0);
        assert_eq!(t.dst_weight(m), 0);
        assert_eq!(t.out_alpha(m), 0);
    }

    #[test]
    fn opaque_source_wins_outright() {
        let t = BlendTables::for_depth(8);
        for ao in 0..256 {
            let m = t.index(255, ao);
            assert_eq!(t.src_weight(m), 256);
            assert_eq!(t.dst_weight(m), 0);
            assert_eq!(t.out_alpha(m), 255);
        }
    }

    #[test]
    fn transparent_source_keeps_destination() {
        let t = BlendTables::for_depth(8);
        for ao in 1..256 {
            let m = t.index(0, ao);
            assert_eq!(t.src_weight(m), 0);
            assert_eq!(t.dst_weight(m), 256);
            assert_eq!(t.out_alpha(m), ao as i64);
        }
    }

    #[test]
    fn matches_float_source_over_within_rounding() {
        let t = BlendTables::for_depth(8);
        for &(ai, ao) in &[(13u64, 200u64), (128, 128), (1, 254), (254, 1), (77, 77)] {
            let m = t.index(ai, ao);

            let sa = ai as f64 / 255.0;
            let da = ao as f64 / 255.0;
            let out_a = sa + da * (1.0 - sa);

            let int_a = t.out_alpha(m) as f64 / 255.0;
            assert!((int_a - out_a).abs() < 1.5 / 255.0, "alpha off for {ai},{ao}");

            // A mid-gray blend, integer vs float.
            let (s, o) = (200.0, 40.0);
            let float_px = (s * sa + o * da * (1.0 - sa)) / out_a;
            let int_px =
                (200 * t.src_weight(m) + 40 * t.dst_weight(m)) >> 8;
            assert!(
                (int_px as f64 - float_px).abs() < 2.0,
                "pixel off for {ai},{ao}: {int_px} vs {float_px}"
            );
        }
    }

    #[test]
    fn exhaustive_identity_at_small_depth() {
        // depth 2: weights scaled by 4, max 3.
        let t = BlendTables::for_depth(2);
        for ai in 0..4i64 {
            for ao in 0..4i64 {
                let m = t.index(ai as u64, ao as u64);
                let num = ai * 3 + ao * (3 - ai);
                if num == 0 {
                    assert_eq!(t.src_weight(m) + t.dst_weight(m), 0);
                } else {
                    assert_eq!(t.src_weight(m), 4 * ai * 3 / num);
                    assert_eq!(t.dst_weight(m), 4 * ao * (3 - ai) / num);
                    assert_eq!(t.out_alpha(m), num / 3);
                }
            }
        }
    }
}
