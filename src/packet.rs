//! Frame buffers.
//!
//! A [`VideoPacket`] owns one buffer per plane and hands out line slices by
//! destination row. The mixer borrows packets; it never owns them.

use crate::caps::VideoCaps;
use crate::foundation::error::{MixError, MixResult};

#[derive(Clone, Debug)]
struct Plane {
    data: Vec<u8>,
    line_size: usize,
    height_div: u32,
}

/// One video frame: caps plus 1–4 plane buffers, zero-initialized.
#[derive(Clone, Debug)]
pub struct VideoPacket {
    caps: VideoCaps,
    planes: Vec<Plane>,
}

impl VideoPacket {
    /// Allocates a zeroed frame for the given caps.
    pub fn new(caps: VideoCaps) -> MixResult<Self> {
        let spec = caps.format.spec();
        if !spec.is_valid() {
            return Err(MixError::unsupported_format(format!("{:?}", caps.format)));
        }
        if caps.width == 0 || caps.height == 0 {
            return Err(MixError::invalid_caps(format!(
                "packet geometry must be non-zero, got {}x{}",
                caps.width, caps.height
            )));
        }

        let planes = spec
            .planes
            .iter()
            .map(|p| {
                let line_size = p.line_size(caps.width as usize);
                Plane {
                    data: vec![0; line_size * p.rows(caps.height as usize)],
                    line_size,
                    height_div: p.height_div,
                }
            })
            .collect();

        Ok(Self { caps, planes })
    }

    pub fn caps(&self) -> VideoCaps {
        self.caps
    }

    pub fn is_empty(&self) -> bool {
        self.planes.iter().all(|p| p.data.is_empty())
    }

    pub fn planes(&self) -> usize {
        self.planes.len()
    }

    pub fn line_size(&self, plane: usize) -> usize {
        self.planes[plane].line_size
    }

    pub fn height_div(&self, plane: usize) -> u32 {
        self.planes[plane].height_div
    }

    /// Line of `plane` covering destination row `y` (vertical subsampling
    /// applied internally).
    pub fn const_line(&self, plane: usize, y: usize) -> &[u8] {
        let p = &self.planes[plane];
        let start = (y >> p.height_div) * p.line_size;
        &p.data[start..start + p.line_size]
    }

    pub fn line_mut(&mut self, plane: usize, y: usize) -> &mut [u8] {
        let p = &mut self.planes[plane];
        let start = (y >> p.height_div) * p.line_size;
        &mut p.data[start..start + p.line_size]
    }

    /// Raw plane row by physical row index (no subsampling shift).
    pub(crate) fn plane_row(&self, plane: usize, row: usize) -> &[u8] {
        let p = &self.planes[plane];
        &p.data[row * p.line_size..(row + 1) * p.line_size]
    }

    pub(crate) fn plane_row_mut(&mut self, plane: usize, row: usize) -> &mut [u8] {
        let p = &mut self.planes[plane];
        &mut p.data[row * p.line_size..(row + 1) * p.line_size]
    }

    /// Whole backing buffer of one plane.
    pub fn plane_data(&self, plane: usize) -> &[u8] {
        &self.planes[plane].data
    }

    pub fn plane_data_mut(&mut self, plane: usize) -> &mut [u8] {
        &mut self.planes[plane].data
    }

    pub fn data_size(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }

    /// Splits destination rows `[y0, y1)` into at most `max_bands` disjoint
    /// mutable views. Interior band boundaries are aligned to `align` rows so
    /// that subsampled planes never share a physical row across bands.
    pub(crate) fn split_bands(
        &mut self,
        y0: usize,
        y1: usize,
        align: usize,
        max_bands: usize,
    ) -> Vec<DstView<'_>> {
        debug_assert!(align.is_power_of_two());
        let rows = y1.saturating_sub(y0);
        if rows == 0 {
            return Vec::new();
        }

        let band_rows = rows
            .div_ceil(max_bands.max(1))
            .next_multiple_of(align)
            .max(align);

        let mut cuts: Vec<(usize, usize)> = Vec::new();
        let mut start = y0;
        while start < y1 {
            let aligned_end = (start + band_rows) & !(align - 1);
            let end = if aligned_end <= start {
                start + band_rows
            } else {
                aligned_end
            };
            let end = end.min(y1);
            cuts.push((start, end));
            start = end;
        }

        let mut views: Vec<DstView<'_>> = cuts
            .iter()
            .map(|&(s, e)| DstView {
                y0: s,
                y1: e,
                planes: Vec::new(),
            })
            .collect();

        for plane in &mut self.planes {
            let hd = plane.height_div;
            let ls = plane.line_size;
            let start_row = y0 >> hd;

            let mut rest = &mut plane.data[start_row * ls..];
            let mut rest_first = start_row;
            for (view, &(_, e)) in views.iter_mut().zip(&cuts) {
                let end_row = ((e - 1) >> hd) + 1;
                let take = (end_row - rest_first) * ls;
                let tail = std::mem::take(&mut rest);
                let (head, tail) = tail.split_at_mut(take.min(tail.len()));
                view.planes.push(PlaneViewMut {
                    data: head,
                    line_size: ls,
                    height_div: hd,
                    first_row: rest_first,
                });
                rest = tail;
                rest_first = end_row;
            }
        }

        views
    }
}

pub(crate) struct PlaneViewMut<'a> {
    data: &'a mut [u8],
    line_size: usize,
    height_div: u32,
    first_row: usize,
}

/// Mutable window over a band of destination rows, one sub-slice per plane.
pub(crate) struct DstView<'a> {
    pub y0: usize,
    pub y1: usize,
    planes: Vec<PlaneViewMut<'a>>,
}

impl DstView<'_> {
    pub fn line(&self, plane: usize, y: usize) -> &[u8] {
        let p = &self.planes[plane];
        let start = ((y >> p.height_div) - p.first_row) * p.line_size;
        &p.data[start..start + p.line_size]
    }

    pub fn line_mut(&mut self, plane: usize, y: usize) -> &mut [u8] {
        let p = &mut self.planes[plane];
        let start = ((y >> p.height_div) - p.first_row) * p.line_size;
        &mut p.data[start..start + p.line_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::Fps;
    use crate::format::PixelFormat;

    fn caps(format: PixelFormat, w: u32, h: u32) -> VideoCaps {
        VideoCaps::new(format, w, h, Fps::default())
    }

    #[test]
    fn new_rejects_invalid_caps() {
        assert!(VideoPacket::new(caps(PixelFormat::None, 4, 4)).is_err());
        assert!(VideoPacket::new(caps(PixelFormat::Gray8, 0, 4)).is_err());
    }

    #[test]
    fn plane_geometry_matches_spec() {
        let p = VideoPacket::new(caps(PixelFormat::Yuv420p, 6, 4)).unwrap();
        assert_eq!(p.planes(), 3);
        assert_eq!(p.line_size(0), 6);
        assert_eq!(p.line_size(1), 3);
        assert_eq!(p.height_div(2), 1);
        assert_eq!(p.data_size(), 24 + 6 + 6);
    }

    #[test]
    fn line_access_applies_height_div() {
        let mut p = VideoPacket::new(caps(PixelFormat::Yuv420p, 4, 4)).unwrap();
        p.line_mut(1, 2)[0] = 7;
        // Rows 2 and 3 land on the same chroma line.
        assert_eq!(p.const_line(1, 3)[0], 7);
        assert_eq!(p.const_line(1, 0)[0], 0);
    }

    #[test]
    fn split_bands_covers_all_rows_disjointly() {
        let mut p = VideoPacket::new(caps(PixelFormat::Yuv420p, 4, 16)).unwrap();
        {
            let mut views = p.split_bands(0, 16, 2, 3);
            assert!(views.len() >= 2);
            assert_eq!(views.first().unwrap().y0, 0);
            assert_eq!(views.last().unwrap().y1, 16);
            for w in views.windows(2) {
                assert_eq!(w[0].y1, w[1].y0);
                // Interior boundaries stay chroma-aligned.
                assert_eq!(w[0].y1 % 2, 0);
            }
            for v in &mut views {
                for y in v.y0..v.y1 {
                    v.line_mut(0, y).fill(1);
                    v.line_mut(1, y).fill(2);
                }
            }
        }
        assert!(p.plane_data(0).iter().all(|&b| b == 1));
        assert!(p.plane_data(1).iter().all(|&b| b == 2));
    }

    #[test]
    fn split_bands_handles_unaligned_start() {
        let mut p = VideoPacket::new(caps(PixelFormat::Yuv420p, 4, 12)).unwrap();
        let views = p.split_bands(3, 11, 2, 4);
        assert_eq!(views.first().unwrap().y0, 3);
        assert_eq!(views.last().unwrap().y1, 11);
        for w in views.windows(2) {
            assert_eq!(w[0].y1 % 2, 0);
        }
    }
}
