use std::ops::Range;

/// The marker rectangle in absolute pixel coordinates. The origin may sit
/// outside the frame; only the part overlapping the frame is ever touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl MarkerRect {
    /// Rightmost column inside the rectangle, or `x` for an empty one.
    pub fn last_column(self) -> i64 {
        i64::from(self.x) + i64::from(self.w.max(1)) - 1
    }

    /// Columns of the rectangle that fall inside a frame `frame_width` wide.
    pub fn columns_within(self, frame_width: usize) -> Range<usize> {
        clip_span(self.x, self.w, frame_width)
    }

    /// Rows of the rectangle that fall inside a frame `frame_height` tall.
    pub fn rows_within(self, frame_height: usize) -> Range<usize> {
        clip_span(self.y, self.h, frame_height)
    }
}

fn clip_span(start: i32, len: u32, limit: usize) -> Range<usize> {
    let limit = limit as i64;
    let lo = i64::from(start).max(0);
    let hi = (i64::from(start) + i64::from(len)).min(limit);
    if lo >= hi {
        return 0..0;
    }
    lo as usize..hi as usize
}
