use crate::format::PixelFormat;

/// One plane of a planar image: row-major bytes with `linesize` bytes per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub linesize: usize,
}

/// A single decoded planar video frame.
///
/// Planes 0..=2 are Y, U, V; formats with alpha carry plane 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
    pub planes: Vec<Plane>,
    /// Absolute frame number from the start of the stream (0-based).
    pub frame_number: u64,
}

impl Frame {
    /// Allocate a zeroed, tightly packed frame.
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Self {
        let planes = (0..format.plane_count())
            .map(|p| {
                let (w, h) = format.plane_size(p, width, height);
                Plane {
                    data: vec![0; w * h],
                    linesize: w,
                }
            })
            .collect();
        Self {
            format,
            width,
            height,
            planes,
            frame_number: 0,
        }
    }

    /// Fill every plane with a constant value, e.g. for a flat test frame.
    pub fn fill(&mut self, values: [u8; 4]) {
        for (plane, value) in self.planes.iter_mut().zip(values) {
            plane.data.fill(value);
        }
    }

    /// Sample at full-resolution coordinates; chroma planes are addressed
    /// through the subsampling shifts.
    pub fn sample(&self, plane: usize, x: usize, y: usize) -> Option<u8> {
        let (x, y) = match plane {
            1 | 2 => (x >> self.format.hsub(), y >> self.format.vsub()),
            _ => (x, y),
        };
        let p = self.planes.get(plane)?;
        p.data.get(y * p.linesize + x).copied()
    }
}
