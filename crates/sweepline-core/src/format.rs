use std::fmt;
use std::str::FromStr;

use crate::error::MarkerError;

/// Planar YUV layouts the compositor can paint into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Yuv444p,
    Yuv422p,
    Yuv420p,
    Yuv411p,
    Yuv410p,
    Yuvj444p,
    Yuvj422p,
    Yuvj420p,
    Yuv440p,
    Yuvj440p,
    Yuva420p,
    Yuva422p,
    Yuva444p,
}

const ALL: [PixelFormat; 13] = [
    PixelFormat::Yuv444p,
    PixelFormat::Yuv422p,
    PixelFormat::Yuv420p,
    PixelFormat::Yuv411p,
    PixelFormat::Yuv410p,
    PixelFormat::Yuvj444p,
    PixelFormat::Yuvj422p,
    PixelFormat::Yuvj420p,
    PixelFormat::Yuv440p,
    PixelFormat::Yuvj440p,
    PixelFormat::Yuva420p,
    PixelFormat::Yuva422p,
    PixelFormat::Yuva444p,
];

impl PixelFormat {
    pub fn all() -> &'static [PixelFormat] {
        &ALL
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Yuv444p => "yuv444p",
            PixelFormat::Yuv422p => "yuv422p",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv411p => "yuv411p",
            PixelFormat::Yuv410p => "yuv410p",
            PixelFormat::Yuvj444p => "yuvj444p",
            PixelFormat::Yuvj422p => "yuvj422p",
            PixelFormat::Yuvj420p => "yuvj420p",
            PixelFormat::Yuv440p => "yuv440p",
            PixelFormat::Yuvj440p => "yuvj440p",
            PixelFormat::Yuva420p => "yuva420p",
            PixelFormat::Yuva422p => "yuva422p",
            PixelFormat::Yuva444p => "yuva444p",
        }
    }

    /// log2 of the horizontal chroma subsampling factor.
    pub fn hsub(self) -> u32 {
        match self {
            PixelFormat::Yuv444p
            | PixelFormat::Yuvj444p
            | PixelFormat::Yuv440p
            | PixelFormat::Yuvj440p
            | PixelFormat::Yuva444p => 0,
            PixelFormat::Yuv422p
            | PixelFormat::Yuvj422p
            | PixelFormat::Yuv420p
            | PixelFormat::Yuvj420p
            | PixelFormat::Yuva420p
            | PixelFormat::Yuva422p => 1,
            PixelFormat::Yuv411p | PixelFormat::Yuv410p => 2,
        }
    }

    /// log2 of the vertical chroma subsampling factor.
    pub fn vsub(self) -> u32 {
        match self {
            PixelFormat::Yuv444p
            | PixelFormat::Yuvj444p
            | PixelFormat::Yuv422p
            | PixelFormat::Yuvj422p
            | PixelFormat::Yuv411p
            | PixelFormat::Yuva422p
            | PixelFormat::Yuva444p => 0,
            PixelFormat::Yuv420p
            | PixelFormat::Yuvj420p
            | PixelFormat::Yuv440p
            | PixelFormat::Yuvj440p
            | PixelFormat::Yuva420p
            | PixelFormat::Yuv410p => 1,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuva420p | PixelFormat::Yuva422p | PixelFormat::Yuva444p
        )
    }

    /// Full-range ("JPEG") luma instead of studio swing.
    pub fn is_full_range(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuvj444p
                | PixelFormat::Yuvj422p
                | PixelFormat::Yuvj420p
                | PixelFormat::Yuvj440p
        )
    }

    pub fn plane_count(self) -> usize {
        if self.has_alpha() {
            4
        } else {
            3
        }
    }

    /// Width and height of `plane` for a frame of `width`x`height`.
    /// Chroma dimensions round up so odd sizes keep their last column/row.
    pub fn plane_size(self, plane: usize, width: usize, height: usize) -> (usize, usize) {
        match plane {
            1 | 2 => (
                chroma_extent(width, self.hsub()),
                chroma_extent(height, self.vsub()),
            ),
            _ => (width, height),
        }
    }

    /// Bytes in one tightly packed frame.
    pub fn frame_bytes(self, width: usize, height: usize) -> usize {
        (0..self.plane_count())
            .map(|p| {
                let (w, h) = self.plane_size(p, width, height);
                w * h
            })
            .sum()
    }
}

fn chroma_extent(len: usize, shift: u32) -> usize {
    let step = 1usize << shift;
    len.div_ceil(step)
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL.iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| MarkerError::UnknownPixelFormat(s.to_string()))
    }
}
