use std::sync::Arc;

use tracing::{info, warn};

use crate::color::{parse_paint, Paint, YuvaColor};
use crate::config::options::MarkerOptions;
use crate::error::{MarkerError, MarkerResult};
use crate::format::PixelFormat;
use crate::rect::MarkerRect;
use crate::schedule::SkipSchedule;

/// How the marker column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// `Y = 255 - Y`; chroma and alpha untouched.
    Invert,
    /// Hard overwrite of Y, U, V and A. Only chosen for formats with alpha.
    Replace(YuvaColor),
    /// "Over" blend of Y, U, V weighted by the colour's alpha.
    Blend(YuvaColor),
}

/// Fully resolved, read-only marker configuration for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub rect: MarkerRect,
    pub paint: Paint,
    pub replace: bool,
    pub frame_count: u32,
    pub format: PixelFormat,
    pub mode: PaintMode,
    /// Breakpoints for a non-uniform sweep, shared between instances that
    /// were given the same skip list.
    pub schedule: Option<Arc<SkipSchedule>>,
}

impl AnimationConfig {
    /// Resolve options against the stream geometry.
    ///
    /// A zero width or height becomes the frame dimension. `schedule` is the
    /// already-parsed skip list for these options, if any.
    pub fn resolve(
        opts: &MarkerOptions,
        format: PixelFormat,
        frame_width: usize,
        frame_height: usize,
        schedule: Option<Arc<SkipSchedule>>,
    ) -> MarkerResult<Self> {
        let paint = parse_paint(&opts.color)?;

        if opts.w < 0 || opts.h < 0 {
            return Err(MarkerError::NegativeSize {
                w: opts.w,
                h: opts.h,
            });
        }
        let w = if opts.w > 0 { opts.w } else { frame_width as i64 };
        let h = if opts.h > 0 { opts.h } else { frame_height as i64 };

        let min_frames = if schedule.is_some() { 1 } else { 2 };
        if opts.frame_count < min_frames {
            return Err(MarkerError::FrameCount {
                got: opts.frame_count,
                min: min_frames,
            });
        }

        let rect = MarkerRect {
            x: to_i32("x", opts.x)?,
            y: to_i32("y", opts.y)?,
            w: to_u32("w", w)?,
            h: to_u32("h", h)?,
        };
        let frame_count = to_u32("framecount", opts.frame_count)?;

        let mode = match paint {
            Paint::Invert => PaintMode::Invert,
            Paint::Color(c) if format.has_alpha() && opts.replace => PaintMode::Replace(c),
            Paint::Color(c) => {
                if opts.replace {
                    warn!(%format, "replace requested without an alpha plane, blending instead");
                }
                PaintMode::Blend(c)
            }
        };

        info!(
            x = rect.x,
            y = rect.y,
            w = rect.w,
            h = rect.h,
            color = %paint,
            frame_count,
            breakpoints = schedule.as_ref().map(|s| s.len()),
            ?mode,
            "marker configured"
        );

        Ok(Self {
            rect,
            paint,
            replace: opts.replace,
            frame_count,
            format,
            mode,
            schedule,
        })
    }

    pub fn hsub(&self) -> u32 {
        self.format.hsub()
    }

    pub fn vsub(&self) -> u32 {
        self.format.vsub()
    }

    pub fn has_alpha_plane(&self) -> bool {
        self.format.has_alpha()
    }
}

fn to_i32(name: &str, v: i64) -> MarkerResult<i32> {
    i32::try_from(v).map_err(|_| MarkerError::InvalidOption(format!("{name}={v}")))
}

fn to_u32(name: &str, v: i64) -> MarkerResult<u32> {
    u32::try_from(v).map_err(|_| MarkerError::InvalidOption(format!("{name}={v}")))
}
