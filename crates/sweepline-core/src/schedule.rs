use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{MarkerError, MarkerResult};
use crate::rect::MarkerRect;

/// Skip string meaning "no breakpoint list, advance uniformly".
pub const NO_SKIP: &str = "-";

const SKIP_DELIMITER: char = '|';

/// Breakpoint offsets for a non-uniform sweep. Each value is a pixel offset
/// from the rectangle's left edge, used verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipSchedule {
    breakpoints: Vec<f32>,
}

impl SkipSchedule {
    /// Parse a `|`-delimited list. One value per delimiter plus one; empty or
    /// non-finite entries are rejected.
    pub fn parse(input: &str) -> MarkerResult<Self> {
        let invalid = |reason: String| MarkerError::InvalidSchedule {
            input: input.to_string(),
            reason,
        };

        let count = input.matches(SKIP_DELIMITER).count() + 1;
        let mut breakpoints = Vec::new();
        breakpoints
            .try_reserve_exact(count)
            .map_err(|_| MarkerError::Allocation(count))?;

        for (i, token) in input.split(SKIP_DELIMITER).enumerate() {
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid(format!("entry {i} is empty")));
            }
            let value: f32 = token
                .parse()
                .map_err(|_| invalid(format!("entry {i} ('{token}') is not a number")))?;
            if !value.is_finite() {
                return Err(invalid(format!("entry {i} ('{token}') is not finite")));
            }
            breakpoints.push(value);
        }

        Ok(Self { breakpoints })
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    pub fn breakpoints(&self) -> &[f32] {
        &self.breakpoints
    }

    /// Breakpoint for `local_index` out of `frame_count` frames. The index is
    /// clamped to the list, so any frame number is safe.
    pub fn breakpoint_at(&self, local_index: u64, frame_count: u32) -> f32 {
        let last = self.breakpoints.len().saturating_sub(1) as u64;
        let idx = if frame_count <= 1 {
            0
        } else {
            let span = u64::from(frame_count) - 1;
            rounded_div(last * local_index.min(span), span)
        };
        self.breakpoints[idx.min(last) as usize]
    }
}

/// Parse a skip option, where [`NO_SKIP`] selects the uniform sweep.
pub fn parse_skip(input: &str) -> MarkerResult<Option<SkipSchedule>> {
    if input.trim() == NO_SKIP {
        return Ok(None);
    }
    SkipSchedule::parse(input).map(Some)
}

/// Division rounding halves up. Operands are non-negative.
pub fn rounded_div(a: u64, b: u64) -> u64 {
    (a + b / 2) / b
}

/// Frame counter shared by every marker instance that composites the same
/// stream.
///
/// Each instance registers once during setup and advances the counter once
/// per frame it paints. A chain of N instances therefore moves the counter N
/// times per video frame, and `frames_seen / instance_count` recovers the
/// per-instance frame index. That only holds while every instance sees every
/// frame in lockstep; instances fed at different rates need their own cursor.
#[derive(Debug, Default)]
pub struct FrameCursor {
    frames_seen: AtomicU64,
    instance_count: AtomicU64,
}

impl FrameCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one instance to the demultiplexing divisor. Returns the new count.
    pub fn register_instance(&self) -> u64 {
        self.instance_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen.load(Ordering::Relaxed)
    }

    pub fn instance_count(&self) -> u64 {
        self.instance_count.load(Ordering::Relaxed)
    }

    pub fn local_index(&self) -> u64 {
        self.frames_seen() / self.instance_count().max(1)
    }

    pub fn advance(&self) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
    }
}

/// Column the marker occupies for the current frame, clamped into
/// `[rect.x, rect.x + rect.w - 1]`.
pub fn resolve_offset(
    frames_seen: u64,
    instance_count: u64,
    frame_count: u32,
    rect: MarkerRect,
    schedule: Option<&SkipSchedule>,
) -> i64 {
    let local_index = frames_seen / instance_count.max(1);
    let left = i64::from(rect.x);
    let right = rect.last_column();

    let position = match schedule {
        None => {
            if frame_count <= 1 {
                left
            } else {
                let span = u64::from(frame_count) - 1;
                let travel = u64::from(rect.w.saturating_sub(1));
                let raw = rounded_div(local_index.min(span) * travel, span);
                left + raw as i64
            }
        }
        Some(schedule) => {
            let raw = schedule.breakpoint_at(local_index, frame_count);
            // Integer truncation of the summed position.
            (left as f64 + f64::from(raw)) as i64
        }
    };

    let offset = position.clamp(left, right);
    debug!(frames_seen, local_index, offset, "resolved marker offset");
    offset
}
