/// Setup and bounds failures raised by the marker core.
///
/// Everything here is fatal for the run: configuration errors surface before
/// the first frame, plane bounds errors reject a frame before any byte is
/// written.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MarkerError {
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("size values less than 0 are not acceptable (w={w}, h={h})")]
    NegativeSize { w: i64, h: i64 },

    #[error("invalid skip schedule '{input}': {reason}")]
    InvalidSchedule { input: String, reason: String },

    #[error("framecount must be {min} or more for this schedule, got {got}")]
    FrameCount { got: i64, min: i64 },

    #[error("invalid marker option '{0}'")]
    InvalidOption(String),

    #[error("unknown pixel format '{0}'")]
    UnknownPixelFormat(String),

    #[error("invalid frame size '{0}'")]
    InvalidFrameSize(String),

    #[error("failed to allocate {0} breakpoints")]
    Allocation(usize),

    #[error("plane {plane} holds {len} bytes, needs at least {needed}")]
    PlaneBounds {
        plane: usize,
        len: usize,
        needed: usize,
    },
}

pub type MarkerResult<T> = Result<T, MarkerError>;
