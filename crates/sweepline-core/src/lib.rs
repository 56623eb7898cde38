pub mod color;
pub mod composite;
pub mod config;
pub mod debug;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod rect;
pub mod schedule;
pub mod video;

pub use error::{MarkerError, MarkerResult};
