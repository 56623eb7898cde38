pub mod animation;
pub mod options;

pub use animation::{AnimationConfig, PaintMode};
pub use options::MarkerOptions;
