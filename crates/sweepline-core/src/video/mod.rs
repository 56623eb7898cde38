pub mod frame;
pub mod raw;
