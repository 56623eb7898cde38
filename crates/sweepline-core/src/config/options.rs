use std::str::FromStr;

use tracing::debug;

use crate::color::INVERT;
use crate::error::{MarkerError, MarkerResult};
use crate::schedule::NO_SKIP;

/// Raw per-instance marker options, before they are resolved against the
/// stream geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub x: i64,
    pub y: i64,
    /// 0 means the full frame width.
    pub w: i64,
    /// 0 means the full frame height.
    pub h: i64,
    pub color: String,
    pub skip: String,
    pub frame_count: i64,
    pub replace: bool,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            color: "black".to_string(),
            skip: NO_SKIP.to_string(),
            frame_count: 3,
            replace: false,
        }
    }
}

impl MarkerOptions {
    pub fn is_invert(&self) -> bool {
        self.color.trim() == INVERT
    }
}

/// Parses a `key=value:key=value` list. Unset keys keep their defaults.
impl FromStr for MarkerOptions {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut opts = MarkerOptions::default();

        for pair in s.split(':').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| MarkerError::InvalidOption(pair.to_string()))?;
            let value = value.trim();

            match key.trim() {
                "x" => opts.x = parse_int(pair, value)?,
                "y" => opts.y = parse_int(pair, value)?,
                "w" | "width" => opts.w = parse_int(pair, value)?,
                "h" | "height" => opts.h = parse_int(pair, value)?,
                "c" | "color" => opts.color = value.to_string(),
                "skip" => opts.skip = value.to_string(),
                "f" | "framecount" => opts.frame_count = parse_int(pair, value)?,
                "replace" => opts.replace = parse_bool(pair, value)?,
                _ => return Err(MarkerError::InvalidOption(pair.to_string())),
            }
        }

        debug!(?opts, "parsed marker options");
        Ok(opts)
    }
}

fn parse_int(pair: &str, value: &str) -> MarkerResult<i64> {
    value
        .parse()
        .map_err(|_| MarkerError::InvalidOption(pair.to_string()))
}

fn parse_bool(pair: &str, value: &str) -> MarkerResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MarkerError::InvalidOption(pair.to_string())),
    }
}
