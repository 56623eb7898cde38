use std::fmt;

use crate::error::{MarkerError, MarkerResult};

/// Sentinel colour string selecting luma inversion.
pub const INVERT: &str = "invert";

/// A colour in the frame's native encoding: Y, U, V plus alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YuvaColor {
    pub y: u8,
    pub u: u8,
    pub v: u8,
    pub a: u8,
}

impl YuvaColor {
    /// Convert 8-bit RGBA with the fixed-point studio-swing BT.601 formulas.
    pub fn from_rgba([r, g, b, a]: [u8; 4]) -> Self {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
        let y = (fix(0.29900 * 219.0 / 255.0) * r
            + fix(0.58700 * 219.0 / 255.0) * g
            + fix(0.11400 * 219.0 / 255.0) * b
            + (ONE_HALF + (16 << SCALEBITS)))
            >> SCALEBITS;
        let u = ((-fix(0.16874 * 224.0 / 255.0) * r - fix(0.33126 * 224.0 / 255.0) * g
            + fix(0.50000 * 224.0 / 255.0) * b
            + ONE_HALF
            - 1)
            >> SCALEBITS)
            + 128;
        let v = ((fix(0.50000 * 224.0 / 255.0) * r
            - fix(0.41869 * 224.0 / 255.0) * g
            - fix(0.08131 * 224.0 / 255.0) * b
            + ONE_HALF
            - 1)
            >> SCALEBITS)
            + 128;
        Self {
            y: y.clamp(0, 255) as u8,
            u: u.clamp(0, 255) as u8,
            v: v.clamp(0, 255) as u8,
            a,
        }
    }
}

impl fmt::Display for YuvaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}{:02X}{:02X}{:02X}", self.y, self.u, self.v, self.a)
    }
}

const SCALEBITS: i32 = 10;
const ONE_HALF: i32 = 1 << (SCALEBITS - 1);

fn fix(x: f64) -> i32 {
    (x * f64::from(1 << SCALEBITS) + 0.5) as i32
}

/// What the marker column is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    /// Flip luma; colour and alpha are never read.
    Invert,
    Color(YuvaColor),
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paint::Invert => f.write_str(INVERT),
            Paint::Color(c) => write!(f, "{c}"),
        }
    }
}

/// Parse a colour option: `invert`, a colour name, or hex digits, each
/// optionally followed by `@alpha`.
pub fn parse_paint(input: &str) -> MarkerResult<Paint> {
    let s = input.trim();
    if s == INVERT {
        return Ok(Paint::Invert);
    }
    parse_rgba(s)
        .map(|rgba| Paint::Color(YuvaColor::from_rgba(rgba)))
        .ok_or_else(|| MarkerError::InvalidColor(input.to_string()))
}

fn parse_rgba(s: &str) -> Option<[u8; 4]> {
    let (color, alpha) = match s.split_once('@') {
        Some((c, a)) => (c, Some(a)),
        None => (s, None),
    };

    let mut rgba = if let Some(hex) = color
        .strip_prefix('#')
        .or_else(|| color.strip_prefix("0x"))
        .or_else(|| color.strip_prefix("0X"))
    {
        parse_hex(hex)?
    } else if let Some(rgb) = named(color) {
        [rgb[0], rgb[1], rgb[2], 0xff]
    } else {
        parse_hex(color)?
    };

    if let Some(alpha) = alpha {
        rgba[3] = parse_alpha(alpha)?;
    }
    Some(rgba)
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let a = if hex.len() == 8 { byte(6)? } else { 0xff };
    Some([byte(0)?, byte(2)?, byte(4)?, a])
}

fn parse_alpha(alpha: &str) -> Option<u8> {
    if let Some(hex) = alpha
        .strip_prefix("0x")
        .or_else(|| alpha.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).ok();
    }
    let norm: f64 = alpha.parse().ok()?;
    if !(0.0..=1.0).contains(&norm) {
        return None;
    }
    Some((255.0 * norm) as u8)
}

fn named(name: &str) -> Option<[u8; 3]> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "black" => [0x00, 0x00, 0x00],
        "white" => [0xff, 0xff, 0xff],
        "red" => [0xff, 0x00, 0x00],
        "green" => [0x00, 0x80, 0x00],
        "lime" => [0x00, 0xff, 0x00],
        "blue" => [0x00, 0x00, 0xff],
        "yellow" => [0xff, 0xff, 0x00],
        "cyan" | "aqua" => [0x00, 0xff, 0xff],
        "magenta" | "fuchsia" => [0xff, 0x00, 0xff],
        "gray" | "grey" => [0x80, 0x80, 0x80],
        "silver" => [0xc0, 0xc0, 0xc0],
        "orange" => [0xff, 0xa5, 0x00],
        "purple" => [0x80, 0x00, 0x80],
        "pink" => [0xff, 0xc0, 0xcb],
        "brown" => [0xa5, 0x2a, 0x2a],
        "navy" => [0x00, 0x00, 0x80],
        "maroon" => [0x80, 0x00, 0x00],
        "olive" => [0x80, 0x80, 0x00],
        "teal" => [0x00, 0x80, 0x80],
        "gold" => [0xff, 0xd7, 0x00],
        _ => return None,
    };
    Some(rgb)
}
