use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::rect::MarkerRect;
use crate::video::frame::Frame;

const TEXT_SCALE: f32 = 20.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_LINE_HEIGHT: i32 = 22;
const RECT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Where one marker instance painted on a frame.
#[derive(Debug, Clone, Copy)]
pub struct MarkerOverlay {
    pub rect: MarkerRect,
    pub column: i64,
}

/// Renders PNG previews of composited frames with the marker rectangles
/// outlined and the painted columns listed.
pub struct DebugRenderer {
    font: Option<FontVec>,
}

impl DebugRenderer {
    /// Without a font the previews carry outlines only.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(Self::load_font);
        Self { font }
    }

    pub fn save_frame(&self, frame: &Frame, overlays: &[MarkerOverlay], dir: &Path) -> Result<PathBuf> {
        let mut img = to_rgb(frame);

        for overlay in overlays {
            let r = overlay.rect;
            if r.w == 0 || r.h == 0 {
                continue;
            }
            let rect = Rect::at(r.x, r.y).of_size(r.w, r.h);
            draw_hollow_rect_mut(&mut img, rect, RECT_COLOR);
        }

        self.draw_text_overlay(&mut img, frame, overlays);

        let path = dir.join(format!("frame_{:08}.png", frame.frame_number));
        img.save(&path)
            .with_context(|| format!("failed to save debug frame to {}", path.display()))?;

        debug!(?path, "saved debug frame");
        Ok(path)
    }

    fn draw_text_overlay(&self, img: &mut RgbImage, frame: &Frame, overlays: &[MarkerOverlay]) {
        let Some(font) = &self.font else { return };
        let scale = PxScale::from(TEXT_SCALE);
        let x = 4;
        let mut y = 4;

        let header = format!("F:{}", frame.frame_number);
        draw_text_mut(img, TEXT_COLOR, x, y, scale, font, &header);
        y += TEXT_LINE_HEIGHT;

        for (i, overlay) in overlays.iter().enumerate() {
            let line = format!("#{i} X:{}", overlay.column);
            draw_text_mut(img, TEXT_COLOR, x, y, scale, font, &line);
            y += TEXT_LINE_HEIGHT;
        }
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(?path, error = %e, "failed to read font file");
                return None;
            }
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(?path, "loaded debug font");
                Some(font)
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to parse font file");
                None
            }
        }
    }
}

/// Convert a planar frame to RGB with BT.601 coefficients, studio swing or
/// full range depending on the format.
pub fn to_rgb(frame: &Frame) -> RgbImage {
    let full_range = frame.format.is_full_range();
    RgbImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let luma = frame.sample(0, x, y).unwrap_or(16);
        let cb = frame.sample(1, x, y).unwrap_or(128);
        let cr = frame.sample(2, x, y).unwrap_or(128);
        Rgb(yuv_to_rgb(luma, cb, cr, full_range))
    })
}

fn yuv_to_rgb(y: u8, u: u8, v: u8, full_range: bool) -> [u8; 3] {
    let (y, u, v) = (f32::from(y), f32::from(u) - 128.0, f32::from(v) - 128.0);
    let (y, u, v) = if full_range {
        (y, u, v)
    } else {
        ((y - 16.0) * 255.0 / 219.0, u * 255.0 / 224.0, v * 255.0 / 224.0)
    };
    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;
    [r, g, b].map(|c| c.round().clamp(0.0, 255.0) as u8)
}
