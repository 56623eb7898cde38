use tracing::debug;

use crate::config::{AnimationConfig, PaintMode};
use crate::error::{MarkerError, MarkerResult};
use crate::video::frame::Frame;

const Y: usize = 0;
const U: usize = 1;
const V: usize = 2;
const A: usize = 3;

/// Paint the marker column at `offset_x` into `frame` in place.
///
/// Only the single column `offset_x` inside the rectangle is written, for
/// every rectangle row that lies inside the frame. Plane buffers are checked
/// up front; a frame too small for its own format is rejected untouched.
pub fn composite(frame: &mut Frame, config: &AnimationConfig, offset_x: i64) -> MarkerResult<()> {
    check_planes(frame, config)?;

    let rows = config.rect.rows_within(frame.height);
    let columns = config.rect.columns_within(frame.width);
    let x = match usize::try_from(offset_x) {
        Ok(x) if columns.contains(&x) => x,
        _ => {
            debug!(offset_x, ?columns, "marker column outside frame, nothing painted");
            return Ok(());
        }
    };

    let hsub = config.hsub();
    let vsub = config.vsub();
    let cx = x >> hsub;

    match config.mode {
        PaintMode::Invert => {
            let luma = &mut frame.planes[Y];
            for y in rows.clone() {
                let px = &mut luma.data[y * luma.linesize + x];
                *px = 0xff - *px;
            }
        }
        PaintMode::Replace(color) => {
            for y in rows.clone() {
                let cy = y >> vsub;
                put(frame, Y, x, y, color.y);
                put(frame, U, cx, cy, color.u);
                put(frame, V, cx, cy, color.v);
                put(frame, A, x, y, color.a);
            }
        }
        PaintMode::Blend(color) => {
            let alpha = f64::from(color.a) / 255.0;
            for y in rows.clone() {
                let cy = y >> vsub;
                blend(frame, Y, x, y, color.y, alpha);
                blend(frame, U, cx, cy, color.u, alpha);
                blend(frame, V, cx, cy, color.v, alpha);
            }
        }
    }

    debug!(x, rows = rows.len(), mode = ?config.mode, "painted marker column");
    Ok(())
}

fn put(frame: &mut Frame, plane: usize, x: usize, y: usize, value: u8) {
    let p = &mut frame.planes[plane];
    p.data[y * p.linesize + x] = value;
}

fn blend(frame: &mut Frame, plane: usize, x: usize, y: usize, value: u8, alpha: f64) {
    let p = &mut frame.planes[plane];
    let px = &mut p.data[y * p.linesize + x];
    *px = mix(*px, value, alpha);
}

/// `(1 - alpha) * existing + alpha * value`, truncated.
fn mix(existing: u8, value: u8, alpha: f64) -> u8 {
    ((1.0 - alpha) * f64::from(existing) + alpha * f64::from(value)) as u8
}

/// Every plane the mode touches must cover its full extent for the frame's
/// format and size.
fn check_planes(frame: &Frame, config: &AnimationConfig) -> MarkerResult<()> {
    let planes: &[usize] = match config.mode {
        PaintMode::Invert => &[Y],
        PaintMode::Blend(_) => &[Y, U, V],
        PaintMode::Replace(_) => &[Y, U, V, A],
    };

    for &plane in planes {
        let (w, h) = config.format.plane_size(plane, frame.width, frame.height);
        let Some(p) = frame.planes.get(plane) else {
            return Err(MarkerError::PlaneBounds {
                plane,
                len: 0,
                needed: w * h,
            });
        };
        let needed = if h == 0 { 0 } else { p.linesize.max(w) * (h - 1) + w };
        if p.linesize < w || p.data.len() < needed {
            return Err(MarkerError::PlaneBounds {
                plane,
                len: p.data.len(),
                needed,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::MarkerOptions;
    use crate::format::PixelFormat;
    use crate::schedule::{resolve_offset, SkipSchedule};

    fn config(opts: &str, format: PixelFormat, w: usize, h: usize) -> AnimationConfig {
        let opts: MarkerOptions = opts.parse().unwrap();
        let schedule = crate::schedule::parse_skip(&opts.skip).unwrap().map(Arc::new);
        AnimationConfig::resolve(&opts, format, w, h, schedule).unwrap()
    }

    fn flat(format: PixelFormat, w: usize, h: usize, values: [u8; 4]) -> Frame {
        let mut f = Frame::new(format, w, h);
        f.fill(values);
        f
    }

    /// Columns whose luma differs from `background` on row `y`.
    fn changed_columns(frame: &Frame, y: usize, background: u8) -> Vec<usize> {
        (0..frame.width)
            .filter(|&x| frame.sample(Y, x, y) != Some(background))
            .collect()
    }

    #[test]
    fn uniform_sweep_moves_one_column_per_frame() {
        let cfg = config("w=10:h=1:c=white:f=5", PixelFormat::Yuv444p, 10, 1);
        let mut columns = Vec::new();
        for i in 0..5 {
            let mut frame = flat(PixelFormat::Yuv444p, 10, 1, [0, 128, 128, 0]);
            let off = resolve_offset(i, 1, cfg.frame_count, cfg.rect, None);
            composite(&mut frame, &cfg, off).unwrap();
            let changed = changed_columns(&frame, 0, 0);
            assert_eq!(changed.len(), 1);
            columns.push(changed[0]);
        }
        assert_eq!(columns, vec![0, 2, 5, 7, 9]);
    }

    #[test]
    fn only_marker_column_inside_rect_rows_changes() {
        let cfg = config("x=2:y=1:w=4:h=2:c=white:f=2", PixelFormat::Yuv444p, 8, 4);
        let mut frame = flat(PixelFormat::Yuv444p, 8, 4, [10, 128, 128, 0]);
        composite(&mut frame, &cfg, 3).unwrap();
        for y in 0..4 {
            let expected = if (1..3).contains(&y) { vec![3] } else { vec![] };
            assert_eq!(changed_columns(&frame, y, 10), expected, "row {y}");
        }
    }

    #[test]
    fn invert_twice_restores_luma() {
        let cfg = config("c=invert:f=2", PixelFormat::Yuv420p, 4, 4);
        let mut frame = flat(PixelFormat::Yuv420p, 4, 4, [37, 90, 200, 0]);
        let original = frame.clone();

        composite(&mut frame, &cfg, 1).unwrap();
        assert_eq!(frame.sample(Y, 1, 2), Some(255 - 37));
        assert_eq!(frame.planes[U], original.planes[U]);
        assert_eq!(frame.planes[V], original.planes[V]);

        composite(&mut frame, &cfg, 1).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn opaque_blend_equals_replace_on_yuv() {
        let blend_cfg = config("c=red:f=2", PixelFormat::Yuva444p, 4, 2);
        let replace_cfg = config("c=red:f=2:replace=1", PixelFormat::Yuva444p, 4, 2);

        let mut a = flat(PixelFormat::Yuva444p, 4, 2, [200, 30, 60, 9]);
        let mut b = a.clone();
        composite(&mut a, &blend_cfg, 2).unwrap();
        composite(&mut b, &replace_cfg, 2).unwrap();

        for plane in [Y, U, V] {
            assert_eq!(a.planes[plane], b.planes[plane], "plane {plane}");
        }
        // Blend leaves alpha alone, replace writes it.
        assert_eq!(a.sample(A, 2, 0), Some(9));
        assert_eq!(b.sample(A, 2, 0), Some(255));
    }

    #[test]
    fn transparent_blend_is_a_no_op() {
        let cfg = config("c=red@0:f=2", PixelFormat::Yuv420p, 6, 4);
        let mut frame = flat(PixelFormat::Yuv420p, 6, 4, [50, 60, 70, 0]);
        let original = frame.clone();
        composite(&mut frame, &cfg, 3).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn half_blend_mixes_toward_color() {
        let cfg = config("c=white@0x80:f=2", PixelFormat::Yuv444p, 2, 1);
        let mut frame = flat(PixelFormat::Yuv444p, 2, 1, [16, 128, 128, 0]);
        composite(&mut frame, &cfg, 0).unwrap();
        let expected = mix(16, 235, 128.0 / 255.0);
        assert_eq!(frame.sample(Y, 0, 0), Some(expected));
        assert_eq!(expected, 125);
    }

    #[test]
    fn replace_writes_exact_bytes_regardless_of_content() {
        let cfg = config("c=0x336699@0x40:f=2:replace=1", PixelFormat::Yuva420p, 4, 4);
        let PaintMode::Replace(color) = cfg.mode else {
            panic!("expected replace mode, got {:?}", cfg.mode);
        };
        for fill in [[0, 0, 0, 0], [255, 255, 255, 255], [7, 99, 180, 33]] {
            let mut frame = flat(PixelFormat::Yuva420p, 4, 4, fill);
            composite(&mut frame, &cfg, 3).unwrap();
            for y in 0..4 {
                assert_eq!(frame.sample(Y, 3, y), Some(color.y));
                assert_eq!(frame.sample(U, 3, y), Some(color.u));
                assert_eq!(frame.sample(V, 3, y), Some(color.v));
                assert_eq!(frame.sample(A, 3, y), Some(color.a));
            }
        }
    }

    #[test]
    fn chroma_rows_shared_across_subsampled_luma_rows() {
        let cfg = config("c=red:f=2", PixelFormat::Yuv420p, 8, 4);
        let mut frame = flat(PixelFormat::Yuv420p, 8, 4, [0, 128, 128, 0]);
        composite(&mut frame, &cfg, 5).unwrap();
        // x=5 lands in chroma column 2 on both chroma rows.
        let u = &frame.planes[U];
        for cy in 0..2 {
            for cx in 0..4 {
                let expected = if cx == 2 { 90 } else { 128 };
                assert_eq!(u.data[cy * u.linesize + cx], expected, "chroma ({cx},{cy})");
            }
        }
    }

    #[test]
    fn rect_outside_frame_touches_nothing() {
        let cfg = config("x=20:w=5:h=2:c=white:f=2", PixelFormat::Yuv420p, 10, 4);
        let mut frame = flat(PixelFormat::Yuv420p, 10, 4, [1, 2, 3, 0]);
        let original = frame.clone();
        let off = resolve_offset(1, 1, cfg.frame_count, cfg.rect, None);
        composite(&mut frame, &cfg, off).unwrap();
        assert_eq!(frame, original);

        let cfg = config("y=-10:h=3:c=white:f=2", PixelFormat::Yuv420p, 10, 4);
        composite(&mut frame, &cfg, 0).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn negative_origin_is_clipped() {
        let cfg = config("x=-3:y=-1:w=6:h=3:c=white:f=2", PixelFormat::Yuv444p, 4, 4);
        let mut frame = flat(PixelFormat::Yuv444p, 4, 4, [0, 128, 128, 0]);
        composite(&mut frame, &cfg, 1).unwrap();
        assert_eq!(changed_columns(&frame, 0, 0), vec![1]);
        assert_eq!(changed_columns(&frame, 1, 0), vec![1]);
        assert!(changed_columns(&frame, 2, 0).is_empty());
    }

    #[test]
    fn schedule_breakpoint_drives_column() {
        let cfg = config("w=200:h=1:c=white:skip=0|50|100:f=3", PixelFormat::Yuv444p, 200, 1);
        let schedule: &SkipSchedule = cfg.schedule.as_deref().unwrap();
        let mut frame = flat(PixelFormat::Yuv444p, 200, 1, [0, 128, 128, 0]);
        let off = resolve_offset(1, 1, cfg.frame_count, cfg.rect, Some(schedule));
        composite(&mut frame, &cfg, off).unwrap();
        assert_eq!(changed_columns(&frame, 0, 0), vec![50]);
    }

    #[test]
    fn undersized_plane_rejected_before_writing() {
        let cfg = config("c=white:f=2", PixelFormat::Yuv420p, 4, 4);
        let mut frame = flat(PixelFormat::Yuv420p, 4, 4, [0, 0, 0, 0]);
        frame.planes[V].data.truncate(1);
        let before = frame.clone();
        let err = composite(&mut frame, &cfg, 0).unwrap_err();
        assert_eq!(
            err,
            MarkerError::PlaneBounds {
                plane: 2,
                len: 1,
                needed: 4
            }
        );
        assert_eq!(frame, before);
    }
}
