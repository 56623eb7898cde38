use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::composite::composite;
use crate::config::{AnimationConfig, MarkerOptions};
use crate::debug::{DebugRenderer, MarkerOverlay};
use crate::error::MarkerResult;
use crate::format::PixelFormat;
use crate::schedule::{parse_skip, resolve_offset, FrameCursor, SkipSchedule};
use crate::video::frame::Frame;
use crate::video::raw::{RawFrameReader, RawFrameWriter};

/// How marker instances in one chain count frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// One counter for the whole chain, divided by the instance count.
    /// Correct only while every instance sees every frame in order.
    #[default]
    Shared,
    /// Each instance owns its counter.
    PerInstance,
}

/// One configured marker plus the cursor it reads and advances.
#[derive(Debug)]
pub struct MarkerInstance {
    config: AnimationConfig,
    cursor: Arc<FrameCursor>,
}

impl MarkerInstance {
    /// Register against `cursor` and take ownership of `config`.
    pub fn new(config: AnimationConfig, cursor: Arc<FrameCursor>) -> Self {
        cursor.register_instance();
        Self { config, cursor }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn cursor(&self) -> &Arc<FrameCursor> {
        &self.cursor
    }

    /// Column this instance would paint on the next frame.
    pub fn current_offset(&self) -> i64 {
        resolve_offset(
            self.cursor.frames_seen(),
            self.cursor.instance_count(),
            self.config.frame_count,
            self.config.rect,
            self.config.schedule.as_deref(),
        )
    }

    /// Paint the marker into `frame`, then advance the cursor once.
    /// Returns the painted column.
    pub fn apply(&self, frame: &mut Frame) -> MarkerResult<i64> {
        let offset = self.current_offset();
        composite(frame, &self.config, offset)?;
        self.cursor.advance();
        Ok(offset)
    }
}

/// Marker instances applied to every frame in order.
#[derive(Debug)]
pub struct MarkerChain {
    instances: Vec<MarkerInstance>,
}

impl MarkerChain {
    /// Resolve every option set against the stream geometry.
    ///
    /// Skip lists are parsed once per distinct string and shared between the
    /// instances that name it.
    pub fn build(
        options: &[MarkerOptions],
        format: PixelFormat,
        width: usize,
        height: usize,
        mode: CursorMode,
    ) -> MarkerResult<Self> {
        let shared = Arc::new(FrameCursor::new());
        let mut schedules: HashMap<&str, Arc<SkipSchedule>> = HashMap::new();
        let mut instances = Vec::with_capacity(options.len());

        for opts in options {
            let schedule = match schedules.get(opts.skip.as_str()) {
                Some(s) => Some(Arc::clone(s)),
                None => {
                    let parsed = parse_skip(&opts.skip)?.map(Arc::new);
                    if let Some(s) = &parsed {
                        debug!(breakpoints = s.len(), "loaded skip schedule");
                        schedules.insert(opts.skip.as_str(), Arc::clone(s));
                    }
                    parsed
                }
            };

            let config = AnimationConfig::resolve(opts, format, width, height, schedule)?;
            let cursor = match mode {
                CursorMode::Shared => Arc::clone(&shared),
                CursorMode::PerInstance => Arc::new(FrameCursor::new()),
            };
            instances.push(MarkerInstance::new(config, cursor));
        }

        info!(
            instances = instances.len(),
            schedules = schedules.len(),
            ?mode,
            "marker chain ready"
        );
        Ok(Self { instances })
    }

    pub fn instances(&self) -> &[MarkerInstance] {
        &self.instances
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Run every instance over `frame`. Returns the painted column of each.
    pub fn apply(&self, frame: &mut Frame) -> MarkerResult<Vec<i64>> {
        self.instances.iter().map(|m| m.apply(frame)).collect()
    }
}

/// Column for each frame index of a single marker run on its own cursor.
pub fn plan_offsets(config: &AnimationConfig) -> Vec<i64> {
    (0..u64::from(config.frame_count))
        .map(|i| {
            resolve_offset(
                i,
                1,
                config.frame_count,
                config.rect,
                config.schedule.as_deref(),
            )
        })
        .collect()
}

/// Parameters for a raw-stream run.
pub struct PipelineConfig {
    /// Maximum number of frames to process, or None for the entire stream.
    pub max_frames: Option<u64>,
    /// Directory to write PNG previews, or None to skip.
    pub debug_frames_dir: Option<PathBuf>,
    /// Save a preview every Nth frame.
    pub debug_every: u64,
    /// Font for preview labels.
    pub debug_font: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frames: None,
            debug_frames_dir: None,
            debug_every: 30,
            debug_font: None,
        }
    }
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub previews: u64,
}

/// Pull frames from `reader`, paint every marker of `chain`, push to `writer`.
pub fn run_pipeline<R: Read, W: Write>(
    reader: &mut RawFrameReader<R>,
    writer: &mut RawFrameWriter<W>,
    chain: &MarkerChain,
    config: &PipelineConfig,
) -> Result<RunSummary> {
    if config.debug_every < 1 {
        bail!("debug_every must be >= 1, got {}", config.debug_every);
    }

    info!(
        width = reader.width(),
        height = reader.height(),
        format = %reader.format(),
        markers = chain.instances().len(),
        max_frames = ?config.max_frames,
        "pipeline starting"
    );

    let debug_renderer = match &config.debug_frames_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            info!(?dir, "debug frames directory ready");
            Some(DebugRenderer::new(config.debug_font.as_deref()))
        }
        None => None,
    };

    let mut summary = RunSummary {
        frames: 0,
        previews: 0,
    };

    loop {
        if let Some(max) = config.max_frames {
            if summary.frames >= max {
                break;
            }
        }

        let Some(mut frame) = reader.next_frame()? else {
            break;
        };

        let columns = chain
            .apply(&mut frame)
            .with_context(|| format!("failed to paint frame {}", frame.frame_number))?;
        debug!(frame_number = frame.frame_number, ?columns, "frame painted");

        if let (Some(renderer), Some(dir)) = (&debug_renderer, &config.debug_frames_dir) {
            if frame.frame_number % config.debug_every == 0 {
                let overlays: Vec<MarkerOverlay> = chain
                    .instances()
                    .iter()
                    .zip(&columns)
                    .map(|(m, &column)| MarkerOverlay {
                        rect: m.config().rect,
                        column,
                    })
                    .collect();
                renderer
                    .save_frame(&frame, &overlays, dir)
                    .context("failed to save debug frame")?;
                summary.previews += 1;
            }
        }

        writer.write_frame(&frame)?;
        summary.frames += 1;
    }

    info!(frames = summary.frames, previews = summary.previews, "pipeline complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tracing_test::traced_test;

    use super::*;

    fn options(list: &[&str]) -> Vec<MarkerOptions> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    /// Luma columns on row `y` that differ from `background`.
    fn painted(frame: &Frame, y: usize, background: u8) -> Vec<usize> {
        (0..frame.width)
            .filter(|&x| frame.sample(0, x, y) != Some(background))
            .collect()
    }

    #[test]
    fn instance_advances_cursor_once_per_frame() {
        let chain = MarkerChain::build(
            &options(&["w=10:h=1:c=white:f=5"]),
            PixelFormat::Yuv444p,
            10,
            1,
            CursorMode::Shared,
        )
        .unwrap();
        let mut cols = Vec::new();
        for _ in 0..5 {
            let mut frame = Frame::new(PixelFormat::Yuv444p, 10, 1);
            cols.extend(chain.apply(&mut frame).unwrap());
        }
        assert_eq!(cols, vec![0, 2, 5, 7, 9]);
        assert_eq!(chain.instances()[0].cursor().frames_seen(), 5);
    }

    #[test]
    fn shared_cursor_keeps_chained_instances_in_step() {
        let chain = MarkerChain::build(
            &options(&["y=0:h=1:c=white:f=4", "y=1:h=1:c=white:f=4"]),
            PixelFormat::Yuv444p,
            7,
            2,
            CursorMode::Shared,
        )
        .unwrap();
        let cursor = chain.instances()[0].cursor();
        assert!(Arc::ptr_eq(cursor, chain.instances()[1].cursor()));
        assert_eq!(cursor.instance_count(), 2);

        for expected in [0usize, 2, 4, 6] {
            let mut frame = Frame::new(PixelFormat::Yuv444p, 7, 2);
            let cols = chain.apply(&mut frame).unwrap();
            assert_eq!(cols, vec![expected as i64; 2]);
            assert_eq!(painted(&frame, 0, 0), vec![expected]);
            assert_eq!(painted(&frame, 1, 0), vec![expected]);
        }
        assert_eq!(cursor.frames_seen(), 8);
    }

    #[test]
    fn per_instance_cursors_are_independent() {
        let chain = MarkerChain::build(
            &options(&["c=white:f=4", "c=invert:f=4"]),
            PixelFormat::Yuv420p,
            8,
            2,
            CursorMode::PerInstance,
        )
        .unwrap();
        let [a, b] = chain.instances() else {
            panic!("expected two instances");
        };
        assert!(!Arc::ptr_eq(a.cursor(), b.cursor()));
        assert_eq!(a.cursor().instance_count(), 1);

        let mut frame = Frame::new(PixelFormat::Yuv420p, 8, 2);
        a.apply(&mut frame).unwrap();
        a.apply(&mut frame).unwrap();
        assert_eq!(a.current_offset(), 5);
        assert_eq!(b.current_offset(), 0);
    }

    #[test]
    fn identical_skip_lists_share_one_schedule() {
        let chain = MarkerChain::build(
            &options(&["skip=0|4|8:f=3", "skip=0|4|8:f=3:y=1", "skip=1|2:f=3"]),
            PixelFormat::Yuv420p,
            16,
            4,
            CursorMode::Shared,
        )
        .unwrap();
        let s: Vec<_> = chain
            .instances()
            .iter()
            .map(|m| m.config().schedule.clone().unwrap())
            .collect();
        assert!(Arc::ptr_eq(&s[0], &s[1]));
        assert!(!Arc::ptr_eq(&s[0], &s[2]));
    }

    #[test]
    fn setup_errors_surface_before_frames() {
        let err = MarkerChain::build(
            &options(&["c=white:f=4", "skip=1|x"]),
            PixelFormat::Yuv420p,
            8,
            8,
            CursorMode::Shared,
        )
        .unwrap_err();
        assert!(err.to_string().contains("1|x"), "{err}");
    }

    #[test]
    fn plan_matches_uniform_scenario() {
        let chain = MarkerChain::build(
            &options(&["w=10:f=5"]),
            PixelFormat::Yuv420p,
            32,
            2,
            CursorMode::Shared,
        )
        .unwrap();
        assert_eq!(plan_offsets(chain.instances()[0].config()), vec![0, 2, 5, 7, 9]);
    }

    #[test]
    #[traced_test]
    fn run_pipeline_paints_and_forwards_every_frame() {
        let format = PixelFormat::Yuv420p;
        let (w, h) = (6, 2);
        let frame_bytes = format.frame_bytes(w, h);
        let input = vec![16u8; frame_bytes * 3];

        let chain = MarkerChain::build(
            &options(&["c=white:f=3"]),
            format,
            w,
            h,
            CursorMode::Shared,
        )
        .unwrap();
        let mut reader = RawFrameReader::new(Cursor::new(input), format, w, h);
        let mut writer = RawFrameWriter::new(Vec::new());

        let summary =
            run_pipeline(&mut reader, &mut writer, &chain, &PipelineConfig::default()).unwrap();
        assert_eq!(summary, RunSummary { frames: 3, previews: 0 });

        let out = writer.finish().unwrap();
        assert_eq!(out.len(), frame_bytes * 3);
        let mut out_reader = RawFrameReader::new(Cursor::new(out), format, w, h);
        for expected in [0usize, 3, 5] {
            let frame = out_reader.next_frame().unwrap().unwrap();
            assert_eq!(painted(&frame, 0, 16), vec![expected]);
            assert_eq!(painted(&frame, 1, 16), vec![expected]);
        }
        assert!(logs_contain("pipeline complete"));
    }

    #[test]
    fn run_pipeline_honours_max_frames() {
        let format = PixelFormat::Yuv444p;
        let input = vec![0u8; format.frame_bytes(2, 2) * 5];
        let chain =
            MarkerChain::build(&options(&["f=5"]), format, 2, 2, CursorMode::Shared).unwrap();
        let mut reader = RawFrameReader::new(Cursor::new(input), format, 2, 2);
        let mut writer = RawFrameWriter::new(Vec::new());
        let config = PipelineConfig {
            max_frames: Some(2),
            ..PipelineConfig::default()
        };
        let summary = run_pipeline(&mut reader, &mut writer, &chain, &config).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(writer.frames_written(), 2);
    }
}
