mod cli;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use sweepline_core::config::{AnimationConfig, MarkerOptions};
use sweepline_core::format::PixelFormat;
use sweepline_core::pipeline::{self, MarkerChain, PipelineConfig};
use sweepline_core::schedule::parse_skip;
use sweepline_core::video::raw::{parse_frame_size, RawFrameReader, RawFrameWriter};

fn main() -> Result<()> {
    // stdout may carry raw video, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Run {
            input,
            output,
            size,
            pix_fmt,
            markers,
            cursor,
            max_frames,
            debug_frames,
            debug_every,
            debug_font,
        } => {
            info!(?input, ?output, %size, %pix_fmt, markers = markers.len(), "starting run");

            let (width, height) = parse_frame_size(&size)?;
            let format: PixelFormat = pix_fmt.parse()?;
            let options = markers
                .iter()
                .map(|m| m.parse::<MarkerOptions>())
                .collect::<Result<Vec<_>, _>>()?;
            let chain = MarkerChain::build(&options, format, width, height, cursor.into())
                .context("invalid marker configuration")?;

            let config = PipelineConfig {
                max_frames,
                debug_frames_dir: debug_frames,
                debug_every,
                debug_font,
            };

            let mut reader = RawFrameReader::new(open_input(&input)?, format, width, height);
            let mut writer = RawFrameWriter::new(open_output(&output)?);
            let summary = pipeline::run_pipeline(&mut reader, &mut writer, &chain, &config)
                .context("pipeline failed")?;
            writer.finish()?;

            info!(frames = summary.frames, previews = summary.previews, "run complete");
            Ok(())
        }
        cli::Command::Plan {
            x,
            width,
            framecount,
            skip,
        } => {
            let options = MarkerOptions {
                x,
                w: width,
                h: 1,
                skip,
                frame_count: framecount,
                ..MarkerOptions::default()
            };
            let schedule = parse_skip(&options.skip)?.map(Arc::new);
            let config = AnimationConfig::resolve(
                &options,
                PixelFormat::Yuv444p,
                width as usize,
                1,
                schedule,
            )?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (i, column) in pipeline::plan_offsets(&config).iter().enumerate() {
                writeln!(out, "{i}\t{column}").context("failed to write plan")?;
            }
            Ok(())
        }
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin().lock())));
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create output directory")?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
