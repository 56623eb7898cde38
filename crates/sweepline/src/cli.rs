use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use sweepline_core::pipeline::CursorMode;

#[derive(Parser)]
#[command(name = "sweepline", about = "Sweeping playhead marker for raw planar video")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Paint markers into a raw planar video stream.
    Run {
        /// Raw input stream, or "-" for stdin.
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Raw output stream, or "-" for stdout.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Frame size as WIDTHxHEIGHT.
        #[arg(short, long)]
        size: String,

        /// Planar pixel format of the stream (yuv420p, yuva444p, ...).
        #[arg(short = 'p', long, default_value = "yuv420p")]
        pix_fmt: String,

        /// Marker options as key=value pairs joined by ':'
        /// (x, y, w, h, color, skip, framecount, replace). Repeat for a chain.
        #[arg(short, long = "marker", required = true)]
        markers: Vec<String>,

        /// How chained markers count frames.
        #[arg(long, value_enum, default_value_t = CursorArg::Shared)]
        cursor: CursorArg,

        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u64>,

        /// Directory to save PNG previews of painted frames.
        #[arg(long)]
        debug_frames: Option<PathBuf>,

        /// Save a preview every Nth frame.
        #[arg(long, default_value_t = 30)]
        debug_every: u64,

        /// TrueType font used to label previews.
        #[arg(long)]
        debug_font: Option<PathBuf>,
    },

    /// Print the marker column for every frame of a schedule.
    Plan {
        /// Rectangle left edge.
        #[arg(short, long, default_value_t = 0)]
        x: i64,

        /// Rectangle width in pixels.
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..))]
        width: i64,

        /// Frames spanned by the schedule.
        #[arg(short, long)]
        framecount: i64,

        /// Breakpoint list ("a|b|c"), or "-" for a uniform sweep.
        #[arg(short, long, default_value = "-")]
        skip: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CursorArg {
    Shared,
    PerInstance,
}

impl From<CursorArg> for CursorMode {
    fn from(arg: CursorArg) -> Self {
        match arg {
            CursorArg::Shared => CursorMode::Shared,
            CursorArg::PerInstance => CursorMode::PerInstance,
        }
    }
}
