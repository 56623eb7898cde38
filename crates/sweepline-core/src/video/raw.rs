use std::io::{ErrorKind, Read, Write};

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info};

use super::frame::{Frame, Plane};
use crate::error::{MarkerError, MarkerResult};
use crate::format::PixelFormat;

/// Parse a `WIDTHxHEIGHT` frame size such as `1920x1080`.
pub fn parse_frame_size(s: &str) -> MarkerResult<(usize, usize)> {
    let invalid = || MarkerError::InvalidFrameSize(s.to_string());
    let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: usize = w.trim().parse().map_err(|_| invalid())?;
    let h: usize = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Reads tightly packed planar frames (Y, U, V[, A] back to back) from a raw
/// video stream, e.g. the stdout of `ffmpeg -f rawvideo`.
pub struct RawFrameReader<R: Read> {
    reader: R,
    format: PixelFormat,
    width: usize,
    height: usize,
    frame_count: u64,
    frame_bytes: usize,
}

impl<R: Read> RawFrameReader<R> {
    pub fn new(reader: R, format: PixelFormat, width: usize, height: usize) -> Self {
        let frame_bytes = format.frame_bytes(width, height);
        info!(%format, width, height, frame_bytes, "raw frame reader opened");
        Self {
            reader,
            format,
            width,
            height,
            frame_count: 0,
            frame_bytes,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Read the next frame, or `None` once the stream ends on a frame boundary.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut buf = vec![0u8; self.frame_bytes];
        let mut read = 0;

        while read < self.frame_bytes {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) => {
                    if read == 0 {
                        info!(total_frames = self.frame_count, "raw stream ended");
                        return Ok(None);
                    }
                    error!(
                        read_bytes = read,
                        expected_bytes = self.frame_bytes,
                        frame = self.frame_count,
                        "raw stream ended mid-frame"
                    );
                    bail!(
                        "raw stream ended mid-frame (read {read}/{} bytes)",
                        self.frame_bytes,
                    );
                }
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(frame = self.frame_count, %e, "failed to read raw frame");
                    return Err(e).context("failed to read raw frame");
                }
            }
        }

        let mut planes = Vec::with_capacity(self.format.plane_count());
        let mut rest = buf.as_slice();
        for p in 0..self.format.plane_count() {
            let (w, h) = self.format.plane_size(p, self.width, self.height);
            let (head, tail) = rest.split_at(w * h);
            planes.push(Plane {
                data: head.to_vec(),
                linesize: w,
            });
            rest = tail;
        }

        let frame_number = self.frame_count;
        self.frame_count += 1;
        debug!(frame_number, "read raw frame");

        Ok(Some(Frame {
            format: self.format,
            width: self.width,
            height: self.height,
            planes,
            frame_number,
        }))
    }
}

/// Writes frames back out in the same tightly packed planar layout.
pub struct RawFrameWriter<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> RawFrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        for (p, plane) in frame.planes.iter().enumerate() {
            let (w, h) = frame.format.plane_size(p, frame.width, frame.height);
            for row in 0..h {
                let start = row * plane.linesize;
                let bytes = plane.data.get(start..start + w).with_context(|| {
                    format!("plane {p} too short for row {row} of frame {}", frame.frame_number)
                })?;
                self.writer
                    .write_all(bytes)
                    .context("failed to write raw frame")?;
            }
        }
        self.frames_written += 1;
        debug!(frame_number = frame.frame_number, "wrote raw frame");
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().context("failed to flush raw output")?;
        info!(total_frames = self.frames_written, "raw output finished");
        Ok(self.writer)
    }
}
