use std::path::{Path, PathBuf};

use renderer::{Frame, LoopTiming, Resolution};

use crate::error::{EncodeError, Format};
use crate::ffmpeg::{FfmpegEncoder, FfmpegOptions};
use crate::gif::{GifFileEncoder, DEFAULT_GIF_SPEED};

/// Shape of the stream every encoder for one token receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeSpec {
    pub resolution: Resolution,
    pub timing: LoopTiming,
}

impl EncodeSpec {
    pub fn new(resolution: Resolution, timing: LoopTiming) -> Self {
        Self { resolution, timing }
    }

    pub(crate) fn check_frame(&self, frame: &Frame) -> Result<(), EncodeError> {
        let actual = Resolution::new(frame.width(), frame.height());
        if actual != self.resolution {
            return Err(EncodeError::FrameSize {
                expected: self.resolution.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

/// One output file being written frame by frame.
///
/// Ordering contract: `append` is called in strictly increasing frame order,
/// once per frame, then exactly one of `close` or `abort`.
///
/// Encoders write to a [`staging_path`] and only move the result onto the
/// real path in `close`, so an existing file is never replaced by a
/// truncated one.
pub trait FrameEncoder: Send {
    fn format(&self) -> Format;

    fn append(&mut self, frame: &Frame) -> Result<(), EncodeError>;

    /// Flushes and finalises the file.
    fn close(self: Box<Self>) -> Result<(), EncodeError>;

    /// Stops encoding and discards whatever was written so far.
    fn abort(self: Box<Self>);
}

/// `animations/0001.gif` is staged as `animations/0001.partial.gif`; the
/// extension is kept so ffmpeg still picks the container from it.
pub fn staging_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Moves a finished staging file onto its final path.
pub(crate) fn publish(staging: &Path, path: &Path) -> Result<(), EncodeError> {
    std::fs::rename(staging, path).map_err(|source| {
        discard(staging);
        EncodeError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

pub(crate) fn discard(staging: &Path) {
    match std::fs::remove_file(staging) {
        Ok(()) => tracing::debug!(path = %staging.display(), "discarded partial output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %staging.display(), error = %err, "failed to remove partial output")
        }
    }
}

/// Per-run settings shared by every token's encoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    pub ffmpeg: FfmpegOptions,
    pub gif_speed: i32,
    /// Result of the once-per-batch `ffmpeg` lookup. When false, MP4 and WebM
    /// fail to open without spawning anything.
    pub ffmpeg_available: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            ffmpeg: FfmpegOptions::default(),
            gif_speed: DEFAULT_GIF_SPEED,
            ffmpeg_available: true,
        }
    }
}

/// Opens the encoder for `format`, writing to `path`.
pub fn open_encoder(
    format: Format,
    path: &Path,
    spec: EncodeSpec,
    options: &EncoderOptions,
) -> Result<Box<dyn FrameEncoder>, EncodeError> {
    match format {
        Format::Gif => Ok(Box::new(GifFileEncoder::create(
            path,
            spec,
            options.gif_speed,
        )?)),
        Format::Mp4 | Format::Webm if !options.ffmpeg_available => {
            Err(EncodeError::FfmpegMissing(format))
        }
        Format::Mp4 | Format::Webm => Ok(Box::new(FfmpegEncoder::spawn(
            format,
            path,
            spec,
            &options.ffmpeg,
        )?)),
    }
}
