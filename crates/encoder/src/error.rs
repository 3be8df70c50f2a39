use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Container formats written for every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Gif,
    Mp4,
    Webm,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Gif, Format::Mp4, Format::Webm];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Gif => "gif",
            Format::Mp4 => "mp4",
            Format::Webm => "webm",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Format::Gif => "image/gif",
            Format::Mp4 => "video/mp4",
            Format::Webm => "video/webm",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image encoding failed for {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("ffmpeg is required for {0} encoding, but was not found on PATH")]
    FfmpegMissing(Format),
    #[error("failed to spawn ffmpeg (is it installed and on PATH?)")]
    FfmpegSpawn(#[source] std::io::Error),
    #[error("failed to write frame to ffmpeg stdin")]
    FfmpegPipe(#[source] std::io::Error),
    #[error("ffmpeg exited with status {status}: {stderr}")]
    FfmpegExit { status: ExitStatus, stderr: String },
    #[error("frame size mismatch: got {actual}, expected {expected}")]
    FrameSize { expected: String, actual: String },
    #[error("no frame was rendered, so there is nothing to use as a poster")]
    NoPosterFrame,
    #[error("failed to start {0} encoder thread")]
    WorkerSpawn(Format, #[source] std::io::Error),
    #[error("{0} encoder worker panicked")]
    WorkerPanicked(Format),
    #[error("{0} output discarded because rendering failed")]
    Aborted(Format),
}
