//! Writes a stream of rendered frames to GIF, MP4 and WebM at once, plus a
//! poster PNG.
//!
//! GIFs are encoded in-process with `image`; MP4 and WebM go through a system
//! `ffmpeg` fed raw `rgb24` on stdin. [`EncoderFanOut`] runs each encoder on
//! its own thread so one slow or broken format never holds back the others.

mod error;
mod fanout;
mod ffmpeg;
mod gif;
mod poster;
mod sink;

pub use error::{EncodeError, Format};
pub use fanout::{EncoderFanOut, FormatOutcome, CHANNEL_CAPACITY};
pub use ffmpeg::{
    check_ffmpeg, command_args, is_ffmpeg_on_path, FfmpegEncoder, FfmpegOptions, FfmpegStatus,
    WebmCodec,
};
pub use gif::{GifFileEncoder, DEFAULT_GIF_SPEED, GIF_SPEED_RANGE};
pub use poster::{save_png, PosterCapture, PosterOutcome};
pub use sink::{open_encoder, staging_path, EncodeSpec, EncoderOptions, FrameEncoder};
