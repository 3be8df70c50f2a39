use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::str::FromStr;

use renderer::Frame;

use crate::error::{EncodeError, Format};
use crate::sink::{discard, publish, staging_path, EncodeSpec, FrameEncoder};

/// Result of looking for an `ffmpeg` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FfmpegStatus {
    /// Found, with the first line of `ffmpeg -version`.
    Available(String),
    NotFound,
    /// Ran, but printed nothing useful.
    Unknown,
}

pub fn check_ffmpeg() -> FfmpegStatus {
    match Command::new("ffmpeg").args(["-hide_banner", "-version"]).output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            stdout
                .lines()
                .next()
                .map_or(FfmpegStatus::Unknown, |line| {
                    FfmpegStatus::Available(line.to_string())
                })
        }
        _ => FfmpegStatus::NotFound,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    !matches!(check_ffmpeg(), FfmpegStatus::NotFound)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebmCodec {
    #[default]
    Vp9,
    Vp8,
}

impl WebmCodec {
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            WebmCodec::Vp9 => "libvpx-vp9",
            WebmCodec::Vp8 => "libvpx",
        }
    }
}

impl fmt::Display for WebmCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl FromStr for WebmCodec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "libvpx-vp9" | "vp9" => Ok(WebmCodec::Vp9),
            "libvpx" | "vp8" => Ok(WebmCodec::Vp8),
            other => Err(format!(
                "unsupported WebM codec '{other}' (expected libvpx-vp9 or libvpx)"
            )),
        }
    }
}

/// Quality knobs for the two ffmpeg-backed formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegOptions {
    pub mp4_crf: u8,
    pub mp4_preset: String,
    pub webm_crf: u8,
    pub webm_codec: WebmCodec,
    /// `0` lets ffmpeg decide.
    pub threads: u32,
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self {
            mp4_crf: 18,
            mp4_preset: "medium".to_string(),
            webm_crf: 28,
            webm_codec: WebmCodec::default(),
            threads: 0,
        }
    }
}

impl FfmpegOptions {
    /// Output-side arguments for `format`, after the raw input description.
    pub fn output_args(&self, format: Format) -> Vec<String> {
        let mut args: Vec<String> = match format {
            Format::Mp4 => vec![
                "-c:v".into(),
                "libx264".into(),
                "-movflags".into(),
                "+faststart".into(),
                "-pix_fmt".into(),
                "yuv420p".into(),
                "-crf".into(),
                self.mp4_crf.to_string(),
                "-preset".into(),
                self.mp4_preset.clone(),
            ],
            Format::Webm => {
                let mut args = vec![
                    "-c:v".into(),
                    self.webm_codec.ffmpeg_name().into(),
                    "-pix_fmt".into(),
                    "yuv420p".into(),
                    "-b:v".into(),
                    "0".into(),
                    "-crf".into(),
                    self.webm_crf.to_string(),
                ];
                if self.webm_codec == WebmCodec::Vp9 {
                    args.extend(["-row-mt".into(), "1".into()]);
                }
                args
            }
            Format::Gif => Vec::new(),
        };
        if self.threads > 0 {
            args.extend(["-threads".into(), self.threads.to_string()]);
        }
        args
    }
}

/// Full argument list for one ffmpeg child reading `rgb24` from stdin.
pub fn command_args(
    format: Format,
    spec: &EncodeSpec,
    options: &FfmpegOptions,
    out_path: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        spec.resolution.to_string(),
        "-r".into(),
        spec.timing.fps().to_string(),
        "-i".into(),
        "pipe:0".into(),
        "-an".into(),
    ];
    args.extend(options.output_args(format));
    args.push(out_path.display().to_string());
    args
}

/// MP4 or WebM written by a system `ffmpeg` child into a staging file.
pub struct FfmpegEncoder {
    format: Format,
    spec: EncodeSpec,
    path: PathBuf,
    staging: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    /// Callers check for ffmpeg once per batch; a missing binary still maps
    /// to [`EncodeError::FfmpegMissing`] here.
    pub fn spawn(
        format: Format,
        path: &Path,
        spec: EncodeSpec,
        options: &FfmpegOptions,
    ) -> Result<Self, EncodeError> {
        let staging = staging_path(path);
        let args = command_args(format, &spec, options, &staging);
        tracing::debug!(%format, path = %path.display(), ?args, "spawning ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => EncodeError::FfmpegMissing(format),
                _ => EncodeError::FfmpegSpawn(err),
            })?;

        let Some(stdin) = child.stdin.take() else {
            kill_and_reap(&mut child, format);
            return Err(EncodeError::FfmpegPipe(std::io::Error::other(
                "ffmpeg stdin was not captured",
            )));
        };

        Ok(Self {
            format,
            spec,
            path: path.to_path_buf(),
            staging,
            child,
            stdin: Some(stdin),
        })
    }
}

fn kill_and_reap(child: &mut Child, format: Format) {
    if let Err(err) = child.kill() {
        tracing::debug!(%format, error = %err, "ffmpeg already exited");
    }
    if let Err(err) = child.wait() {
        tracing::warn!(%format, error = %err, "failed to reap ffmpeg");
    }
}

impl FrameEncoder for FfmpegEncoder {
    fn format(&self) -> Format {
        self.format
    }

    fn append(&mut self, frame: &Frame) -> Result<(), EncodeError> {
        self.spec.check_frame(frame)?;
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(EncodeError::FfmpegPipe(std::io::Error::other(
                "ffmpeg encoder is already finalized",
            )));
        };
        stdin
            .write_all(frame.as_bytes())
            .map_err(EncodeError::FfmpegPipe)
    }

    fn close(self: Box<Self>) -> Result<(), EncodeError> {
        let Self {
            child,
            path,
            staging,
            stdin,
            ..
        } = *self;
        drop(stdin);

        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(source) => {
                discard(&staging);
                return Err(EncodeError::Io { path, source });
            }
        };

        if !output.status.success() {
            discard(&staging);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodeError::FfmpegExit {
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }
        publish(&staging, &path)
    }

    fn abort(self: Box<Self>) {
        let Self {
            format,
            mut child,
            staging,
            stdin,
            ..
        } = *self;
        drop(stdin);
        kill_and_reap(&mut child, format);
        discard(&staging);
    }
}
