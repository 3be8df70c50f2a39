use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use encoder::{open_encoder, EncodeSpec, EncoderFanOut, EncoderOptions, Format, PosterCapture};
use renderer::{Frame, FrameSource, RenderJob};

use crate::paths::OutputLayout;
use crate::report::{TokenReport, TokenStatus};

/// Renders one token's clip and feeds every frame to the GIF, MP4 and WebM
/// encoders and the poster capture.
///
/// Render failures end the token and discard every partial output, leaving
/// files from an earlier run untouched. Encoder failures only cost that format.
/// When `dump_root` is set the first frame is also written there for
/// debugging.
pub fn render_token<S: FrameSource>(
    source: &mut S,
    job: &RenderJob,
    layout: &OutputLayout,
    options: &EncoderOptions,
    dump_root: Option<&Path>,
) -> TokenReport {
    let token = job.token_id;
    let spec = EncodeSpec::new(job.resolution, job.timing);

    let mut fanout = EncoderFanOut::new();
    for format in Format::ALL {
        let path = layout.animation_path(token, format);
        match open_encoder(format, &path, spec, options) {
            Ok(encoder) => fanout.attach(encoder),
            Err(err) => fanout.record_failure(format, err),
        }
    }

    let mut poster = PosterCapture::new(&layout.poster_path(token), job.poster_index);

    let rendered = source.render_job(job, |index, frame| {
        if index == 0 {
            if let Some(root) = dump_root {
                if let Err(err) = dump_debug_frame(root, &frame) {
                    tracing::warn!(token, error = %format!("{err:#}"), "debug dump failed");
                }
            }
        }
        let frame = Arc::new(frame);
        fanout.append(&frame);
        poster.offer(index, &frame);
        true
    });

    let frames_rendered = match rendered {
        Ok(frames) => frames,
        Err(err) => {
            tracing::error!(token, error = %err, "render failed");
            return TokenReport {
                token_id: token,
                frames_rendered: 0,
                formats: fanout.abort(),
                poster: None,
                status: TokenStatus::Failed {
                    reason: err.to_string(),
                },
            };
        }
    };

    let formats = fanout.close();

    let mut failed: Vec<String> = formats
        .iter()
        .filter_map(|outcome| match &outcome.result {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(token, format = %outcome.format, frames = outcome.frames_written, error = %err, "format failed");
                Some(outcome.format.to_string())
            }
        })
        .collect();

    let poster = match poster.finish() {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            tracing::warn!(token, error = %err, "poster failed");
            failed.push("poster".to_string());
            None
        }
    };

    let status = if failed.is_empty() {
        TokenStatus::Complete
    } else {
        TokenStatus::Partial { failed }
    };

    TokenReport {
        token_id: token,
        frames_rendered,
        formats,
        poster,
        status,
    }
}

/// Writes `debug_first.png` and `debug_<W>x<H>_rgb24.raw` under `root`.
fn dump_debug_frame(root: &Path, frame: &Frame) -> Result<()> {
    let bytes = frame.as_bytes();
    let (min, max) = bytes
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &b| (lo.min(b), hi.max(b)));
    tracing::info!(
        width = frame.width(),
        height = frame.height(),
        bytes = bytes.len(),
        min,
        max,
        "first frame"
    );

    let png = root.join("debug_first.png");
    encoder::save_png(&png, frame).with_context(|| format!("failed to write {}", png.display()))?;
    let raw = root.join(format!("debug_{}x{}_rgb24.raw", frame.width(), frame.height()));
    std::fs::write(&raw, bytes).with_context(|| format!("failed to write {}", raw.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{AnimationDecoder, RgbImage};
    use params::ParameterSet;
    use renderer::{LoopTiming, RenderError, Resolution};

    /// CPU stand-in for the GPU: paints the frame index into the red channel.
    struct IndexPainter {
        resolution: Resolution,
        calls: u32,
        fail_at: Option<u32>,
    }

    impl IndexPainter {
        fn new(width: u32, height: u32) -> Self {
            Self {
                resolution: Resolution::new(width, height),
                calls: 0,
                fail_at: None,
            }
        }
    }

    impl FrameSource for IndexPainter {
        fn resolution(&self) -> Resolution {
            self.resolution
        }

        fn render(&mut self, _params: &ParameterSet, _time: f64) -> Result<Frame, RenderError> {
            if self.fail_at == Some(self.calls) {
                return Err(RenderError::Draw("device lost".to_string()));
            }
            let shade = self.calls as u8;
            self.calls += 1;
            Ok(Frame::new(RgbImage::from_pixel(
                self.resolution.width,
                self.resolution.height,
                image::Rgb([shade, 0, 0]),
            )))
        }
    }

    fn job(token_id: u64, width: u32, height: u32) -> RenderJob {
        RenderJob::new(
            token_id,
            params::derive(token_id),
            LoopTiming::new(24, 4.0).unwrap(),
            Resolution::new(width, height),
            1.0,
        )
    }

    fn layout() -> (tempfile::TempDir, OutputLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.ensure().unwrap();
        (dir, layout)
    }

    #[test]
    fn every_encoder_receives_every_frame_and_poster_is_frame_24() {
        let (_dir, layout) = layout();
        let mut source = IndexPainter::new(8, 8);
        let job = job(1, 8, 8);
        let report = render_token(&mut source, &job, &layout, &EncoderOptions::default(), None);

        assert_eq!(report.frames_rendered, 96);
        let gif = report
            .formats
            .iter()
            .find(|outcome| outcome.format == Format::Gif)
            .unwrap();
        assert!(gif.is_ok());
        assert_eq!(gif.frames_written, 96);

        let file = std::fs::File::open(layout.animation_path(1, Format::Gif)).unwrap();
        let frames = image::codecs::gif::GifDecoder::new(std::io::BufReader::new(file))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(frames.len(), 96);

        let poster = image::open(layout.poster_path(1)).unwrap().into_rgb8();
        assert_eq!(poster.get_pixel(0, 0).0, [24, 0, 0]);
        assert_eq!(report.poster.map(|p| p.index()), Some(24));

        if encoder::is_ffmpeg_on_path() {
            assert!(report.is_complete(), "{}", report.status);
            for format in [Format::Mp4, Format::Webm] {
                assert!(layout.animation_path(1, format).is_file());
            }
        } else {
            assert_eq!(
                report.status,
                TokenStatus::Partial {
                    failed: vec!["mp4".into(), "webm".into()]
                }
            );
        }
    }

    #[test]
    fn render_failure_fails_the_token() {
        let (_dir, layout) = layout();
        let mut source = IndexPainter::new(8, 8);
        source.fail_at = Some(10);
        let report = render_token(&mut source, &job(2, 8, 8), &layout, &EncoderOptions::default(), None);

        assert!(matches!(report.status, TokenStatus::Failed { .. }));
        assert!(report.poster.is_none());
        assert!(!layout.poster_path(2).exists());
        for format in Format::ALL {
            let path = layout.animation_path(2, format);
            assert!(!path.exists(), "{} was left behind", path.display());
            assert!(!encoder::staging_path(&path).exists());
        }
        assert!(report.formats.iter().all(|outcome| !outcome.is_ok()));
    }

    #[test]
    fn render_failure_keeps_the_previous_clip() {
        let (_dir, layout) = layout();
        let mut source = IndexPainter::new(8, 8);
        let job = job(4, 8, 8);
        render_token(&mut source, &job, &layout, &EncoderOptions::default(), None);
        let gif_path = layout.animation_path(4, Format::Gif);
        let previous_gif = std::fs::read(&gif_path).unwrap();
        let previous_poster = std::fs::read(layout.poster_path(4)).unwrap();

        let mut failing = IndexPainter::new(8, 8);
        failing.fail_at = Some(50);
        let report = render_token(&mut failing, &job, &layout, &EncoderOptions::default(), None);

        assert!(matches!(report.status, TokenStatus::Failed { .. }));
        assert_eq!(std::fs::read(&gif_path).unwrap(), previous_gif);
        assert_eq!(std::fs::read(layout.poster_path(4)).unwrap(), previous_poster);
        assert!(!encoder::staging_path(&gif_path).exists());
    }

    #[test]
    fn debug_dump_writes_first_frame() {
        let (dir, layout) = layout();
        let mut source = IndexPainter::new(4, 2);
        render_token(
            &mut source,
            &job(3, 4, 2),
            &layout,
            &EncoderOptions::default(),
            Some(dir.path()),
        );

        let raw = std::fs::read(dir.path().join("debug_4x2_rgb24.raw")).unwrap();
        assert_eq!(raw.len(), 4 * 2 * 3);
        assert!(raw.iter().all(|&b| b == 0));
        assert!(dir.path().join("debug_first.png").is_file());
    }
}
