use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage};
use renderer::Frame;

use crate::error::{EncodeError, Format};
use crate::sink::{discard, publish, staging_path, EncodeSpec, FrameEncoder};

/// Quantizer speed range accepted by the GIF encoder (1 is slowest, best).
pub const GIF_SPEED_RANGE: std::ops::RangeInclusive<i32> = 1..=30;
pub const DEFAULT_GIF_SPEED: i32 = 10;

/// Infinitely looping animated GIF, streamed to a staging file.
pub struct GifFileEncoder {
    path: PathBuf,
    staging: PathBuf,
    spec: EncodeSpec,
    delay: Delay,
    /// Second handle on the staging file; the trailer is only written when
    /// `encoder` drops, so this is what gets synced afterwards.
    file: File,
    encoder: GifEncoder<BufWriter<File>>,
}

impl GifFileEncoder {
    pub fn create(path: &Path, spec: EncodeSpec, speed: i32) -> Result<Self, EncodeError> {
        let staging = staging_path(path);
        let io_error = |source| EncodeError::Io {
            path: staging.clone(),
            source,
        };
        let file = File::create(&staging).map_err(io_error)?;
        let writer = match file.try_clone() {
            Ok(handle) => BufWriter::new(handle),
            Err(source) => {
                discard(&staging);
                return Err(io_error(source));
            }
        };

        let speed = speed.clamp(*GIF_SPEED_RANGE.start(), *GIF_SPEED_RANGE.end());
        let mut encoder = GifEncoder::new_with_speed(writer, speed);
        if let Err(source) = encoder.set_repeat(Repeat::Infinite) {
            drop(encoder);
            discard(&staging);
            return Err(EncodeError::Image {
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            staging,
            spec,
            delay: Delay::from_saturating_duration(spec.timing.frame_delay()),
            file,
            encoder,
        })
    }
}

impl FrameEncoder for GifFileEncoder {
    fn format(&self) -> Format {
        Format::Gif
    }

    fn append(&mut self, frame: &Frame) -> Result<(), EncodeError> {
        self.spec.check_frame(frame)?;
        let rgba = DynamicImage::ImageRgb8(frame.image().clone()).into_rgba8();
        self.encoder
            .encode_frame(image::Frame::from_parts(rgba, 0, 0, self.delay))
            .map_err(|source| EncodeError::Image {
                path: self.path.clone(),
                source,
            })
    }

    fn close(self: Box<Self>) -> Result<(), EncodeError> {
        let Self {
            path,
            staging,
            file,
            encoder,
            ..
        } = *self;
        drop(encoder);
        if let Err(source) = file.sync_all() {
            drop(file);
            discard(&staging);
            return Err(EncodeError::Io {
                path: staging,
                source,
            });
        }
        drop(file);
        publish(&staging, &path)
    }

    fn abort(self: Box<Self>) {
        let Self {
            staging,
            file,
            encoder,
            ..
        } = *self;
        drop(encoder);
        drop(file);
        discard(&staging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, RgbImage};
    use renderer::{LoopTiming, Resolution};
    use std::io::BufReader;

    fn spec(fps: u32, seconds: f64) -> EncodeSpec {
        EncodeSpec::new(Resolution::new(4, 4), LoopTiming::new(fps, seconds).unwrap())
    }

    #[test]
    fn delay_spreads_duration_over_frames() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = GifFileEncoder::create(&dir.path().join("d.gif"), spec(24, 4.0), 10).unwrap();
        let (numer, denom) = encoder.delay.numer_denom_ms();
        assert!((f64::from(numer) / f64::from(denom) - 4000.0 / 96.0).abs() < 1e-3);
    }

    #[test]
    fn writes_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001.gif");
        let mut encoder = Box::new(GifFileEncoder::create(&path, spec(10, 0.5), 30).unwrap());
        for shade in 0..5u8 {
            let frame = Frame::new(RgbImage::from_pixel(4, 4, image::Rgb([shade * 50, 0, 0])));
            encoder.append(&frame).unwrap();
        }
        assert!(!path.exists());
        assert!(staging_path(&path).exists());
        encoder.close().unwrap();
        assert!(!staging_path(&path).exists());

        let file = std::fs::File::open(&path).unwrap();
        let decoder = GifDecoder::new(BufReader::new(file)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 5);
    }

    #[test]
    fn rejects_wrong_frame_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder =
            GifFileEncoder::create(&dir.path().join("x.gif"), spec(10, 0.5), 10).unwrap();
        let frame = Frame::new(RgbImage::new(2, 2));
        assert!(matches!(
            encoder.append(&frame),
            Err(EncodeError::FrameSize { .. })
        ));
    }

    #[test]
    fn abort_leaves_no_file_and_keeps_the_previous_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0002.gif");
        std::fs::write(&path, b"previous").unwrap();

        let mut encoder = Box::new(GifFileEncoder::create(&path, spec(10, 0.5), 10).unwrap());
        for shade in 0..3u8 {
            let frame = Frame::new(RgbImage::from_pixel(4, 4, image::Rgb([shade, 0, 0])));
            encoder.append(&frame).unwrap();
        }
        encoder.abort();

        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
        assert!(!staging_path(&path).exists());
    }
}
