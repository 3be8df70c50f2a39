use image::imageops::flip_vertical_in_place;
use image::RgbImage;

use crate::error::RenderError;

/// Row order of a raw pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrigin {
    /// First row is the top of the picture.
    TopLeft,
    /// First row is the bottom of the picture (GL framebuffer order).
    BottomLeft,
}

/// One rendered frame: tightly packed RGB8, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Builds a frame from an RGBA8 buffer whose rows are `bytes_per_row`
    /// apart, dropping alpha and putting the top row first.
    pub fn from_padded_rgba(
        width: u32,
        height: u32,
        bytes_per_row: usize,
        data: &[u8],
        origin: FrameOrigin,
    ) -> Result<Self, RenderError> {
        let row_bytes = width as usize * 4;
        let expected = if height == 0 {
            0
        } else {
            bytes_per_row * (height as usize - 1) + row_bytes
        };
        if bytes_per_row < row_bytes || data.len() < expected {
            return Err(RenderError::ShortReadback {
                expected,
                actual: data.len(),
            });
        }

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for row in 0..height as usize {
            let start = row * bytes_per_row;
            for pixel in data[start..start + row_bytes].chunks_exact(4) {
                rgb.extend_from_slice(&pixel[..3]);
            }
        }

        let mut image = RgbImage::from_raw(width, height, rgb).ok_or(
            RenderError::ShortReadback {
                expected,
                actual: data.len(),
            },
        )?;
        if origin == FrameOrigin::BottomLeft {
            flip_vertical_in_place(&mut image);
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Packed `rgb24` bytes, suitable for a raw ffmpeg pipe.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}
