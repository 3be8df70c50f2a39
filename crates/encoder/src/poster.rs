use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use renderer::Frame;

use crate::error::EncodeError;

/// How the poster PNG was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterOutcome {
    Captured { index: u32 },
    /// The requested index never came by; the last frame was used instead.
    Substituted { requested: u32, used: u32 },
}

impl PosterOutcome {
    pub fn index(&self) -> u32 {
        match self {
            PosterOutcome::Captured { index } => *index,
            PosterOutcome::Substituted { used, .. } => *used,
        }
    }
}

/// Watches the frame stream and keeps the poster frame until the clip is done.
///
/// Nothing touches disk before [`PosterCapture::finish`], so a token whose
/// render fails part way never leaves a poster behind.
pub struct PosterCapture {
    path: PathBuf,
    target: u32,
    captured: Option<Arc<Frame>>,
    last: Option<(u32, Arc<Frame>)>,
}

impl PosterCapture {
    pub fn new(path: &Path, target: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            target,
            captured: None,
            last: None,
        }
    }

    pub fn offer(&mut self, index: u32, frame: &Arc<Frame>) {
        if self.captured.is_some() {
            return;
        }
        if index == self.target {
            self.captured = Some(Arc::clone(frame));
            self.last = None;
        } else {
            self.last = Some((index, Arc::clone(frame)));
        }
    }

    /// Writes the PNG: the target frame, or the last frame seen if the target
    /// never arrived.
    pub fn finish(self) -> Result<PosterOutcome, EncodeError> {
        if let Some(frame) = self.captured {
            save_png(&self.path, &frame)?;
            return Ok(PosterOutcome::Captured { index: self.target });
        }
        let (used, frame) = self.last.ok_or(EncodeError::NoPosterFrame)?;
        tracing::warn!(
            requested = self.target,
            used,
            path = %self.path.display(),
            "poster frame was never rendered; using the last frame"
        );
        save_png(&self.path, &frame)?;
        Ok(PosterOutcome::Substituted {
            requested: self.target,
            used,
        })
    }
}

pub fn save_png(path: &Path, frame: &Frame) -> Result<(), EncodeError> {
    frame
        .image()
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| EncodeError::Image {
            path: path.to_path_buf(),
            source,
        })
}
