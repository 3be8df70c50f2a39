use std::f64::consts::TAU;
use std::time::Duration;

/// Rejected fps/duration combinations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingError {
    #[error("fps must be greater than zero")]
    ZeroFps,
    #[error("loop duration must be a finite positive number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("{fps} fps over {seconds}s rounds to zero frames")]
    NoFrames { fps: u32, seconds: f64 },
}

/// Fixed-length loop sampled at a constant frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTiming {
    fps: u32,
    seconds: f64,
    frame_count: u32,
}

impl LoopTiming {
    pub fn new(fps: u32, seconds: f64) -> Result<Self, TimingError> {
        if fps == 0 {
            return Err(TimingError::ZeroFps);
        }
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(TimingError::InvalidDuration(seconds));
        }
        let frames = (f64::from(fps) * seconds).round_ties_even();
        if frames < 1.0 {
            return Err(TimingError::NoFrames { fps, seconds });
        }
        Ok(Self {
            fps,
            seconds,
            frame_count: frames.min(f64::from(u32::MAX)) as u32,
        })
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Frame shown at `poster_time` seconds, clamped into the clip.
    pub fn poster_index(&self, poster_time: f64) -> u32 {
        let last = self.frame_count - 1;
        let raw = (poster_time * f64::from(self.fps)).round_ties_even();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else if raw >= f64::from(last) {
            last
        } else {
            raw as u32
        }
    }

    /// Display time of one frame; every frame gets the same share of the loop.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(self.seconds / f64::from(self.frame_count))
    }

    pub fn time_for_frame(&self, frame_index: u32, rotation_speed: f64) -> f64 {
        time_for_frame(frame_index, self.frame_count, rotation_speed)
    }
}

/// Shader time for `frame_index` of a `frame_count` loop.
///
/// The shader rotates by `iTime / uRotSpeed`, so scaling the phase by the
/// rotation speed makes every clip sweep exactly one turn: frame
/// `frame_count` lands back on frame 0 whatever the speed.
pub fn time_for_frame(frame_index: u32, frame_count: u32, rotation_speed: f64) -> f64 {
    debug_assert!(frame_count > 0, "frame_count must be positive");
    let phase = TAU * (f64::from(frame_index) / f64::from(frame_count));
    phase * rotation_speed
}
