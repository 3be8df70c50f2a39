use params::ParameterSet;

use crate::timeline::LoopTiming;
use crate::types::Resolution;

/// Everything needed to render one token's clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderJob {
    pub token_id: u64,
    pub params: ParameterSet,
    pub timing: LoopTiming,
    pub resolution: Resolution,
    pub poster_index: u32,
}

impl RenderJob {
    pub fn new(
        token_id: u64,
        params: ParameterSet,
        timing: LoopTiming,
        resolution: Resolution,
        poster_time: f64,
    ) -> Self {
        Self {
            token_id,
            params,
            timing,
            resolution,
            poster_index: timing.poster_index(poster_time),
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.timing.frame_count()
    }

    /// `(frame index, shader time)` pairs in playback order.
    pub fn frame_times(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        (0..self.frame_count())
            .map(move |index| (index, self.timing.time_for_frame(index, self.params.rotation_speed)))
    }
}
