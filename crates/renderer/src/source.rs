use params::ParameterSet;

use crate::error::RenderError;
use crate::frame::Frame;
use crate::job::RenderJob;
use crate::types::Resolution;

/// Anything that can turn a parameter set and a shader time into pixels.
///
/// [`crate::GpuRenderer`] is the real implementation; tests plug in
/// CPU-side sources so the encoding path runs without a GPU.
pub trait FrameSource {
    fn resolution(&self) -> Resolution;

    fn render(&mut self, params: &ParameterSet, time: f64) -> Result<Frame, RenderError>;

    /// Renders every frame of `job` in order, handing each to `sink`.
    ///
    /// Stops at the first render error or the first `false` from `sink`, and
    /// returns how many frames were delivered.
    fn render_job<F>(&mut self, job: &RenderJob, mut sink: F) -> Result<u32, RenderError>
    where
        Self: Sized,
        F: FnMut(u32, Frame) -> bool,
    {
        let mut delivered = 0;
        for (index, time) in job.frame_times() {
            let frame = self.render(&job.params, time)?;
            delivered += 1;
            if !sink(index, frame) {
                break;
            }
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::LoopTiming;
    use image::RgbImage;

    /// Encodes the shader time into the red channel of a 2x2 frame.
    struct TimeRecorder {
        times: Vec<f64>,
    }

    impl FrameSource for TimeRecorder {
        fn resolution(&self) -> Resolution {
            Resolution::new(2, 2)
        }

        fn render(&mut self, _params: &ParameterSet, time: f64) -> Result<Frame, RenderError> {
            self.times.push(time);
            Ok(Frame::new(RgbImage::from_pixel(
                2,
                2,
                image::Rgb([self.times.len() as u8, 0, 0]),
            )))
        }
    }

    #[test]
    fn render_job_visits_frames_in_order() {
        let job = RenderJob::new(
            7,
            params::derive(7),
            LoopTiming::new(10, 1.0).unwrap(),
            Resolution::new(2, 2),
            0.5,
        );
        let mut recorder = TimeRecorder { times: Vec::new() };
        let mut seen = Vec::new();
        let delivered = recorder
            .render_job(&job, |index, frame| {
                seen.push((index, frame.image().get_pixel(0, 0).0[0]));
                true
            })
            .unwrap();

        assert_eq!(delivered, 10);
        assert_eq!(seen.first(), Some(&(0, 1)));
        assert_eq!(seen.last(), Some(&(9, 10)));
        assert!(recorder.times.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn render_job_stops_when_sink_declines() {
        let job = RenderJob::new(
            1,
            params::derive(1),
            LoopTiming::new(10, 1.0).unwrap(),
            Resolution::new(2, 2),
            0.0,
        );
        let mut recorder = TimeRecorder { times: Vec::new() };
        let delivered = recorder.render_job(&job, |index, _| index < 3).unwrap();
        assert_eq!(delivered, 4);
    }
}
