use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Sender};
use renderer::Frame;

use crate::error::{EncodeError, Format};
use crate::sink::FrameEncoder;

/// Frames buffered per encoder before the producer blocks.
pub const CHANNEL_CAPACITY: usize = 8;

/// Final state of one format after the fan-out closes.
#[derive(Debug)]
pub struct FormatOutcome {
    pub format: Format,
    pub frames_written: u32,
    pub result: Result<(), EncodeError>,
}

impl FormatOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

struct Worker {
    format: Format,
    sender: Option<Sender<Arc<Frame>>>,
    handle: JoinHandle<(u32, Result<(), EncodeError>)>,
}

/// Feeds every frame to all attached encoders, each on its own thread.
///
/// A worker whose encoder fails keeps draining its channel so `append`
/// never stalls on it, and discards that encoder's partial file. The rest are
/// finalised by [`EncoderFanOut::close`] or discarded by
/// [`EncoderFanOut::abort`].
pub struct EncoderFanOut {
    workers: Vec<Worker>,
    finished: Vec<FormatOutcome>,
    aborted: Arc<AtomicBool>,
}

impl Default for EncoderFanOut {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderFanOut {
    pub fn new() -> Self {
        Self {
            workers: Vec::new(),
            finished: Vec::new(),
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Moves `encoder` onto a worker thread.
    pub fn attach(&mut self, encoder: Box<dyn FrameEncoder>) {
        let format = encoder.format();
        let (sender, receiver) = bounded::<Arc<Frame>>(CHANNEL_CAPACITY);
        let spawned = std::thread::Builder::new()
            .name(format!("encode-{format}"))
            .spawn({
                let aborted = Arc::clone(&self.aborted);
                move || run_worker(encoder, receiver, &aborted)
            });
        match spawned {
            Ok(handle) => self.workers.push(Worker {
                format,
                sender: Some(sender),
                handle,
            }),
            Err(err) => self.record_failure(format, EncodeError::WorkerSpawn(format, err)),
        }
    }

    /// Records a format that never produced an encoder.
    pub fn record_failure(&mut self, format: Format, error: EncodeError) {
        tracing::warn!(%format, error = %error, "encoder unavailable for this token");
        self.finished.push(FormatOutcome {
            format,
            frames_written: 0,
            result: Err(error),
        });
    }

    /// Sends the frame to every live worker, blocking while a channel is full.
    pub fn append(&mut self, frame: &Arc<Frame>) {
        for worker in &mut self.workers {
            let Some(sender) = worker.sender.as_ref() else {
                continue;
            };
            if sender.send(Arc::clone(frame)).is_err() {
                // Receiver only disappears if the worker thread died.
                worker.sender = None;
            }
        }
    }

    /// Closes every encoder and reports one outcome per format, in
    /// [`Format`] order.
    pub fn close(self) -> Vec<FormatOutcome> {
        self.join()
    }

    /// Discards every encoder's output, e.g. after a render error. Frames
    /// still queued are dropped unencoded.
    pub fn abort(self) -> Vec<FormatOutcome> {
        self.aborted.store(true, Ordering::SeqCst);
        self.join()
    }

    fn join(self) -> Vec<FormatOutcome> {
        let Self {
            workers,
            mut finished,
            ..
        } = self;

        for worker in workers {
            drop(worker.sender);
            let outcome = match worker.handle.join() {
                Ok((frames_written, result)) => FormatOutcome {
                    format: worker.format,
                    frames_written,
                    result,
                },
                Err(_) => FormatOutcome {
                    format: worker.format,
                    frames_written: 0,
                    result: Err(EncodeError::WorkerPanicked(worker.format)),
                },
            };
            finished.push(outcome);
        }
        finished.sort_by_key(|outcome| outcome.format);
        finished
    }
}

fn run_worker(
    mut encoder: Box<dyn FrameEncoder>,
    receiver: crossbeam_channel::Receiver<Arc<Frame>>,
    aborted: &AtomicBool,
) -> (u32, Result<(), EncodeError>) {
    let format = encoder.format();
    let mut written = 0;
    let mut failure = None;

    for frame in receiver.iter() {
        if failure.is_some() || aborted.load(Ordering::SeqCst) {
            continue;
        }
        match encoder.append(&frame) {
            Ok(()) => written += 1,
            Err(err) => {
                tracing::warn!(%format, frame = written, error = %err, "encoder failed; draining remaining frames");
                failure = Some(err);
            }
        }
    }

    let result = match failure {
        Some(err) => {
            encoder.abort();
            Err(err)
        }
        None if aborted.load(Ordering::SeqCst) => {
            encoder.abort();
            Err(EncodeError::Aborted(format))
        }
        None => encoder.close(),
    };
    (written, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ending {
        Open,
        Closed,
        Aborted,
    }

    struct Recording {
        format: Format,
        seen: Arc<Mutex<Vec<u8>>>,
        fail_at: Option<usize>,
        ending: Arc<Mutex<Ending>>,
    }

    impl FrameEncoder for Recording {
        fn format(&self) -> Format {
            self.format
        }

        fn append(&mut self, frame: &Frame) -> Result<(), EncodeError> {
            let mut seen = self.seen.lock().unwrap();
            if self.fail_at == Some(seen.len()) {
                return Err(EncodeError::FfmpegPipe(std::io::Error::other("broken pipe")));
            }
            seen.push(frame.image().get_pixel(0, 0).0[0]);
            Ok(())
        }

        fn close(self: Box<Self>) -> Result<(), EncodeError> {
            *self.ending.lock().unwrap() = Ending::Closed;
            Ok(())
        }

        fn abort(self: Box<Self>) {
            *self.ending.lock().unwrap() = Ending::Aborted;
        }
    }

    fn recording(format: Format, fail_at: Option<usize>) -> (Box<Recording>, Arc<Mutex<Vec<u8>>>, Arc<Mutex<Ending>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ending = Arc::new(Mutex::new(Ending::Open));
        let encoder = Box::new(Recording {
            format,
            seen: Arc::clone(&seen),
            fail_at,
            ending: Arc::clone(&ending),
        });
        (encoder, seen, ending)
    }

    fn frame(index: u8) -> Arc<Frame> {
        Arc::new(Frame::new(RgbImage::from_pixel(1, 1, image::Rgb([index, 0, 0]))))
    }

    #[test]
    fn every_encoder_sees_every_frame_in_order() {
        let mut fanout = EncoderFanOut::new();
        let (gif, gif_seen, gif_ending) = recording(Format::Gif, None);
        let (mp4, mp4_seen, _) = recording(Format::Mp4, None);
        fanout.attach(gif);
        fanout.attach(mp4);

        for index in 0..96u8 {
            fanout.append(&frame(index));
        }
        let outcomes = fanout.close();

        let expected: Vec<u8> = (0..96).collect();
        assert_eq!(*gif_seen.lock().unwrap(), expected);
        assert_eq!(*mp4_seen.lock().unwrap(), expected);
        assert_eq!(*gif_ending.lock().unwrap(), Ending::Closed);
        assert!(outcomes.iter().all(|o| o.is_ok() && o.frames_written == 96));
    }

    #[test]
    fn failing_encoder_does_not_stop_the_others() {
        let mut fanout = EncoderFanOut::new();
        let (gif, gif_seen, gif_ending) = recording(Format::Gif, None);
        let (webm, _, webm_ending) = recording(Format::Webm, Some(3));
        fanout.attach(webm);
        fanout.attach(gif);
        fanout.record_failure(Format::Mp4, EncodeError::FfmpegMissing(Format::Mp4));

        for index in 0..40u8 {
            fanout.append(&frame(index));
        }
        let outcomes = fanout.close();

        assert_eq!(gif_seen.lock().unwrap().len(), 40);
        assert_eq!(*gif_ending.lock().unwrap(), Ending::Closed);
        assert_eq!(*webm_ending.lock().unwrap(), Ending::Aborted);

        let formats: Vec<Format> = outcomes.iter().map(|o| o.format).collect();
        assert_eq!(formats, vec![Format::Gif, Format::Mp4, Format::Webm]);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].result, Err(EncodeError::FfmpegMissing(_))));
        assert_eq!(outcomes[2].frames_written, 3);
        assert!(!outcomes[2].is_ok());
    }

    #[test]
    fn abort_discards_every_encoder() {
        let mut fanout = EncoderFanOut::new();
        let (gif, _, gif_ending) = recording(Format::Gif, None);
        let (mp4, _, mp4_ending) = recording(Format::Mp4, None);
        fanout.attach(gif);
        fanout.attach(mp4);

        for index in 0..10u8 {
            fanout.append(&frame(index));
        }
        let outcomes = fanout.abort();

        assert_eq!(*gif_ending.lock().unwrap(), Ending::Aborted);
        assert_eq!(*mp4_ending.lock().unwrap(), Ending::Aborted);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o.result, Err(EncodeError::Aborted(format)) if format == o.format)));
    }
}
