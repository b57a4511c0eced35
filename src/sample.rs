use std::time::Duration;

use crate::contract::{MediaSample, MediaTime, Result, SampleWriter};

/// Nominal per-frame duration of the synthesized presentation timeline:
/// 1/30 s on a nanosecond timescale. Timing is not derived from the stream.
pub const NOMINAL_FRAME_DURATION: MediaTime = MediaTime::new(33_333_333, 1_000_000_000);

/// What to do when the writer reports it cannot take another sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressurePolicy {
    /// Drop the sample without retrying. Reference behavior.
    #[default]
    Skip,
    /// Poll readiness at `poll_interval` until the writer accepts.
    Block { poll_interval: Duration },
}

/// Monotonic presentation timestamp source.
///
/// Starts at zero and advances by a fixed duration per dispatched sample;
/// it never decreases and never reads the bitstream.
#[derive(Debug, Clone)]
pub struct PresentationClock {
    pts: MediaTime,
    duration: MediaTime,
}

impl PresentationClock {
    #[must_use]
    pub fn new(duration: MediaTime) -> Self {
        Self {
            pts: MediaTime::zero(duration.timescale),
            duration,
        }
    }

    #[must_use]
    pub fn current(&self) -> MediaTime {
        self.pts
    }

    fn advance(&mut self) {
        self.pts.value += self.duration.value;
    }
}

/// 4-byte big-endian length followed by the payload bytes verbatim; the
/// Annex-B start code is replaced by the size word, so the framed sample is
/// `payload.len() + 4` bytes.
#[must_use]
pub fn length_prefixed(payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(payload.len() + 4);
    data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    data.extend_from_slice(payload);
    data
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Written,
    /// The writer reported not-ready and the policy chose to drop.
    SkippedNotReady,
}

/// Turns accepted coded-picture payloads into timed, length-prefixed samples
/// and forwards them to the writer.
///
/// The clock advances only on a successful append, so a skipped sample does
/// not leave a gap in the timeline.
#[derive(Debug)]
pub struct SampleDispatcher {
    clock: PresentationClock,
    policy: BackpressurePolicy,
}

impl SampleDispatcher {
    #[must_use]
    pub fn new(frame_duration: MediaTime, policy: BackpressurePolicy) -> Self {
        Self {
            clock: PresentationClock::new(frame_duration),
            policy,
        }
    }

    pub fn dispatch<W: SampleWriter + ?Sized>(
        &mut self,
        payload: &[u8],
        writer: &mut W,
    ) -> Result<DispatchOutcome> {
        if !writer.ready_for_more() {
            match self.policy {
                BackpressurePolicy::Skip => return Ok(DispatchOutcome::SkippedNotReady),
                BackpressurePolicy::Block { poll_interval } => {
                    while !writer.ready_for_more() {
                        std::thread::sleep(poll_interval);
                    }
                }
            }
        }

        writer.append(MediaSample {
            data: length_prefixed(payload),
            pts: self.clock.current(),
            duration: None,
        })?;
        self.clock.advance();
        Ok(DispatchOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::contract::{VideoFormat, WriterStatus};

    #[derive(Default)]
    struct CountingWriter {
        samples: Vec<MediaSample>,
        reject_next: Cell<usize>,
    }

    impl SampleWriter for CountingWriter {
        fn open(&mut self, _format: &VideoFormat) -> Result<()> {
            Ok(())
        }

        fn ready_for_more(&self) -> bool {
            let pending = self.reject_next.get();
            if pending > 0 {
                self.reject_next.set(pending - 1);
                return false;
            }
            true
        }

        fn append(&mut self, sample: MediaSample) -> Result<()> {
            self.samples.push(sample);
            Ok(())
        }

        fn finish(&mut self) -> Result<WriterStatus> {
            Ok(WriterStatus::Completed)
        }
    }

    #[test]
    fn framing_replaces_start_code_with_big_endian_length() {
        assert_eq!(
            length_prefixed(&[0x65, 0xCC, 0xDD]),
            vec![0x00, 0x00, 0x00, 0x03, 0x65, 0xCC, 0xDD]
        );
        assert_eq!(length_prefixed(&[]), vec![0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn timestamps_advance_by_the_nominal_duration() {
        let mut dispatcher =
            SampleDispatcher::new(NOMINAL_FRAME_DURATION, BackpressurePolicy::Skip);
        let mut writer = CountingWriter::default();

        for _ in 0..4 {
            let outcome = dispatcher.dispatch(&[0x65, 0x00], &mut writer).unwrap();
            assert_eq!(outcome, DispatchOutcome::Written);
        }

        let expected: Vec<i64> = (0..4).map(|i| i * NOMINAL_FRAME_DURATION.value).collect();
        let observed: Vec<i64> = writer.samples.iter().map(|s| s.pts.value).collect();
        assert_eq!(observed, expected);
        assert!(writer.samples.iter().all(|s| s.duration.is_none()));
    }

    #[test]
    fn skip_policy_drops_without_advancing_the_clock() {
        let mut dispatcher =
            SampleDispatcher::new(NOMINAL_FRAME_DURATION, BackpressurePolicy::Skip);
        let mut writer = CountingWriter::default();
        writer.reject_next.set(1);

        assert_eq!(
            dispatcher.dispatch(&[0x65, 0x01], &mut writer).unwrap(),
            DispatchOutcome::SkippedNotReady
        );
        assert_eq!(
            dispatcher.dispatch(&[0x65, 0x02], &mut writer).unwrap(),
            DispatchOutcome::Written
        );

        // The skipped sample consumed no timeline slot.
        assert_eq!(writer.samples.len(), 1);
        assert_eq!(writer.samples[0].pts.value, 0);
    }

    #[test]
    fn block_policy_waits_for_readiness() {
        let mut dispatcher = SampleDispatcher::new(
            NOMINAL_FRAME_DURATION,
            BackpressurePolicy::Block {
                poll_interval: Duration::from_millis(1),
            },
        );
        let mut writer = CountingWriter::default();
        writer.reject_next.set(3);

        assert_eq!(
            dispatcher.dispatch(&[0x65], &mut writer).unwrap(),
            DispatchOutcome::Written
        );
        assert_eq!(writer.samples.len(), 1);
    }
}
