use tracing::{debug, info, warn};

use crate::contract::{Codec, MediaTime, RemuxError, Result, SampleWriter, WriterStatus};
use crate::hexdump;
use crate::nal::{HevcNalType, NalType};
use crate::sample::{
    BackpressurePolicy, DispatchOutcome, NOMINAL_FRAME_DURATION, SampleDispatcher,
};
use crate::scan;
use crate::session::{SessionState, SessionTracker};

/// Per-run settings. A fresh run context is built from these on every call
/// to [`Remuxer::run`]; nothing carries over between runs.
#[derive(Debug, Clone)]
pub struct RemuxConfig {
    pub codec: Codec,
    /// Stop feeding input once this many frames have been written.
    pub max_frames: u64,
    pub frame_duration: MediaTime,
    pub backpressure: BackpressurePolicy,
}

impl RemuxConfig {
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            max_frames: 360,
            frame_duration: NOMINAL_FRAME_DURATION,
            backpressure: BackpressurePolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub units_scanned: u64,
    pub frames_written: u64,
    /// Samples dropped because the writer reported not-ready.
    pub samples_skipped: u64,
    /// Well-formed units outside the parameter-set and coded-picture sets.
    pub units_unprocessed: u64,
    pub writer_status: WriterStatus,
}

/// Sequential Annex-B remux loop: scan, classify, route.
///
/// Parameter-set units feed the session tracker; coded-picture units become
/// timed samples once the session is open; H.265 prefix SEI payloads are
/// hex-dumped to the log; everything else is reported unprocessed and
/// dropped. Single worker, strictly in scan order.
#[derive(Debug)]
pub struct Remuxer {
    config: RemuxConfig,
}

struct RunContext {
    tracker: SessionTracker,
    dispatcher: SampleDispatcher,
    units_scanned: u64,
    frames_written: u64,
    samples_skipped: u64,
    units_unprocessed: u64,
}

impl Remuxer {
    #[must_use]
    pub fn new(config: RemuxConfig) -> Self {
        Self { config }
    }

    /// Processes one whole buffer and finalizes the writer session.
    ///
    /// The buffer must begin with a 4-byte start code. The loop ends at scan
    /// exhaustion (the bytes after the final marker are emitted as the
    /// trailing unit) or at the frame cap, whichever comes first. A run that
    /// never completes its parameter sets fails after the loop without the
    /// writer ever being opened.
    pub fn run<W: SampleWriter + ?Sized>(&self, data: &[u8], writer: &mut W) -> Result<RunSummary> {
        if !scan::has_start_code(data, 0) {
            return Err(RemuxError::MissingStartCode);
        }

        let mut ctx = RunContext::new(&self.config);
        let mut offset = 0usize;
        while ctx.frames_written < self.config.max_frames {
            match scan::scan(data, offset) {
                Some(unit) => {
                    ctx.process_unit(self.config.codec, &data[unit.payload.clone()], writer)?;
                    offset = unit.next_offset;
                }
                None => {
                    if let Some(tail) = scan::trailing_unit(data, offset) {
                        ctx.process_unit(self.config.codec, &data[tail], writer)?;
                    }
                    break;
                }
            }
        }

        ctx.finalize(writer)
    }
}

impl RunContext {
    fn new(config: &RemuxConfig) -> Self {
        Self {
            tracker: SessionTracker::new(config.codec),
            dispatcher: SampleDispatcher::new(config.frame_duration, config.backpressure),
            units_scanned: 0,
            frames_written: 0,
            samples_skipped: 0,
            units_unprocessed: 0,
        }
    }

    fn process_unit<W: SampleWriter + ?Sized>(
        &mut self,
        codec: Codec,
        payload: &[u8],
        writer: &mut W,
    ) -> Result<()> {
        self.units_scanned += 1;
        let nal_type = NalType::classify(codec, payload);
        debug!(unit = self.units_scanned, size = payload.len(), %nal_type, "scanned nal unit");

        if nal_type.is_parameter_set() {
            if let Some(format) = self.tracker.observe(nal_type, payload) {
                writer.open(&format)?;
                info!(%format, "writer session opened");
            }
            return Ok(());
        }

        if nal_type.is_coded_picture() {
            if self.tracker.state() != SessionState::Active {
                // Produced before the parameter sets completed; there is no
                // session to write it into.
                self.units_unprocessed += 1;
                warn!(%nal_type, "coded picture before parameter sets, dropped");
                return Ok(());
            }
            match self.dispatcher.dispatch(payload, writer)? {
                DispatchOutcome::Written => self.frames_written += 1,
                DispatchOutcome::SkippedNotReady => {
                    self.samples_skipped += 1;
                    warn!(%nal_type, "writer not ready, sample skipped");
                }
            }
            return Ok(());
        }

        if nal_type == NalType::Hevc(HevcNalType::PrefixSei) {
            hexdump::log_dump(payload);
            return Ok(());
        }

        self.units_unprocessed += 1;
        warn!(%nal_type, "unprocessed nal unit type");
        Ok(())
    }

    fn finalize<W: SampleWriter + ?Sized>(mut self, writer: &mut W) -> Result<RunSummary> {
        if self.tracker.state() != SessionState::Active {
            return match self.tracker.first_missing() {
                Some(name) => Err(RemuxError::MissingParameterSet(name)),
                None => Err(RemuxError::SessionNeverOpened),
            };
        }

        let writer_status = writer.finish()?;
        self.tracker.close();
        info!(
            frames = self.frames_written,
            skipped = self.samples_skipped,
            unprocessed = self.units_unprocessed,
            %writer_status,
            "remux run complete"
        );

        Ok(RunSummary {
            units_scanned: self.units_scanned,
            frames_written: self.frames_written,
            samples_skipped: self.samples_skipped,
            units_unprocessed: self.units_unprocessed,
            writer_status,
        })
    }
}
