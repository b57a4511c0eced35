//! Repackages raw H.264/H.265 Annex-B elementary streams for a sample-based
//! container writer: locate start-code-delimited NAL units, classify them,
//! accumulate parameter sets until a writer session can open, then emit
//! length-prefixed samples on a fixed nominal timeline.

mod contract;
mod hexdump;
mod nal;
mod remux;
mod sample;
mod scan;
mod session;

pub use contract::{
    Codec, MediaSample, MediaTime, NAL_LENGTH_SIZE, RemuxError, Result, SampleWriter, VideoFormat,
    WriterStatus,
};
pub use hexdump::{dump_lines, dump_string, log_dump};
pub use nal::{H264NalType, HevcNalType, NalType};
pub use remux::{RemuxConfig, Remuxer, RunSummary};
pub use sample::{
    BackpressurePolicy, DispatchOutcome, NOMINAL_FRAME_DURATION, PresentationClock,
    SampleDispatcher, length_prefixed,
};
pub use scan::{START_CODE, ScannedUnit, has_start_code, scan, trailing_unit};
pub use session::{ParameterSets, SessionState, SessionTracker};
