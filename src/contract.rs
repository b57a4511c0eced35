use std::{fmt, fmt::Display};

pub type Result<T> = std::result::Result<T, RemuxError>;

/// Length of the size field that replaces each 4-byte Annex-B start code.
pub const NAL_LENGTH_SIZE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    H264,
    Hevc,
}

impl Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => f.write_str("h264"),
            Self::Hevc => f.write_str("hevc"),
        }
    }
}

/// Rational media time: `value` ticks counted against `timescale` ticks per
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaTime {
    pub value: i64,
    pub timescale: u32,
}

impl MediaTime {
    #[must_use]
    pub const fn new(value: i64, timescale: u32) -> Self {
        Self { value, timescale }
    }

    #[must_use]
    pub const fn zero(timescale: u32) -> Self {
        Self::new(0, timescale)
    }
}

impl Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.timescale)
    }
}

/// Codec configuration handed to the writer exactly once, before any sample.
///
/// `parameter_sets` holds the raw NAL payloads in the order the container
/// format expects them: SPS, PPS for H.264; VPS, SPS, PPS for H.265.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    pub codec: Codec,
    pub parameter_sets: Vec<Vec<u8>>,
    pub nal_length_size: u8,
}

impl Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VideoFormat(codec={}, parameter_sets={}, nal_length_size={})",
            self.codec,
            self.parameter_sets.len(),
            self.nal_length_size
        )
    }
}

/// One timed sample: length-prefixed NAL bytes plus its presentation time.
///
/// `duration` is unknown at dispatch time; the writer derives spacing from
/// consecutive presentation timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSample {
    pub data: Vec<u8>,
    pub pts: MediaTime,
    pub duration: Option<MediaTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStatus {
    Completed,
    Failed,
    Cancelled,
}

impl Display for WriterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Capability contract of the external container writer.
///
/// The first appended sample's timestamp becomes the session origin. The
/// writer buffers internally and may report not-ready between appends;
/// callers are expected to consult [`SampleWriter::ready_for_more`] before
/// each append.
pub trait SampleWriter {
    /// Accepts the format descriptor. Called exactly once per run, before
    /// any sample.
    fn open(&mut self, format: &VideoFormat) -> Result<()>;

    /// Readiness query backing the dispatcher's backpressure handling.
    fn ready_for_more(&self) -> bool;

    fn append(&mut self, sample: MediaSample) -> Result<()>;

    /// Finalizes the session and returns its terminal status.
    fn finish(&mut self) -> Result<WriterStatus>;
}

#[derive(Debug, thiserror::Error)]
pub enum RemuxError {
    #[error("bitstream does not begin with a 4-byte start code")]
    MissingStartCode,
    #[error("missing parameter set: {0}")]
    MissingParameterSet(&'static str),
    #[error("parameter sets complete but writer session never opened")]
    SessionNeverOpened,
    #[error("invalid bitstream: {0}")]
    InvalidBitstream(String),
    #[error("format descriptor rejected: {0}")]
    FormatDescriptor(String),
    #[error("writer error: {0}")]
    Writer(String),
    #[error("writer session already closed")]
    SessionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_time_displays_value_and_timescale() {
        let t = MediaTime::new(33_333_333, 1_000_000_000);
        assert_eq!(t.to_string(), "33333333@1000000000");
    }

    #[test]
    fn codec_display_is_lowercase() {
        assert_eq!(Codec::H264.to_string(), "h264");
        assert_eq!(Codec::Hevc.to_string(), "hevc");
    }
}
