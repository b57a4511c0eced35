use std::{fmt, fmt::Display};

use crate::contract::{Codec, NAL_LENGTH_SIZE, VideoFormat};
use crate::nal::{H264NalType, HevcNalType, NalType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingParameterSets,
    Active,
    Closed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingParameterSets => f.write_str("awaiting_parameter_sets"),
            Self::Active => f.write_str("active"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Most recently observed parameter set of each kind.
///
/// Registers hold owned copies because they outlive the scan iteration that
/// produced them; a new unit of the same kind overwrites the previous one.
#[derive(Debug, Clone, Default)]
pub struct ParameterSets {
    vps: Option<Vec<u8>>,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
}

impl ParameterSets {
    /// Name of the first unpopulated register required by `codec`, in the
    /// order the format descriptor wants them.
    #[must_use]
    pub fn first_missing(&self, codec: Codec) -> Option<&'static str> {
        let required: &[(&'static str, &Option<Vec<u8>>)] = match codec {
            Codec::H264 => &[("sps", &self.sps), ("pps", &self.pps)],
            Codec::Hevc => &[("vps", &self.vps), ("sps", &self.sps), ("pps", &self.pps)],
        };
        required
            .iter()
            .find(|(_, slot)| slot.is_none())
            .map(|(name, _)| *name)
    }

    /// Ordered payload list for the format descriptor, or `None` while any
    /// required register is still empty.
    fn ordered(&self, codec: Codec) -> Option<Vec<Vec<u8>>> {
        match codec {
            Codec::H264 => Some(vec![self.sps.clone()?, self.pps.clone()?]),
            Codec::Hevc => Some(vec![
                self.vps.clone()?,
                self.sps.clone()?,
                self.pps.clone()?,
            ]),
        }
    }
}

/// Accumulates parameter sets and opens the writer session exactly once.
///
/// The open check runs only when a PPS arrives: observing SPS then PPS
/// (H.264) or VPS, SPS, PPS in any order ending on PPS (H.265) yields the
/// format descriptor. A PPS arriving while another register is still empty
/// is stored but produces no transition, and nothing re-arms the check until
/// the next PPS.
#[derive(Debug)]
pub struct SessionTracker {
    codec: Codec,
    state: SessionState,
    parameter_sets: ParameterSets,
}

impl SessionTracker {
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            state: SessionState::AwaitingParameterSets,
            parameter_sets: ParameterSets::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn codec(&self) -> Codec {
        self.codec
    }

    #[must_use]
    pub fn first_missing(&self) -> Option<&'static str> {
        self.parameter_sets.first_missing(self.codec)
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Routes a parameter-set unit into its register and returns the format
    /// descriptor the first time the required set completes on PPS arrival.
    /// Non-parameter-set units (and units of the other codec family) are
    /// ignored.
    pub fn observe(&mut self, nal_type: NalType, payload: &[u8]) -> Option<VideoFormat> {
        let registers = &mut self.parameter_sets;
        let is_pps = match (self.codec, nal_type) {
            (Codec::H264, NalType::H264(H264NalType::Sps)) => {
                registers.sps = Some(payload.to_vec());
                false
            }
            (Codec::H264, NalType::H264(H264NalType::Pps)) => {
                registers.pps = Some(payload.to_vec());
                true
            }
            (Codec::Hevc, NalType::Hevc(HevcNalType::Vps)) => {
                registers.vps = Some(payload.to_vec());
                false
            }
            (Codec::Hevc, NalType::Hevc(HevcNalType::Sps)) => {
                registers.sps = Some(payload.to_vec());
                false
            }
            (Codec::Hevc, NalType::Hevc(HevcNalType::Pps)) => {
                registers.pps = Some(payload.to_vec());
                true
            }
            _ => return None,
        };

        if !is_pps || self.state != SessionState::AwaitingParameterSets {
            return None;
        }
        let parameter_sets = self.parameter_sets.ordered(self.codec)?;
        self.state = SessionState::Active;
        Some(VideoFormat {
            codec: self.codec,
            parameter_sets,
            nal_length_size: NAL_LENGTH_SIZE,
        })
    }
}
