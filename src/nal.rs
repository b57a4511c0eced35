use std::{fmt, fmt::Display};

use crate::contract::Codec;

/// Where the forbidden-zero bit and the type field sit inside a NAL header,
/// widened to 16 bits with the first header byte in the high-order position.
#[derive(Debug, Clone, Copy)]
struct HeaderLayout {
    header_len: usize,
    forbidden_mask: u16,
    type_shift: u32,
    type_mask: u16,
}

const H264_HEADER: HeaderLayout = HeaderLayout {
    header_len: 1,
    forbidden_mask: 0x0080,
    type_shift: 0,
    type_mask: 0x001f,
};

const HEVC_HEADER: HeaderLayout = HeaderLayout {
    header_len: 2,
    forbidden_mask: 0x8000,
    type_shift: 9,
    type_mask: 0x003f,
};

/// Reads the raw type field, failing closed on a short payload or a set
/// forbidden-zero bit.
fn raw_type(payload: &[u8], layout: HeaderLayout) -> Option<u8> {
    if payload.len() < layout.header_len {
        return None;
    }
    let header = payload[..layout.header_len]
        .iter()
        .fold(0u16, |acc, b| (acc << 8) | u16::from(*b));
    if header & layout.forbidden_mask != 0 {
        return None;
    }
    Some(((header >> layout.type_shift) & layout.type_mask) as u8)
}

/// H.264 NAL unit types, ISO/IEC 14496-10 table 7-1.
///
/// `Undefined` covers raw type 0, the reserved/unspecified 13..=31 range,
/// and malformed headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum H264NalType {
    CodedSlice,
    DataPartitionA,
    DataPartitionB,
    DataPartitionC,
    Idr,
    Sei,
    Sps,
    Pps,
    AccessUnitDelimiter,
    EndOfSequence,
    EndOfStream,
    FillerData,
    Undefined,
}

impl H264NalType {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::CodedSlice,
            2 => Self::DataPartitionA,
            3 => Self::DataPartitionB,
            4 => Self::DataPartitionC,
            5 => Self::Idr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::AccessUnitDelimiter,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            _ => Self::Undefined,
        }
    }
}

impl Display for H264NalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CodedSlice => "CodedSlice",
            Self::DataPartitionA => "DataPartitionA",
            Self::DataPartitionB => "DataPartitionB",
            Self::DataPartitionC => "DataPartitionC",
            Self::Idr => "IDR",
            Self::Sei => "SEI",
            Self::Sps => "SPS",
            Self::Pps => "PPS",
            Self::AccessUnitDelimiter => "AccessUnitDelimiter",
            Self::EndOfSequence => "EndOfSequence",
            Self::EndOfStream => "EndOfStream",
            Self::FillerData => "FillerData",
            Self::Undefined => "Undefined",
        };
        f.write_str(name)
    }
}

/// H.265 NAL unit types, ITU-T H.265 table 7-1.
///
/// Raw values 10..=15, 22..=31 and 41..=47 are reserved, 48..=63
/// unspecified; all of those classify as `Undefined`, as do malformed
/// headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HevcNalType {
    TrailN,
    TrailR,
    TsaN,
    TsaR,
    StsaN,
    StsaR,
    RadlN,
    RadlR,
    RaslN,
    RaslR,
    BlaWLp,
    BlaWRadl,
    BlaNLp,
    IdrWRadl,
    IdrNLp,
    Cra,
    Vps,
    Sps,
    Pps,
    Aud,
    Eos,
    Eob,
    FillerData,
    PrefixSei,
    SuffixSei,
    Undefined,
}

impl HevcNalType {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::TrailN,
            1 => Self::TrailR,
            2 => Self::TsaN,
            3 => Self::TsaR,
            4 => Self::StsaN,
            5 => Self::StsaR,
            6 => Self::RadlN,
            7 => Self::RadlR,
            8 => Self::RaslN,
            9 => Self::RaslR,
            16 => Self::BlaWLp,
            17 => Self::BlaWRadl,
            18 => Self::BlaNLp,
            19 => Self::IdrWRadl,
            20 => Self::IdrNLp,
            21 => Self::Cra,
            32 => Self::Vps,
            33 => Self::Sps,
            34 => Self::Pps,
            35 => Self::Aud,
            36 => Self::Eos,
            37 => Self::Eob,
            38 => Self::FillerData,
            39 => Self::PrefixSei,
            40 => Self::SuffixSei,
            _ => Self::Undefined,
        }
    }
}

impl Display for HevcNalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TrailN => "TRAIL_N",
            Self::TrailR => "TRAIL_R",
            Self::TsaN => "TSA_N",
            Self::TsaR => "TSA_R",
            Self::StsaN => "STSA_N",
            Self::StsaR => "STSA_R",
            Self::RadlN => "RADL_N",
            Self::RadlR => "RADL_R",
            Self::RaslN => "RASL_N",
            Self::RaslR => "RASL_R",
            Self::BlaWLp => "BLA_W_LP",
            Self::BlaWRadl => "BLA_W_RADL",
            Self::BlaNLp => "BLA_N_LP",
            Self::IdrWRadl => "IDR_W_RADL",
            Self::IdrNLp => "IDR_N_LP",
            Self::Cra => "CRA_NUT",
            Self::Vps => "VPS_NUT",
            Self::Sps => "SPS_NUT",
            Self::Pps => "PPS_NUT",
            Self::Aud => "AUD_NUT",
            Self::Eos => "EOS_NUT",
            Self::Eob => "EOB_NUT",
            Self::FillerData => "FD_NUT",
            Self::PrefixSei => "PREFIX_SEI_NUT",
            Self::SuffixSei => "SUFFIX_SEI_NUT",
            Self::Undefined => "Undefined",
        };
        f.write_str(name)
    }
}

/// Classified NAL type, tagged by codec family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalType {
    H264(H264NalType),
    Hevc(HevcNalType),
}

impl NalType {
    /// Derives the type from the payload's header byte(s). Pure and
    /// deterministic; a zero-length payload always classifies as undefined
    /// without reading memory.
    #[must_use]
    pub fn classify(codec: Codec, payload: &[u8]) -> Self {
        match codec {
            Codec::H264 => Self::H264(
                raw_type(payload, H264_HEADER)
                    .map_or(H264NalType::Undefined, H264NalType::from_raw),
            ),
            Codec::Hevc => Self::Hevc(
                raw_type(payload, HEVC_HEADER)
                    .map_or(HevcNalType::Undefined, HevcNalType::from_raw),
            ),
        }
    }

    #[must_use]
    pub fn is_parameter_set(self) -> bool {
        matches!(
            self,
            Self::H264(H264NalType::Sps | H264NalType::Pps)
                | Self::Hevc(HevcNalType::Vps | HevcNalType::Sps | HevcNalType::Pps)
        )
    }

    /// Whether this unit is on the coded-picture allow-list and becomes a
    /// container sample.
    #[must_use]
    pub fn is_coded_picture(self) -> bool {
        matches!(
            self,
            Self::H264(H264NalType::Idr | H264NalType::CodedSlice)
                | Self::Hevc(HevcNalType::TrailR | HevcNalType::IdrNLp | HevcNalType::Cra)
        )
    }
}

impl Display for NalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264(t) => t.fmt(f),
            Self::Hevc(t) => t.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h264_parameter_and_picture_headers() {
        assert_eq!(
            NalType::classify(Codec::H264, &[0x67, 0x42]),
            NalType::H264(H264NalType::Sps)
        );
        assert_eq!(
            NalType::classify(Codec::H264, &[0x68]),
            NalType::H264(H264NalType::Pps)
        );
        assert_eq!(
            NalType::classify(Codec::H264, &[0x65]),
            NalType::H264(H264NalType::Idr)
        );
        assert_eq!(
            NalType::classify(Codec::H264, &[0x41]),
            NalType::H264(H264NalType::CodedSlice)
        );
    }

    #[test]
    fn h264_forbidden_bit_fails_closed() {
        assert_eq!(
            NalType::classify(Codec::H264, &[0x87]),
            NalType::H264(H264NalType::Undefined)
        );
    }

    #[test]
    fn h264_reserved_range_is_undefined() {
        for raw in 13u8..=31 {
            assert_eq!(
                NalType::classify(Codec::H264, &[raw]),
                NalType::H264(H264NalType::Undefined),
                "raw type {raw}"
            );
        }
    }

    #[test]
    fn hevc_type_field_sits_in_bits_one_to_six() {
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0x42, 0x01]),
            NalType::Hevc(HevcNalType::Sps)
        );
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0x44, 0x01]),
            NalType::Hevc(HevcNalType::Pps)
        );
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0x40, 0x01]),
            NalType::Hevc(HevcNalType::Vps)
        );
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0x28, 0x01]),
            NalType::Hevc(HevcNalType::IdrNLp)
        );
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0x02, 0x01]),
            NalType::Hevc(HevcNalType::TrailR)
        );
    }

    #[test]
    fn hevc_forbidden_bit_and_short_headers_fail_closed() {
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0xC2, 0x01]),
            NalType::Hevc(HevcNalType::Undefined)
        );
        // A lone header byte is malformed for the 2-byte HEVC header.
        assert_eq!(
            NalType::classify(Codec::Hevc, &[0x42]),
            NalType::Hevc(HevcNalType::Undefined)
        );
    }

    #[test]
    fn hevc_reserved_gaps_are_undefined() {
        for raw in (10u8..=15).chain(22..=31).chain(41..=47).chain(48..=63) {
            let payload = [raw << 1, 0x01];
            assert_eq!(
                NalType::classify(Codec::Hevc, &payload),
                NalType::Hevc(HevcNalType::Undefined),
                "raw type {raw}"
            );
        }
    }

    #[test]
    fn empty_payload_is_undefined_for_both_codecs() {
        assert_eq!(
            NalType::classify(Codec::H264, &[]),
            NalType::H264(H264NalType::Undefined)
        );
        assert_eq!(
            NalType::classify(Codec::Hevc, &[]),
            NalType::Hevc(HevcNalType::Undefined)
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let payload = [0x67, 0x64, 0x00, 0x1E];
        assert_eq!(
            NalType::classify(Codec::H264, &payload),
            NalType::classify(Codec::H264, &payload)
        );
    }

    #[test]
    fn coded_picture_allow_list_is_exact() {
        assert!(NalType::H264(H264NalType::Idr).is_coded_picture());
        assert!(NalType::H264(H264NalType::CodedSlice).is_coded_picture());
        assert!(!NalType::H264(H264NalType::Sei).is_coded_picture());
        assert!(NalType::Hevc(HevcNalType::TrailR).is_coded_picture());
        assert!(NalType::Hevc(HevcNalType::IdrNLp).is_coded_picture());
        assert!(NalType::Hevc(HevcNalType::Cra).is_coded_picture());
        assert!(!NalType::Hevc(HevcNalType::TrailN).is_coded_picture());
        assert!(!NalType::Hevc(HevcNalType::IdrWRadl).is_coded_picture());
        assert!(!NalType::Hevc(HevcNalType::PrefixSei).is_coded_picture());
    }
}
