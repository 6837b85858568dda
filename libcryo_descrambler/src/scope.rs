use super::constants::{SCOPE_ADC_FULL_SCALE, SCOPE_GAIN, SCOPE_OFFSET_VOLTS};
use super::raw_frame::{PacketType, RawFrame};

/// A trace captured by the on-board oscilloscope (analog monitor).
///
/// Scope packets pack two 16 bit samples per word, low half first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTrace {
    pub samples: Vec<u16>,
}

impl ScopeTrace {
    /// Unpack a scope packet. Returns None for any other packet type.
    pub fn from_packet(packet: &RawFrame) -> Option<Self> {
        if packet.packet_type() != PacketType::Scope {
            return None;
        }
        let samples = packet
            .payload
            .iter()
            .flat_map(|word| [(word & 0xffff) as u16, (word >> 16) as u16])
            .collect();
        Some(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_volts(&self) -> Vec<f64> {
        self.samples.iter().map(|&adu| adu_to_volts(adu)).collect()
    }
}

/// Convert an analog monitor ADC code to volts
pub fn adu_to_volts(adu: u16) -> f64 {
    (2.0 * adu as f64 / SCOPE_ADC_FULL_SCALE) * SCOPE_GAIN + SCOPE_OFFSET_VOLTS
}
