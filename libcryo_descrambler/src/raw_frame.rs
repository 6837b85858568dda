use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;
use super::error::FramingError;

/// The kind of data carried by a packet, taken from the top byte of the flag word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Image,
    Scope,
    Other(u8),
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            IMAGE_PACKET_TYPE => Self::Image,
            SCOPE_PACKET_TYPE => Self::Scope,
            other => Self::Other(other),
        }
    }
}

/// The two word header which precedes every packet in a stream.
///
/// `size_bytes` counts every byte after the size word itself, i.e. the flag word plus
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrameHeader {
    pub size_bytes: u32,
    pub flags: u32,
}

impl RawFrameHeader {
    /// Read a header from the first 8 bytes of a buffer. The buffer must hold at least
    /// HEADER_SIZE_BYTES.
    pub fn read(buffer: &[u8]) -> Self {
        Self {
            size_bytes: LittleEndian::read_u32(&buffer[0..WORD_SIZE_BYTES]),
            flags: LittleEndian::read_u32(&buffer[WORD_SIZE_BYTES..HEADER_SIZE_BYTES]),
        }
    }

    /// Check the size field, returning the number of payload words it declares
    pub fn validate(&self, max_packet_bytes: u32) -> Result<usize, FramingError> {
        if self.size_bytes < MIN_DECLARED_BYTES
            || self.size_bytes % WORD_SIZE_BYTES as u32 != 0
            || self.size_bytes > max_packet_bytes
        {
            return Err(FramingError::BadLength(self.size_bytes));
        }
        Ok(self.payload_words())
    }

    pub fn payload_words(&self) -> usize {
        (self.size_bytes as usize / WORD_SIZE_BYTES).saturating_sub(1)
    }

    /// Total number of bytes the packet occupies in the stream, header included
    pub fn packet_bytes(&self) -> usize {
        HEADER_SIZE_BYTES + self.payload_words() * WORD_SIZE_BYTES
    }

    pub fn packet_type(&self) -> PacketType {
        PacketType::from(((self.flags & PACKET_TYPE_MASK) >> PACKET_TYPE_SHIFT) as u8)
    }
}

/// One packet as delivered by the readout link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub header: RawFrameHeader,
    pub payload: Vec<u32>,
}

impl RawFrame {
    /// Decode the payload words which follow a header. `payload_bytes` must hold exactly
    /// the payload declared by the header.
    pub fn from_parts(header: RawFrameHeader, payload_bytes: &[u8]) -> Self {
        let mut payload = vec![0u32; payload_bytes.len() / WORD_SIZE_BYTES];
        LittleEndian::read_u32_into(payload_bytes, &mut payload);
        Self { header, payload }
    }

    /// Build a packet around a payload, filling in the header. Mostly for replays and tests.
    pub fn new(packet_type: u8, payload: Vec<u32>) -> Self {
        let size_bytes = ((payload.len() + 1) * WORD_SIZE_BYTES) as u32;
        let flags = (packet_type as u32) << PACKET_TYPE_SHIFT;
        Self {
            header: RawFrameHeader { size_bytes, flags },
            payload,
        }
    }

    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type()
    }

    pub fn is_image(&self) -> bool {
        self.packet_type() == PacketType::Image
    }

    /// FEMB boards mark the producing ASIC in bit 4 of the first payload word
    pub fn asic_id(&self) -> Option<u8> {
        self.payload
            .first()
            .map(|word| ((word & ASIC_ID_MASK) >> ASIC_ID_SHIFT) as u8)
    }

    /// Serialize the packet back into its stream representation
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE_BYTES + self.payload.len() * WORD_SIZE_BYTES];
        LittleEndian::write_u32(&mut bytes[0..WORD_SIZE_BYTES], self.header.size_bytes);
        LittleEndian::write_u32(
            &mut bytes[WORD_SIZE_BYTES..HEADER_SIZE_BYTES],
            self.header.flags,
        );
        LittleEndian::write_u32_into(&self.payload, &mut bytes[HEADER_SIZE_BYTES..]);
        bytes
    }
}
