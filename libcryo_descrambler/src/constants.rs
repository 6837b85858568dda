// Packet framing
pub const WORD_SIZE_BYTES: usize = 4;
pub const HEADER_SIZE_BYTES: usize = 2 * WORD_SIZE_BYTES;
/// The size word counts itself out but counts the flag word in, so a legal
/// packet always declares at least one word.
pub const MIN_DECLARED_BYTES: u32 = WORD_SIZE_BYTES as u32;
pub const PACKET_TYPE_SHIFT: u32 = 24;
pub const PACKET_TYPE_MASK: u32 = 0xff00_0000;

// Packet type codes found in the flag word
pub const IMAGE_PACKET_TYPE: u8 = 1;
pub const SCOPE_PACKET_TYPE: u8 = 2;

// FEMB boards tag each payload with the ASIC that produced it
pub const ASIC_ID_MASK: u32 = 0x0000_0010;
pub const ASIC_ID_SHIFT: u32 = 4;

// Cryo ASIC geometry
pub const CRYO_ROWS: usize = 64;
pub const DEFAULT_BIT_MASK: u32 = 0xffff;

// Analog monitor conversion (14 bit scope ADC)
pub const SCOPE_ADC_FULL_SCALE: f64 = 16384.0;
pub const SCOPE_GAIN: f64 = -1.04;
pub const SCOPE_OFFSET_VOLTS: f64 = 2.0 - 0.053;

// Reader defaults
pub const DEFAULT_CHUNK_SIZE: usize = 65_536;
pub const DEFAULT_MAX_PACKET_BYTES: u32 = 4 * 1024 * 1024;
