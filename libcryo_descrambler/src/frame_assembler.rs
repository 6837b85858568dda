use super::raw_frame::{PacketType, RawFrame};

/// The payloads of all packets which make up one acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFrame {
    pub event_index: u64,
    pub asic_id: Option<u8>,
    pub words: Vec<u32>,
}

impl AssembledFrame {
    pub fn new(event_index: u64, asic_id: Option<u8>, words: Vec<u32>) -> Self {
        Self {
            event_index,
            asic_id,
            words,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// FrameAssembler takes RawFrames and composes them into AssembledFrames.
///
/// A camera may spread one image over several packets. The assembler appends the payload
/// of every image packet it is handed and, once `packets_per_frame` of them have arrived,
/// emits the frame and starts over. Packets of any other type (scope traces, monitoring)
/// are counted as ignored and never touch the frame being built.
#[derive(Debug)]
pub struct FrameAssembler {
    packets_per_frame: usize,
    asic_id: Option<u8>,
    words: Vec<u32>,
    n_packets: usize,
    frames_emitted: u64,
    packets_ignored: u64,
}

impl FrameAssembler {
    /// Create a new FrameAssembler.
    ///
    /// A packet count of zero is treated as one.
    pub fn new(packets_per_frame: usize) -> Self {
        Self {
            packets_per_frame: packets_per_frame.max(1),
            asic_id: None,
            words: Vec::new(),
            n_packets: 0,
            frames_emitted: 0,
            packets_ignored: 0,
        }
    }

    /// Create an assembler whose frames are tagged with the ASIC that produced them
    pub fn for_asic(packets_per_frame: usize, asic_id: u8) -> Self {
        let mut assembler = Self::new(packets_per_frame);
        assembler.asic_id = Some(asic_id);
        assembler
    }

    /// Add a packet to the frame.
    ///
    /// Returns `Some(AssembledFrame)` when this packet completed a frame, None otherwise.
    pub fn append_packet(&mut self, packet: RawFrame) -> Option<AssembledFrame> {
        if packet.packet_type() != PacketType::Image {
            spdlog::debug!(
                "FrameAssembler ignoring packet of type {:?}",
                packet.packet_type()
            );
            self.packets_ignored += 1;
            return None;
        }

        if self.words.is_empty() {
            self.words = packet.payload;
        } else {
            self.words.extend_from_slice(&packet.payload);
        }
        self.n_packets += 1;

        if self.n_packets < self.packets_per_frame {
            return None;
        }

        let frame = AssembledFrame::new(
            self.frames_emitted,
            self.asic_id,
            std::mem::take(&mut self.words),
        );
        self.n_packets = 0;
        self.frames_emitted += 1;
        Some(frame)
    }

    /// Throw away a partially built frame, e.g. after a framing error
    ///
    /// Returns the number of packets that were discarded.
    pub fn discard_partial(&mut self) -> usize {
        let discarded = self.n_packets;
        if discarded > 0 {
            spdlog::warn!("FrameAssembler discarding partial frame of {discarded} packet(s)");
        }
        self.words.clear();
        self.n_packets = 0;
        discarded
    }

    pub fn partial_packets(&self) -> usize {
        self.n_packets
    }

    pub fn packets_per_frame(&self) -> usize {
        self.packets_per_frame
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn packets_ignored(&self) -> u64 {
        self.packets_ignored
    }
}
