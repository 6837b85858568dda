use super::constants::{DEFAULT_MAX_PACKET_BYTES, HEADER_SIZE_BYTES, WORD_SIZE_BYTES};
use super::error::{FramingError, ReaderError};
use super::frame_source::FrameSource;
use super::raw_frame::{RawFrame, RawFrameHeader};

/// PacketReader cuts the byte stream of a FrameSource into RawFrames.
///
/// Bytes are buffered across chunks, so headers and payloads may straddle chunk
/// boundaries. A header with an impossible length is reported as a FramingError and the
/// reader resyncs by stepping forward one word; calling `next_packet` again resumes the
/// scan. A packet cut short by the end of the stream is reported once as
/// `FramingError::Truncated`, after which the reader is exhausted.
#[derive(Debug)]
pub struct PacketReader<S: FrameSource> {
    source: S,
    buffer: Vec<u8>,
    position: usize,
    source_ended: bool,
    max_packet_bytes: u32,
    bytes_consumed: u64,
}

impl<S: FrameSource> PacketReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_max_packet_bytes(source, DEFAULT_MAX_PACKET_BYTES)
    }

    pub fn with_max_packet_bytes(source: S, max_packet_bytes: u32) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            position: 0,
            source_ended: false,
            max_packet_bytes,
            bytes_consumed: 0,
        }
    }

    /// Get the next packet in the stream
    ///
    /// Returns a `Result<Option<RawFrame>>`. The Option is None once the stream is
    /// exhausted. Framing errors are recoverable; source errors are not.
    pub fn next_packet(&mut self) -> Result<Option<RawFrame>, ReaderError> {
        loop {
            let available = self.buffer.len() - self.position;
            let mut needed = HEADER_SIZE_BYTES;
            if available >= HEADER_SIZE_BYTES {
                let header = RawFrameHeader::read(&self.buffer[self.position..]);
                if let Err(e) = header.validate(self.max_packet_bytes) {
                    self.advance(WORD_SIZE_BYTES);
                    return Err(ReaderError::Framing(e));
                }
                needed = header.packet_bytes();
                if available >= needed {
                    let start = self.position + HEADER_SIZE_BYTES;
                    let end = self.position + needed;
                    let frame = RawFrame::from_parts(header, &self.buffer[start..end]);
                    self.advance(needed);
                    return Ok(Some(frame));
                }
            }

            if self.source_ended {
                if available == 0 {
                    return Ok(None);
                }
                self.advance(available);
                return Err(ReaderError::Framing(FramingError::Truncated {
                    declared: needed,
                    available,
                }));
            }
            self.fill_buffer()?;
        }
    }

    /// Total number of bytes taken out of the stream so far (including skipped bytes)
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    pub fn is_exhausted(&self) -> bool {
        self.source_ended && self.position == self.buffer.len()
    }

    fn advance(&mut self, n_bytes: usize) {
        self.position += n_bytes;
        self.bytes_consumed += n_bytes as u64;
    }

    /// Drop what has been consumed and pull the next chunk from the source
    fn fill_buffer(&mut self) -> Result<(), ReaderError> {
        self.buffer.drain(..self.position);
        self.position = 0;
        match self.source.next_chunk()? {
            Some(chunk) => self.buffer.extend_from_slice(&chunk),
            None => self.source_ended = true,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{IMAGE_PACKET_TYPE, SCOPE_PACKET_TYPE};
    use crate::frame_source::MemorySource;

    fn stream(frames: &[RawFrame]) -> Vec<u8> {
        frames.iter().flat_map(|f| f.to_bytes()).collect()
    }

    #[test]
    fn test_reads_packets_across_chunk_boundaries() {
        let frames = vec![
            RawFrame::new(IMAGE_PACKET_TYPE, (0..5).collect()),
            RawFrame::new(SCOPE_PACKET_TYPE, vec![9, 8]),
            RawFrame::new(IMAGE_PACKET_TYPE, vec![]),
        ];
        let bytes = stream(&frames);
        // 3 byte chunks split every header at an odd offset
        let mut reader = PacketReader::new(MemorySource::from_bytes(&bytes, 3));
        for expected in &frames {
            assert_eq!(reader.next_packet().unwrap().as_ref(), Some(expected));
        }
        assert_eq!(reader.next_packet().unwrap(), None);
        assert_eq!(reader.bytes_consumed(), bytes.len() as u64);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_resyncs_after_bad_length() {
        let good = RawFrame::new(IMAGE_PACKET_TYPE, vec![1, 2, 3]);
        // A lone garbage word with a length that is not a multiple of 4
        let mut bytes = 7u32.to_le_bytes().to_vec();
        bytes.extend(good.to_bytes());
        let mut reader = PacketReader::new(MemorySource::new(vec![bytes]));

        match reader.next_packet() {
            Err(ReaderError::Framing(FramingError::BadLength(7))) => (),
            other => panic!("expected a framing error, got {other:?}"),
        }
        assert_eq!(reader.next_packet().unwrap(), Some(good));
        assert_eq!(reader.next_packet().unwrap(), None);
    }

    #[test]
    fn test_rejects_oversized_packet() {
        let frame = RawFrame::new(IMAGE_PACKET_TYPE, vec![0; 16]);
        let mut reader = PacketReader::with_max_packet_bytes(
            MemorySource::new(vec![frame.to_bytes()]),
            32,
        );
        assert!(matches!(
            reader.next_packet(),
            Err(ReaderError::Framing(FramingError::BadLength(68)))
        ));
    }

    #[test]
    fn test_truncated_packet_at_end_of_stream() {
        let frame = RawFrame::new(IMAGE_PACKET_TYPE, vec![1, 2, 3, 4]);
        let mut bytes = frame.to_bytes();
        bytes.truncate(bytes.len() - 6);
        let available = bytes.len();
        let mut reader = PacketReader::new(MemorySource::new(vec![bytes]));
        match reader.next_packet() {
            Err(ReaderError::Framing(FramingError::Truncated {
                declared,
                available: got,
            })) => {
                assert_eq!(declared, 24);
                assert_eq!(got, available);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
        assert_eq!(reader.next_packet().unwrap(), None);
    }

    #[test]
    fn test_empty_source() {
        let mut reader = PacketReader::new(MemorySource::default());
        assert_eq!(reader.next_packet().unwrap(), None);
    }
}
