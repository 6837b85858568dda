use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use super::error::SourceError;

/// Anything that can hand out the raw byte stream of a run, one chunk at a time.
///
/// Chunk boundaries carry no meaning; a packet header may be split across two chunks.
/// `Ok(None)` signals the end of the stream.
pub trait FrameSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

/// A FrameSource over anything implementing Read (files, sockets, pipes)
#[derive(Debug)]
pub struct ReaderSource<R: Read> {
    reader: R,
    chunk_size: usize,
    is_ended: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            is_ended: false,
        }
    }
}

impl ReaderSource<BufReader<File>> {
    /// Open a .dat file as a source
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), chunk_size))
    }
}

impl<R: Read> FrameSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        if self.is_ended {
            return Ok(None);
        }
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.is_ended = true;
                    return Ok(None);
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(Some(chunk));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SourceError::IOError(e)),
            }
        }
    }
}

/// An in-memory queue of chunks. Useful for replaying captured data.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    chunks: VecDeque<Vec<u8>>,
}

impl MemorySource {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }

    /// Split a single buffer into chunks of `chunk_size` bytes
    pub fn from_bytes(bytes: &[u8], chunk_size: usize) -> Self {
        Self::new(
            bytes
                .chunks(chunk_size.max(1))
                .map(|chunk| chunk.to_vec())
                .collect(),
        )
    }
}

impl FrameSource for MemorySource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self.chunks.pop_front())
    }
}
