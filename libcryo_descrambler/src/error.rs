use std::path::PathBuf;
use thiserror::Error;

use super::constants::MIN_DECLARED_BYTES;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("Packet header declared an invalid length of {0} bytes (must be a multiple of 4, at least {min}, and within the packet size limit)", min=MIN_DECLARED_BYTES)]
    BadLength(u32),
    #[error("Packet was truncated by end of stream -- declared {declared} bytes, only {available} available")]
    Truncated { declared: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Frame source failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open frame source because file {0:?} does not exist")]
    BadFilePath(PathBuf),
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("PacketReader hit a framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("PacketReader failed due to source error: {0}")]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescrambleError {
    #[error("Frame has {actual} samples but the camera layout expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Unknown camera type: {0}")]
    UnknownCamera(String),
    #[error("Packets per frame must be at least 1, found {0}")]
    BadPacketCount(usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("ImageStack holds {expected:?} images but was given a {actual:?} image")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("ImageStack is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config failed due to layout error: {0}")]
    LayoutError(#[from] LayoutError),
    #[error("Config chunk size must be greater than zero")]
    BadChunkSize,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Image sink failed due to stats error: {0}")]
    Stats(#[from] StatsError),
    #[error("Image sink rejected the image: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline failed due to source error: {0}")]
    SourceError(#[from] SourceError),
    #[error("Pipeline failed due to sink error: {0}")]
    SinkError(#[from] SinkError),
    #[error("Pipeline failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to source error: {0}")]
    SourceError(#[from] SourceError),
    #[error("Processor failed due to stats error: {0}")]
    StatsError(#[from] StatsError),
}
