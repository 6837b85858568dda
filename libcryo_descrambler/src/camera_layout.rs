//! Camera layouts describe how a camera's samples travel over the link.
//!
//! The Cryo ASIC digitizes 64 channels split across a top bank (rows 0-31) and a bottom
//! bank (rows 32-63). Each time sample is shipped as one block of 64 words, with the two
//! banks interleaved word by word. An image therefore arrives column by column, and within
//! a column the words alternate between banks. The table below is that wiring, written
//! out once; descrambling never computes it.
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::constants::{CRYO_ROWS, DEFAULT_BIT_MASK};
use super::error::LayoutError;

/// Row addressed by each word slot of a transmitted column block
#[rustfmt::skip]
const CRYO_CHANNEL_ORDER: [usize; CRYO_ROWS] = [
     0, 32,  1, 33,  2, 34,  3, 35,  4, 36,  5, 37,  6, 38,  7, 39,
     8, 40,  9, 41, 10, 42, 11, 43, 12, 44, 13, 45, 14, 46, 15, 47,
    16, 48, 17, 49, 18, 50, 19, 51, 20, 52, 21, 53, 22, 54, 23, 55,
    24, 56, 25, 57, 26, 58, 27, 59, 28, 60, 29, 61, 30, 62, 31, 63,
];

/// The named camera variants this library knows how to descramble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CameraKind {
    /// 64 channels x 128 samples, one packet per image. Also accepted as `cryo64xN`.
    #[default]
    Cryo64x128,
    /// 64 channels x 256 samples, split over two packets
    Cryo64x256,
}

impl FromStr for CameraKind {
    type Err = LayoutError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cryo64xn" | "cryo64x128" => Ok(Self::Cryo64x128),
            "cryo64x256" => Ok(Self::Cryo64x256),
            _ => Err(LayoutError::UnknownCamera(s.to_string())),
        }
    }
}

impl TryFrom<String> for CameraKind {
    type Error = LayoutError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<CameraKind> for String {
    fn from(value: CameraKind) -> Self {
        value.to_string()
    }
}

impl Display for CameraKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cryo64x128 => write!(f, "cryo64xN"),
            Self::Cryo64x256 => write!(f, "cryo64x256"),
        }
    }
}

/// CameraLayout holds everything needed to turn one assembled frame into an image.
///
/// `permutation[i]` is the flat (row-major) pixel index of the i-th transmitted sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraLayout {
    pub kind: CameraKind,
    pub bit_mask: u32,
    pub rows: usize,
    pub columns: usize,
    pub packets_per_frame: usize,
    permutation: Vec<usize>,
}

impl CameraLayout {
    /// Create the layout for a camera with its default mask and packet count
    pub fn new(kind: CameraKind) -> Self {
        match kind {
            CameraKind::Cryo64x128 => Self::cryo(kind, 128, 1),
            CameraKind::Cryo64x256 => Self::cryo(kind, 256, 2),
        }
    }

    /// Look up a layout by its configuration name
    pub fn from_name(name: &str) -> Result<Self, LayoutError> {
        Ok(Self::new(CameraKind::from_str(name)?))
    }

    pub fn with_bit_mask(mut self, bit_mask: u32) -> Self {
        self.bit_mask = bit_mask;
        self
    }

    pub fn with_packets_per_frame(mut self, packets: usize) -> Result<Self, LayoutError> {
        if packets == 0 {
            return Err(LayoutError::BadPacketCount(packets));
        }
        self.packets_per_frame = packets;
        Ok(self)
    }

    fn cryo(kind: CameraKind, columns: usize, packets_per_frame: usize) -> Self {
        let mut permutation = Vec::with_capacity(CRYO_ROWS * columns);
        for column in 0..columns {
            for row in CRYO_CHANNEL_ORDER {
                permutation.push(row * columns + column);
            }
        }
        Self {
            kind,
            bit_mask: DEFAULT_BIT_MASK,
            rows: CRYO_ROWS,
            columns,
            packets_per_frame,
            permutation,
        }
    }

    /// Number of samples in one image
    pub fn n_samples(&self) -> usize {
        self.rows * self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn mask(&self, sample: u32) -> u32 {
        sample & self.bit_mask
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }
}
