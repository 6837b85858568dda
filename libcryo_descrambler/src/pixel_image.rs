use ndarray::Array2;

use super::camera_layout::CameraLayout;
use super::error::DescrambleError;

/// A descrambled image: rows are channels, columns are time samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    pub event_index: u64,
    pub asic_id: Option<u8>,
    data: Array2<u32>,
}

impl PixelImage {
    pub fn new(event_index: u64, asic_id: Option<u8>, data: Array2<u32>) -> Self {
        Self {
            event_index,
            asic_id,
            data,
        }
    }

    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<u32> {
        self.data.get((row, column)).copied()
    }

    /// Convert to floating point for averaging
    pub fn to_f64(&self) -> Array2<f64> {
        self.data.mapv(|sample| sample as f64)
    }

    /// Put the samples back in transmission order (the inverse of descrambling).
    pub fn scramble(&self, layout: &CameraLayout) -> Result<Vec<u32>, DescrambleError> {
        if self.shape() != layout.shape() {
            return Err(DescrambleError::ShapeMismatch {
                expected: layout.n_samples(),
                actual: self.data.len(),
            });
        }
        let flat: Vec<u32> = self.data.iter().copied().collect();
        Ok(layout
            .permutation()
            .iter()
            .map(|&pixel| flat[pixel])
            .collect())
    }
}
