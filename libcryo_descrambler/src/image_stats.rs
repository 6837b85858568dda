use ndarray::{Array1, Array2, Axis};

use super::error::StatsError;
use super::pixel_image::PixelImage;

/// Running per-pixel statistics over a stack of images of the same shape.
///
/// Only the sum and sum of squares are kept, so the stack never holds the images
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct ImageStack {
    sum: Option<Array2<f64>>,
    sum_squares: Option<Array2<f64>>,
    n_images: u64,
}

impl ImageStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: &PixelImage) -> Result<(), StatsError> {
        let values = image.to_f64();
        if let Some(expected) = self.shape() {
            if expected != values.dim() {
                return Err(StatsError::ShapeMismatch {
                    expected,
                    actual: values.dim(),
                });
            }
        }
        let squares = values.mapv(|v| v * v);
        match (self.sum.take(), self.sum_squares.take()) {
            (Some(sum), Some(sum_squares)) => {
                self.sum = Some(sum + &values);
                self.sum_squares = Some(sum_squares + &squares);
            }
            _ => {
                self.sum = Some(values);
                self.sum_squares = Some(squares);
            }
        }
        self.n_images += 1;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.n_images
    }

    pub fn is_empty(&self) -> bool {
        self.n_images == 0
    }

    pub fn shape(&self) -> Option<(usize, usize)> {
        self.sum.as_ref().map(|s| s.dim())
    }

    /// The dark image: per-pixel mean over the stack
    pub fn mean(&self) -> Result<Array2<f64>, StatsError> {
        let sum = self.sum.as_ref().ok_or(StatsError::Empty)?;
        Ok(sum / self.n_images as f64)
    }

    /// The noise (heat) map: per-pixel population standard deviation
    pub fn std(&self) -> Result<Array2<f64>, StatsError> {
        let mean = self.mean()?;
        let sum_squares = self.sum_squares.as_ref().ok_or(StatsError::Empty)?;
        let n = self.n_images as f64;
        let mut variance = sum_squares / n - &mean * &mean;
        // Rounding can push a flat pixel slightly negative
        variance.mapv_inplace(|v| v.max(0.0).sqrt());
        Ok(variance)
    }

    /// Subtract the dark image from a single image
    pub fn dark_subtract(&self, image: &PixelImage) -> Result<Array2<f64>, StatsError> {
        let dark = self.mean()?;
        if dark.dim() != image.shape() {
            return Err(StatsError::ShapeMismatch {
                expected: dark.dim(),
                actual: image.shape(),
            });
        }
        Ok(image.to_f64() - dark)
    }
}

/// Per-row (per-channel) baseline mean and standard deviation of one image
pub fn baseline_stats(image: &PixelImage) -> (Array1<f64>, Array1<f64>) {
    let values = image.to_f64();
    let mean = values
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(values.nrows()));
    let std = values.std_axis(Axis(1), 0.0);
    (mean, std)
}

/// Differential non-linearity along a sequence of averages.
///
/// `averages` holds one row per step of a ramp. Row n of the result is
/// `averages[n + 1] - averages[n]`, with the last row wrapping around to the first.
pub fn dnl(averages: &Array2<f64>) -> Array2<f64> {
    let n_rows = averages.nrows();
    let mut out = Array2::zeros(averages.dim());
    for n in 0..n_rows {
        let next = averages.row((n + 1) % n_rows);
        let this = averages.row(n);
        out.row_mut(n).assign(&(&next - &this));
    }
    out
}
