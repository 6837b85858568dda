use ndarray::Array2;

use super::camera_layout::CameraLayout;
use super::error::DescrambleError;
use super::frame_assembler::AssembledFrame;
use super::pixel_image::PixelImage;

/// ImageDescrambler maps an AssembledFrame onto the pixel grid of its camera.
///
/// Samples are masked, moved from transmission order to row-major pixel order using the
/// layout's fixed table, and shaped into `rows x columns`. A frame that does not hold
/// exactly one image worth of samples is rejected; it is never padded or cut.
#[derive(Debug, Clone)]
pub struct ImageDescrambler {
    layout: CameraLayout,
}

impl ImageDescrambler {
    pub fn new(layout: CameraLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &CameraLayout {
        &self.layout
    }

    pub fn descramble(&self, frame: &AssembledFrame) -> Result<PixelImage, DescrambleError> {
        let expected = self.layout.n_samples();
        if frame.len() != expected {
            return Err(DescrambleError::ShapeMismatch {
                expected,
                actual: frame.len(),
            });
        }

        let mut pixels = vec![0u32; expected];
        for (&word, &pixel) in frame.words.iter().zip(self.layout.permutation()) {
            pixels[pixel] = self.layout.mask(word);
        }

        let data = Array2::from_shape_vec(self.layout.shape(), pixels).map_err(|_| {
            DescrambleError::ShapeMismatch {
                expected,
                actual: frame.len(),
            }
        })?;
        Ok(PixelImage::new(frame.event_index, frame.asic_id, data))
    }
}
