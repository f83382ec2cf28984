//! Box refinement
//!
//! Shrinks a speculative candidate rectangle to the extent of the ink it
//! actually contains.

use image::{imageops, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

use crate::morphology::is_ink;
use crate::types::TextBox;

/// Tightens candidate boxes with a blur + Otsu re-binarization
#[derive(Debug, Clone)]
pub struct BoxRefiner {
    sigma: f32,
}

impl Default for BoxRefiner {
    fn default() -> Self {
        Self { sigma: 1.1 }
    }
}

impl BoxRefiner {
    /// Create a refiner with the given Gaussian sigma (must be positive)
    pub fn new(sigma: f32) -> Self {
        Self { sigma }
    }

    /// Refine the region `rect` of the full grayscale image
    pub fn refine_region(&self, gray: &GrayImage, rect: &TextBox) -> Option<TextBox> {
        let width = rect.x2 + 1 - rect.x1;
        let height = rect.y2 + 1 - rect.y1;
        let crop = imageops::crop_imm(gray, rect.x1, rect.y1, width, height).to_image();
        self.refine(&crop, rect.x1, rect.y1)
    }

    /// Refine a cropped sub-image whose top-left corner sits at `(x, y)`.
    ///
    /// Returns `None` when the crop holds no ink or the ink collapses to a
    /// single row or column.
    pub fn refine(&self, crop: &GrayImage, x: u32, y: u32) -> Option<TextBox> {
        if crop.width() == 0 || crop.height() == 0 {
            return None;
        }
        let blurred = gaussian_blur_f32(crop, self.sigma);
        let level = otsu_level(&blurred);
        let binary = threshold(&blurred, level, ThresholdType::Binary);

        let (x0, y0, x1, y1) = ink_bounds(&binary)?;
        TextBox::new(x + x0, y + y0, x + x1, y + y1)
    }
}

/// Inclusive column and row range containing ink in a binary image
pub fn ink_bounds(binary: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = binary.dimensions();
    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for (x, y, pixel) in binary.enumerate_pixels() {
        if is_ink(pixel[0]) {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x > max_x || min_y > max_y {
        return None;
    }
    Some((min_x, min_y, max_x, max_y))
}
