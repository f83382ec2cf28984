//! Binarization, erosion and contour geometry helpers
//!
//! Binary images in this crate store ink as 0 and background as 255, so an
//! erosion (minimum filter) grows ink and closes the gaps between glyphs.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::erode;
use imageproc::point::Point;

use crate::types::{TextBox, BACKGROUND, INK};

/// Rectangular structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub width: u32,
    pub height: u32,
}

impl Kernel {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

/// Binarize: pixels brighter than `level` become background, the rest ink
pub fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    threshold(gray, level, ThresholdType::Binary)
}

/// Swap ink and background so ink becomes the non-zero foreground
pub fn invert(binary: &GrayImage) -> GrayImage {
    GrayImage::from_fn(binary.width(), binary.height(), |x, y| {
        Luma([BACKGROUND - binary.get_pixel(x, y)[0]])
    })
}

/// Erode `image` with a rectangular kernel, `iterations` times
pub fn erode_rect(image: &GrayImage, kernel: Kernel, iterations: u32) -> GrayImage {
    let mut out = image.clone();
    for _ in 0..iterations {
        out = if kernel.width == kernel.height && kernel.width / 2 <= u8::MAX as u32 {
            erode(&out, Norm::LInf, (kernel.width / 2) as u8)
        } else {
            min_filter_separable(&out, kernel.width / 2, kernel.height / 2)
        };
    }
    out
}

/// Minimum filter over a `(2rx+1) x (2ry+1)` window, split into a row pass and a
/// column pass. Pixels outside the image are ignored.
fn min_filter_separable(image: &GrayImage, rx: u32, ry: u32) -> GrayImage {
    let (w, h) = image.dimensions();
    let rows = GrayImage::from_fn(w, h, |x, y| {
        let lo = x.saturating_sub(rx);
        let hi = (x + rx).min(w - 1);
        let v = (lo..=hi).map(|sx| image.get_pixel(sx, y)[0]).min().unwrap_or(BACKGROUND);
        Luma([v])
    });
    GrayImage::from_fn(w, h, |x, y| {
        let lo = y.saturating_sub(ry);
        let hi = (y + ry).min(h - 1);
        let v = (lo..=hi).map(|sy| rows.get_pixel(x, sy)[0]).min().unwrap_or(BACKGROUND);
        Luma([v])
    })
}

/// Extract every border (outer and hole) of the non-zero regions of `mask`
pub fn contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask)
}

/// Tightest box around a contour's points
pub fn bounding_box(points: &[Point<i32>]) -> Option<TextBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if min_x < 0 || min_y < 0 {
        return None;
    }
    TextBox::new(min_x as u32, min_y as u32, max_x as u32, max_y as u32)
}

/// Area enclosed by the contour polygon (shoelace formula)
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// Check whether a binary pixel value is ink
pub fn is_ink(value: u8) -> bool {
    value == INK
}
