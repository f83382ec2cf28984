//! Image normalization
//!
//! Rescales every input to the canonical height with area averaging so the
//! pixel-area thresholds downstream always mean the same thing.

use image::{DynamicImage, Rgb, RgbImage};

use crate::types::{DetectError, Result};

/// Result of normalizing one input image
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Image rescaled to the canonical height
    pub image: RgbImage,
    /// `original_height / canonical_height`
    pub scale: f64,
    /// Width of the input image
    pub original_width: u32,
    /// Height of the input image
    pub original_height: u32,
}

/// Rescales images to a fixed canonical height
pub struct ImageNormalizer;

impl ImageNormalizer {
    /// Compute the canonical width for an input of the given size
    pub fn target_width(width: u32, height: u32, canonical_height: u32) -> u32 {
        let factor = height as f64 / canonical_height as f64;
        ((width as f64 / factor).round() as u32).max(1)
    }

    /// Rescale `image` to `canonical_height` rows, keeping the aspect ratio
    pub fn normalize(image: &DynamicImage, canonical_height: u32) -> Result<NormalizedImage> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 || canonical_height == 0 {
            return Err(DetectError::EmptyImage { width, height });
        }

        let target_w = Self::target_width(width, height, canonical_height);
        let rgb = image.to_rgb8();
        let resized = if target_w == width && canonical_height == height {
            rgb
        } else {
            resize_area(&rgb, target_w, canonical_height)
        };

        Ok(NormalizedImage {
            image: resized,
            scale: height as f64 / canonical_height as f64,
            original_width: width,
            original_height: height,
        })
    }
}

/// Source pixels covering one destination pixel, with their coverage weights
fn area_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f32)>> {
    let ratio = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * ratio;
            let end = ((d + 1) as f64 * ratio).min(src_len as f64);
            let mut weights = Vec::new();
            let mut s = start.floor() as u32;
            while (s as f64) < end && s < src_len {
                let lo = start.max(s as f64);
                let hi = end.min((s + 1) as f64);
                let w = (hi - lo) / (end - start);
                if w > 0.0 {
                    weights.push((s, w as f32));
                }
                s += 1;
            }
            weights
        })
        .collect()
}

/// Resize with pixel-area relation: each destination pixel is the
/// coverage-weighted mean of the source pixels it overlaps.
pub fn resize_area(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = src.dimensions();
    let x_weights = area_weights(src_w, width);
    let y_weights = area_weights(src_h, height);

    // Horizontal pass into a float buffer of src_h rows x width columns
    let mut horizontal = vec![[0f32; 3]; (src_h * width) as usize];
    for y in 0..src_h {
        for (dx, weights) in x_weights.iter().enumerate() {
            let mut acc = [0f32; 3];
            for &(sx, w) in weights {
                let p = src.get_pixel(sx, y);
                for c in 0..3 {
                    acc[c] += p[c] as f32 * w;
                }
            }
            horizontal[(y * width) as usize + dx] = acc;
        }
    }

    RgbImage::from_fn(width, height, |dx, dy| {
        let mut acc = [0f32; 3];
        for &(sy, w) in &y_weights[dy as usize] {
            let p = horizontal[(sy * width + dx) as usize];
            for c in 0..3 {
                acc[c] += p[c] * w;
            }
        }
        Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
    })
}
