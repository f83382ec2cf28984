//! Text region detector
//!
//! Runs the full pipeline for one image: normalize, generate candidates,
//! then the strategy-specific post-processing.

use image::{imageops, DynamicImage, GrayImage};
use rayon::prelude::*;
use serde::Serialize;

use crate::column_split::ColumnSplitter;
use crate::config::DetectorConfig;
use crate::generator::{column_binary, CandidateGenerator};
use crate::line_cluster::{cluster_lines, filter_by_size};
use crate::noise::NoiseFilter;
use crate::normalize::ImageNormalizer;
use crate::types::{CandidateStrategy, Result, TextBox};

/// Boxes found in one image
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Boxes in normalized coordinates
    pub boxes: Vec<TextBox>,
    /// Normalized image width
    pub width: u32,
    /// Normalized image height
    pub height: u32,
    /// `original_height / canonical_height`
    pub scale: f64,
    pub original_width: u32,
    pub original_height: u32,
    pub strategy: CandidateStrategy,
}

impl Detection {
    /// Boxes mapped back to the input image's coordinates
    pub fn to_original(&self) -> Vec<TextBox> {
        self.boxes
            .iter()
            .map(|b| b.rescale(self.scale, self.original_width, self.original_height))
            .collect()
    }
}

/// Text region detector for ID document photos
#[derive(Debug, Clone, Default)]
pub struct TextDetector {
    config: DetectorConfig,
}

impl TextDetector {
    /// Create a detector, rejecting unusable configs
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Locate text boxes in one image
    pub fn detect(&self, image: &DynamicImage) -> Result<Detection> {
        let normalized = ImageNormalizer::normalize(image, self.config.canonical_height)?;
        let gray = imageops::grayscale(&normalized.image);
        let (width, height) = gray.dimensions();

        let generator = CandidateGenerator::from_config(&self.config);
        let candidates = generator.generate(&gray);
        tracing::debug!(
            strategy = ?generator.strategy(),
            candidates = candidates.len(),
            "generated candidates"
        );

        let boxes = match generator.strategy() {
            CandidateStrategy::RegionGrowing => self.finish_region_growing(&candidates, height),
            CandidateStrategy::MorphologicalThreshold => {
                self.finish_morphological(&gray, &candidates)
            }
        };
        tracing::debug!(boxes = boxes.len(), "detection finished");
        debug_assert!(boxes.iter().all(|b| b.fits_within(width, height)));

        Ok(Detection {
            boxes,
            width,
            height,
            scale: normalized.scale,
            original_width: normalized.original_width,
            original_height: normalized.original_height,
            strategy: generator.strategy(),
        })
    }

    /// Detect several images in parallel, one independent pipeline per image
    pub fn detect_batch(&self, images: &[DynamicImage]) -> Vec<Result<Detection>> {
        images.par_iter().map(|image| self.detect(image)).collect()
    }

    fn finish_region_growing(&self, candidates: &[TextBox], height: u32) -> Vec<TextBox> {
        let options = &self.config.region_growing;
        let sized = filter_by_size(candidates, options.size_divisor);
        tracing::debug!(kept = sized.len(), "size filter");
        cluster_lines(&sized, height, options.band_tolerance)
    }

    fn finish_morphological(&self, gray: &GrayImage, candidates: &[TextBox]) -> Vec<TextBox> {
        let options = &self.config.morphology;
        let binary = column_binary(gray, options);
        let split = ColumnSplitter::new(&binary, options.split_min_width).split_all(candidates);
        tracing::debug!(split = split.len(), "column split");

        let (width, height) = gray.dimensions();
        NoiseFilter::new(width, height, options.photo_x_ratio, options.photo_y_ratio).apply(&split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectError;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_detect_rejects_empty_image() {
        let img = DynamicImage::new_rgb8(0, 0);
        let result = TextDetector::default().detect(&img);
        assert!(matches!(result, Err(DetectError::EmptyImage { .. })));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = DetectorConfig {
            canonical_height: 0,
            ..Default::default()
        };
        assert!(TextDetector::new(config).is_err());
    }

    #[test]
    fn test_blank_image_yields_no_boxes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 320, Rgb([255, 255, 255])));
        let detection = TextDetector::default().detect(&img).unwrap();
        assert!(detection.boxes.is_empty());
        assert_eq!(detection.height, 1920);
        assert_eq!(detection.width, 1200);
        assert!((detection.scale - 320.0 / 1920.0).abs() < 1e-12);

        let morph = TextDetector::new(DetectorConfig::morphological()).unwrap();
        assert!(morph.detect(&img).unwrap().boxes.is_empty());
    }

    #[test]
    fn test_to_original_scales_back() {
        let detection = Detection {
            boxes: vec![TextBox::new(100, 200, 300, 400).unwrap()],
            width: 1080,
            height: 1920,
            scale: 0.5,
            original_width: 540,
            original_height: 960,
            strategy: CandidateStrategy::RegionGrowing,
        };
        assert_eq!(
            detection.to_original(),
            vec![TextBox::new(50, 100, 150, 200).unwrap()]
        );
    }
}
