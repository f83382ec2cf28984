//! Candidate box generation
//!
//! Two strategies produce the initial, noisy candidate set:
//!
//! - **RegionGrowing**: MSER regions are rasterized into a mask whose
//!   connected components are refined to their ink extent. Yields roughly
//!   glyph- or line-level boxes.
//! - **MorphologicalThreshold**: a fixed threshold plus a heavy erosion fuses
//!   glyphs into field blobs, which are kept when their size matches a field.

use image::{GrayImage, Luma};
use imageproc::contours::BorderType;
use imageproc::filter::median_filter;

use crate::config::{DetectorConfig, MorphologyOptions, RegionGrowingOptions};
use crate::morphology::{self, Kernel};
use crate::mser::{MserDetector, MserRegion};
use crate::refine::BoxRefiner;
use crate::types::{CandidateStrategy, TextBox};

/// Candidate generator, one variant per strategy
#[derive(Debug, Clone)]
pub enum CandidateGenerator {
    RegionGrowing(RegionGrowingOptions),
    MorphologicalThreshold(MorphologyOptions),
}

impl CandidateGenerator {
    /// Pick the generator configured by `config.strategy`
    pub fn from_config(config: &DetectorConfig) -> Self {
        match config.strategy {
            CandidateStrategy::RegionGrowing => Self::RegionGrowing(config.region_growing.clone()),
            CandidateStrategy::MorphologicalThreshold => {
                Self::MorphologicalThreshold(config.morphology.clone())
            }
        }
    }

    pub fn strategy(&self) -> CandidateStrategy {
        match self {
            Self::RegionGrowing(_) => CandidateStrategy::RegionGrowing,
            Self::MorphologicalThreshold(_) => CandidateStrategy::MorphologicalThreshold,
        }
    }

    /// Produce unordered candidate boxes from the normalized grayscale image
    pub fn generate(&self, gray: &GrayImage) -> Vec<TextBox> {
        match self {
            Self::RegionGrowing(options) => region_growing_candidates(gray, options),
            Self::MorphologicalThreshold(options) => morphological_candidates(gray, options),
        }
    }
}

/// Fill each region's bounding rectangle on a blank mask
pub fn region_mask(width: u32, height: u32, regions: &[MserRegion]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for r in regions {
        for y in r.y_min..=r.y_max.min(height - 1) {
            for x in r.x_min..=r.x_max.min(width - 1) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
    mask
}

fn region_growing_candidates(gray: &GrayImage, options: &RegionGrowingOptions) -> Vec<TextBox> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let radius = options.median_size / 2;
    let blurred = median_filter(gray, radius, radius);
    let regions = MserDetector::new(options.mser.clone()).detect(&blurred);
    tracing::debug!(regions = regions.len(), "extracted stable regions");

    let mask = region_mask(width, height, &regions);
    let rects: Vec<TextBox> = morphology::contours(&mask)
        .iter()
        .filter_map(|c| morphology::bounding_box(&c.points))
        .collect();

    let refiner = BoxRefiner::new(options.refine_sigma);
    let refined: Vec<TextBox> = rects
        .iter()
        .filter_map(|rect| refiner.refine_region(gray, rect))
        .collect();
    tracing::debug!(
        rects = rects.len(),
        refined = refined.len(),
        "refined mask components"
    );
    refined
}

fn morphological_candidates(gray: &GrayImage, options: &MorphologyOptions) -> Vec<TextBox> {
    let (width, height) = gray.dimensions();
    let binary = morphology::binarize(gray, options.binary_threshold);
    let eroded = morphology::erode_rect(
        &binary,
        Kernel::square(options.field_kernel),
        options.field_iterations,
    );
    let ink = morphology::invert(&eroded);

    let max_area = options.max_area_fraction * height as f64 * width as f64;
    let candidates: Vec<TextBox> = morphology::contours(&ink)
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .filter_map(|c| {
            let b = morphology::bounding_box(&c.points)?;
            let area = morphology::polygon_area(&c.points);
            let h = b.height() + 1;
            let keep = area > options.min_area
                && area < max_area
                && h > options.min_height
                && h < options.max_height;
            keep.then_some(b)
        })
        .collect();
    tracing::debug!(candidates = candidates.len(), "field blobs within size bounds");
    candidates
}

/// Binary image the column splitter projects: threshold plus a fine erosion
pub fn column_binary(gray: &GrayImage, options: &MorphologyOptions) -> GrayImage {
    let binary = morphology::binarize(gray, options.binary_threshold);
    morphology::erode_rect(
        &binary,
        Kernel::new(options.column_kernel_width, options.column_kernel_height),
        options.column_iterations,
    )
}
