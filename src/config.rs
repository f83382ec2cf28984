//! Detector configuration
//!
//! Every empirical constant of the pipeline lives here. The defaults are
//! calibrated for a 1920-row canonical image of the target ID card layout;
//! recalibrating for another template only requires a different config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{CandidateStrategy, DetectError, Result, CANONICAL_HEIGHT};

/// Config file name looked up in the user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name inside the user config directory
pub const CONFIG_DIR_NAME: &str = "id-text-locator";

/// MSER extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MserOptions {
    /// Grey-level step used to measure region stability (default: 5)
    pub delta: u8,
    /// Minimum region area in pixels (default: 60)
    pub min_area: u32,
    /// Maximum region area in pixels (default: 14400)
    pub max_area: u32,
    /// Maximum relative area growth over `delta` levels (default: 0.25)
    pub max_variation: f32,
    /// Extract bright-on-dark regions in addition to dark-on-bright (default: true)
    pub both_polarities: bool,
}

impl Default for MserOptions {
    fn default() -> Self {
        Self {
            delta: 5,
            min_area: 60,
            max_area: 14400,
            max_variation: 0.25,
            both_polarities: true,
        }
    }
}

/// Parameters of the region-growing strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionGrowingOptions {
    /// Median blur aperture applied before MSER (default: 3)
    pub median_size: u32,
    /// Gaussian sigma used by the box refiner (default: 1.1, a 5x5 kernel)
    pub refine_sigma: f32,
    /// Boxes smaller than `mean / size_divisor` in either axis are dropped (default: 3.0)
    pub size_divisor: f64,
    /// Row tolerance when assigning boxes to a band (default: 5)
    pub band_tolerance: u32,
    pub mser: MserOptions,
}

impl Default for RegionGrowingOptions {
    fn default() -> Self {
        Self {
            median_size: 3,
            refine_sigma: 1.1,
            size_divisor: 3.0,
            band_tolerance: 5,
            mser: MserOptions::default(),
        }
    }
}

/// Parameters of the morphological threshold strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyOptions {
    /// Global binarization threshold (default: 100)
    pub binary_threshold: u8,
    /// Square kernel size fusing glyphs into fields (default: 27)
    pub field_kernel: u32,
    /// Iterations of the field erosion (default: 2)
    pub field_iterations: u32,
    /// Exclusive lower bound on contour area (default: 729)
    pub min_area: f64,
    /// Exclusive upper bound on contour area as a fraction of the image (default: 0.05)
    pub max_area_fraction: f64,
    /// Exclusive lower bound on box height (default: 50)
    pub min_height: u32,
    /// Exclusive upper bound on box height (default: 200)
    pub max_height: u32,
    /// Boxes wider than this are split into columns (default: 100)
    pub split_min_width: u32,
    /// Column erosion kernel width (default: 3)
    pub column_kernel_width: u32,
    /// Column erosion kernel height (default: 5)
    pub column_kernel_height: u32,
    /// Iterations of the column erosion (default: 2)
    pub column_iterations: u32,
    /// Horizontal center ratio beyond which boxes may be photo noise (default: 0.65)
    pub photo_x_ratio: f64,
    /// Vertical center ratio above which boxes may be photo noise (default: 0.7)
    pub photo_y_ratio: f64,
}

impl Default for MorphologyOptions {
    fn default() -> Self {
        Self {
            binary_threshold: 100,
            field_kernel: 27,
            field_iterations: 2,
            min_area: 729.0,
            max_area_fraction: 0.05,
            min_height: 50,
            max_height: 200,
            split_min_width: 100,
            column_kernel_width: 3,
            column_kernel_height: 5,
            column_iterations: 2,
            photo_x_ratio: 0.65,
            photo_y_ratio: 0.7,
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Height every input is normalized to (default: 1920)
    pub canonical_height: u32,
    /// Candidate generation strategy
    pub strategy: CandidateStrategy,
    pub region_growing: RegionGrowingOptions,
    pub morphology: MorphologyOptions,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            canonical_height: CANONICAL_HEIGHT,
            strategy: CandidateStrategy::default(),
            region_growing: RegionGrowingOptions::default(),
            morphology: MorphologyOptions::default(),
        }
    }
}

impl DetectorConfig {
    /// Create a new config builder
    pub fn builder() -> DetectorConfigBuilder {
        DetectorConfigBuilder::default()
    }

    /// Create a config using the morphological threshold strategy
    pub fn morphological() -> Self {
        Self {
            strategy: CandidateStrategy::MorphologicalThreshold,
            ..Default::default()
        }
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize the config as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DetectError::Config(e.to_string()))
    }

    /// Default config file location (`<config_dir>/id-text-locator/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Check that every parameter is usable by the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.canonical_height == 0 {
            return Err(DetectError::Config("canonical_height must be positive".into()));
        }

        let rg = &self.region_growing;
        if rg.median_size == 0 || rg.median_size % 2 == 0 {
            return Err(DetectError::Config(format!(
                "median_size must be odd, got {}",
                rg.median_size
            )));
        }
        if rg.refine_sigma.is_nan() || rg.refine_sigma <= 0.0 {
            return Err(DetectError::Config("refine_sigma must be positive".into()));
        }
        if rg.size_divisor.is_nan() || rg.size_divisor <= 0.0 {
            return Err(DetectError::Config("size_divisor must be positive".into()));
        }
        if rg.mser.delta == 0 {
            return Err(DetectError::Config("mser.delta must be positive".into()));
        }
        if rg.mser.min_area > rg.mser.max_area {
            return Err(DetectError::Config(format!(
                "mser.min_area {} exceeds mser.max_area {}",
                rg.mser.min_area, rg.mser.max_area
            )));
        }

        let m = &self.morphology;
        for (name, size) in [
            ("field_kernel", m.field_kernel),
            ("column_kernel_width", m.column_kernel_width),
            ("column_kernel_height", m.column_kernel_height),
        ] {
            if size == 0 || size % 2 == 0 {
                return Err(DetectError::Config(format!(
                    "{name} must be odd, got {size}"
                )));
            }
        }
        if m.max_area_fraction.is_nan()
            || m.max_area_fraction <= 0.0
            || m.max_area_fraction > 1.0
        {
            return Err(DetectError::Config(format!(
                "max_area_fraction must be in (0, 1], got {}",
                m.max_area_fraction
            )));
        }
        if m.min_height >= m.max_height {
            return Err(DetectError::Config(format!(
                "min_height {} must be below max_height {}",
                m.min_height, m.max_height
            )));
        }
        for (name, ratio) in [("photo_x_ratio", m.photo_x_ratio), ("photo_y_ratio", m.photo_y_ratio)] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(DetectError::Config(format!(
                    "{name} must be in [0, 1], got {ratio}"
                )));
            }
        }

        Ok(())
    }
}

/// Builder for DetectorConfig
#[derive(Debug, Default)]
pub struct DetectorConfigBuilder {
    config: DetectorConfig,
}

impl DetectorConfigBuilder {
    /// Set candidate generation strategy
    #[must_use]
    pub fn strategy(mut self, strategy: CandidateStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set canonical image height
    #[must_use]
    pub fn canonical_height(mut self, height: u32) -> Self {
        self.config.canonical_height = height;
        self
    }

    /// Set region-growing options
    #[must_use]
    pub fn region_growing(mut self, options: RegionGrowingOptions) -> Self {
        self.config.region_growing = options;
        self
    }

    /// Set morphology options
    #[must_use]
    pub fn morphology(mut self, options: MorphologyOptions) -> Self {
        self.config.morphology = options;
        self
    }

    /// Set band tolerance in rows
    #[must_use]
    pub fn band_tolerance(mut self, rows: u32) -> Self {
        self.config.region_growing.band_tolerance = rows;
        self
    }

    /// Set global binarization threshold (morphological strategy)
    #[must_use]
    pub fn binary_threshold(mut self, threshold: u8) -> Self {
        self.config.morphology.binary_threshold = threshold;
        self
    }

    /// Set photo exclusion ratios
    #[must_use]
    pub fn photo_region(mut self, x_ratio: f64, y_ratio: f64) -> Self {
        self.config.morphology.photo_x_ratio = x_ratio.clamp(0.0, 1.0);
        self.config.morphology.photo_y_ratio = y_ratio.clamp(0.0, 1.0);
        self
    }

    /// Build and validate the config
    pub fn build(self) -> Result<DetectorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.canonical_height, 1920);
        assert_eq!(config.morphology.field_kernel, 27);
        assert_eq!(config.morphology.binary_threshold, 100);
        assert_eq!(config.region_growing.band_tolerance, 5);
    }

    #[test]
    fn test_morphological_preset() {
        let config = DetectorConfig::morphological();
        assert_eq!(config.strategy, CandidateStrategy::MorphologicalThreshold);
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = DetectorConfig::builder()
            .strategy(CandidateStrategy::MorphologicalThreshold)
            .binary_threshold(120)
            .photo_region(0.6, 0.5)
            .band_tolerance(8)
            .build()
            .unwrap();
        assert_eq!(config.morphology.binary_threshold, 120);
        assert!((config.morphology.photo_x_ratio - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.region_growing.band_tolerance, 8);
    }

    #[test]
    fn test_builder_rejects_even_kernel() {
        let morphology = MorphologyOptions {
            field_kernel: 26,
            ..Default::default()
        };
        let err = DetectorConfig::builder().morphology(morphology).build();
        assert!(matches!(err, Err(DetectError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_height() {
        let err = DetectorConfig::builder().canonical_height(0).build();
        assert!(matches!(err, Err(DetectError::Config(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            strategy = "morphological-threshold"

            [morphology]
            binary_threshold = 90
        "#;
        let config = DetectorConfig::from_toml_str(text).unwrap();
        assert_eq!(config.strategy, CandidateStrategy::MorphologicalThreshold);
        assert_eq!(config.morphology.binary_threshold, 90);
        assert_eq!(config.morphology.field_kernel, 27);
        assert_eq!(config.region_growing.mser.delta, 5);
    }

    #[test]
    fn test_toml_roundtrip_preserves_config() {
        let config = DetectorConfig::morphological();
        let text = config.to_toml_string().unwrap();
        let parsed = DetectorConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_nan_parameters_rejected() {
        for text in [
            "[region_growing]\nrefine_sigma = nan\n",
            "[region_growing]\nsize_divisor = nan\n",
            "[morphology]\nmax_area_fraction = nan\n",
            "[morphology]\nphoto_x_ratio = nan\n",
        ] {
            let err = DetectorConfig::from_toml_str(text);
            assert!(matches!(err, Err(DetectError::Config(_))), "accepted {text:?}");
        }
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let err = DetectorConfig::from_toml_str("canonical_height = \"tall\"");
        assert!(matches!(err, Err(DetectError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = DetectorConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(err, Err(DetectError::Io(_))));
    }
}
