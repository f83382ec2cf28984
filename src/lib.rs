//! Text region localization for photographed identity documents
//!
//! Turns an upright ID card photo into a list of axis-aligned boxes, one per
//! text line or field, ready for a recognition stage.
//!
//! Two candidate strategies are available:
//!
//! - [`CandidateStrategy::RegionGrowing`]: MSER regions, refined with Otsu
//!   thresholding and clustered into text lines.
//! - [`CandidateStrategy::MorphologicalThreshold`]: fixed threshold + erosion
//!   field blobs, split into tokens and filtered against the photo area.
//!
//! ```no_run
//! use id_text_locator::{DetectorConfig, TextDetector};
//!
//! let image = image::open("id.jpg").unwrap();
//! let detector = TextDetector::new(DetectorConfig::default()).unwrap();
//! let detection = detector.detect(&image).unwrap();
//! for b in detection.to_original() {
//!     println!("{} {} {} {}", b.x1, b.y1, b.x2, b.y2);
//! }
//! ```

pub mod column_split;
pub mod config;
pub mod detector;
pub mod generator;
pub mod line_cluster;
pub mod morphology;
pub mod mser;
pub mod noise;
pub mod normalize;
pub mod refine;
pub mod types;

// Re-export public API
pub use column_split::ColumnSplitter;
pub use config::{
    DetectorConfig, DetectorConfigBuilder, MorphologyOptions, MserOptions, RegionGrowingOptions,
};
pub use detector::{Detection, TextDetector};
pub use generator::CandidateGenerator;
pub use mser::{MserDetector, MserRegion};
pub use noise::NoiseFilter;
pub use normalize::{ImageNormalizer, NormalizedImage};
pub use refine::BoxRefiner;
pub use types::{Band, CandidateStrategy, DetectError, Result, TextBox, CANONICAL_HEIGHT};
