//! Core types for text region localization
//!
//! Contains the box and band value types shared by every pipeline stage,
//! along with the crate error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Canonical image height all empirical thresholds are calibrated for
pub const CANONICAL_HEIGHT: u32 = 1920;

/// Intensity value of pure background after binarization
pub const BACKGROUND: u8 = 255;

/// Intensity value of ink after binarization
pub const INK: u8 = 0;

// ============================================================
// Error Types
// ============================================================

/// Text detection error types
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Image has zero dimension: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Projection scan produced an odd number of segment boundaries: {boundaries:?}")]
    ProjectionInvariant { boundaries: Vec<u32> },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;

// ============================================================
// Core Data Structures
// ============================================================

/// Axis-aligned text box in normalized image coordinates.
///
/// Coordinates are inclusive pixel indices: `x2` is the last column the box
/// covers. A valid box always has `x1 < x2` and `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl TextBox {
    /// Create a box, returning `None` when it would be empty
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        (x1 < x2 && y1 < y2).then_some(Self { x1, y1, x2, y2 })
    }

    /// Create a box from an origin and a size in pixels
    pub fn from_rect(x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    /// Horizontal extent (`x2 - x1`)
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    /// Vertical extent (`y2 - y1`)
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Center point as floating point coordinates
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }

    /// Check whether the box lies entirely inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x2 < width && self.y2 < height
    }

    /// Check whether two boxes share any column
    pub fn overlaps_horizontally(&self, other: &TextBox) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2
    }

    /// Map this box back to the original image space.
    ///
    /// `scale` is `original_height / canonical_height` as reported by the
    /// normalizer, so normalized coordinates are multiplied by it. The result
    /// is clamped to `width` x `height`.
    pub fn rescale(&self, scale: f64, width: u32, height: u32) -> TextBox {
        let map = |v: u32, limit: u32| -> u32 {
            let scaled = (v as f64 * scale).round() as u32;
            scaled.min(limit.saturating_sub(1))
        };
        TextBox {
            x1: map(self.x1, width),
            y1: map(self.y1, height),
            x2: map(self.x2, width),
            y2: map(self.y2, height),
        }
    }
}

/// Half-open vertical interval `[start, end)` covering one text line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start: u32,
    pub end: u32,
}

impl Band {
    /// Create a new band
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check whether a box vertically belongs to this band within `tolerance` rows
    pub fn contains(&self, b: &TextBox, tolerance: u32) -> bool {
        let lower = self.start as i64 - tolerance as i64;
        let upper = self.end as i64 + tolerance as i64;
        (b.y1 as i64) > lower && (b.y2 as i64) < upper
    }
}

/// Candidate generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateStrategy {
    /// MSER regions refined and clustered into text lines
    #[default]
    RegionGrowing,
    /// Fixed threshold + erosion, split into columns, photo area excluded
    MorphologicalThreshold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_box_rejects_empty() {
        assert!(TextBox::new(10, 10, 10, 20).is_none());
        assert!(TextBox::new(10, 20, 30, 20).is_none());
        assert!(TextBox::new(30, 10, 10, 20).is_none());
        assert!(TextBox::new(10, 10, 11, 11).is_some());
    }

    #[test]
    fn test_text_box_from_rect() {
        let b = TextBox::from_rect(5, 6, 10, 20).unwrap();
        assert_eq!(b, TextBox { x1: 5, y1: 6, x2: 14, y2: 25 });
        assert!(TextBox::from_rect(5, 6, 0, 20).is_none());
        assert!(TextBox::from_rect(5, 6, 1, 20).is_none());
    }

    #[test]
    fn test_text_box_center_and_size() {
        let b = TextBox::new(10, 20, 30, 60).unwrap();
        assert_eq!(b.width(), 20);
        assert_eq!(b.height(), 40);
        assert_eq!(b.center(), (20.0, 40.0));
    }

    #[test]
    fn test_text_box_horizontal_overlap() {
        let a = TextBox::new(0, 0, 50, 10).unwrap();
        let b = TextBox::new(40, 0, 90, 10).unwrap();
        let c = TextBox::new(50, 0, 90, 10).unwrap();
        assert!(a.overlaps_horizontally(&b));
        assert!(!a.overlaps_horizontally(&c));
    }

    #[test]
    fn test_text_box_rescale_clamps() {
        let b = TextBox::new(100, 200, 1000, 1919).unwrap();
        let r = b.rescale(0.5, 400, 960);
        assert_eq!(r, TextBox { x1: 50, y1: 100, x2: 399, y2: 959 });
    }

    #[test]
    fn test_band_contains_with_tolerance() {
        let band = Band::new(100, 150);
        let inside = TextBox::new(0, 97, 10, 153).unwrap();
        let above = TextBox::new(0, 95, 10, 140).unwrap();
        let below = TextBox::new(0, 110, 10, 155).unwrap();
        assert!(band.contains(&inside, 5));
        assert!(!band.contains(&above, 5));
        assert!(!band.contains(&below, 5));
    }

    #[test]
    fn test_band_contains_near_row_zero() {
        let band = Band::new(0, 40);
        let b = TextBox::new(0, 0, 10, 39).unwrap();
        assert!(band.contains(&b, 5));
    }

    #[test]
    fn test_strategy_serde_names() {
        let s: CandidateStrategy = serde_json::from_str("\"morphological-threshold\"").unwrap();
        assert_eq!(s, CandidateStrategy::MorphologicalThreshold);
        assert_eq!(CandidateStrategy::default(), CandidateStrategy::RegionGrowing);
    }
}
