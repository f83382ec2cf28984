//! Photo region exclusion
//!
//! The target ID layout prints the holder's photograph in the upper right
//! corner. Field boxes centered there are portrait texture, not text.

use crate::types::TextBox;

/// Fixed-layout filter dropping boxes centered on the photograph area
#[derive(Debug, Clone, Copy)]
pub struct NoiseFilter {
    width: u32,
    height: u32,
    x_ratio: f64,
    y_ratio: f64,
}

impl NoiseFilter {
    pub fn new(width: u32, height: u32, x_ratio: f64, y_ratio: f64) -> Self {
        Self {
            width,
            height,
            x_ratio,
            y_ratio,
        }
    }

    /// Check whether a box's center falls inside the photograph area
    pub fn is_noise(&self, b: &TextBox) -> bool {
        let (cx, cy) = b.center();
        cx > self.x_ratio * self.width as f64 && cy < self.y_ratio * self.height as f64
    }

    /// Keep only boxes outside the photograph area
    pub fn apply(&self, boxes: &[TextBox]) -> Vec<TextBox> {
        boxes.iter().filter(|b| !self.is_noise(b)).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered(cx: u32, cy: u32) -> TextBox {
        TextBox::new(cx - 20, cy - 10, cx + 20, cy + 10).unwrap()
    }

    #[test]
    fn test_photo_box_removed() {
        let filter = NoiseFilter::new(1000, 2000, 0.65, 0.7);
        let photo = centered(800, 600);
        let text = centered(300, 600);
        assert_eq!(filter.apply(&[photo, text]), vec![text]);
    }

    #[test]
    fn test_lower_right_kept() {
        let filter = NoiseFilter::new(1000, 2000, 0.65, 0.7);
        let b = centered(800, 1600);
        assert!(!filter.is_noise(&b));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let filter = NoiseFilter::new(1000, 2000, 0.65, 0.7);
        let boxes = vec![centered(800, 600), centered(300, 600), centered(700, 1500), centered(660, 100)];
        let once = filter.apply(&boxes);
        let twice = filter.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }
}
