//! Column splitting of wide field boxes
//!
//! A field-level candidate often spans several whitespace separated tokens.
//! The column projection of its ink finds the gaps, and the box is cut at the
//! middle of every gap.

use image::GrayImage;

use crate::types::{DetectError, Result, TextBox, BACKGROUND};

/// Splits wide boxes at background column runs
pub struct ColumnSplitter<'a> {
    /// Binarized, lightly eroded image (ink = 0)
    binary: &'a GrayImage,
    /// Boxes this wide or narrower are left alone
    min_width: u32,
}

impl<'a> ColumnSplitter<'a> {
    pub fn new(binary: &'a GrayImage, min_width: u32) -> Self {
        Self { binary, min_width }
    }

    /// Split one box into per-token boxes.
    ///
    /// Returns the box unchanged when it is not wider than `min_width` or
    /// contains no ink.
    pub fn split(&self, b: &TextBox) -> Result<Vec<TextBox>> {
        if b.width() <= self.min_width {
            return Ok(vec![*b]);
        }

        let projection = column_projection(self.binary, b);
        let segments = ink_segments(&projection)?;
        if segments.is_empty() {
            return Ok(vec![*b]);
        }

        let crop_width = projection.len() as u32;
        let mut cuts = vec![0u32];
        for pair in segments.windows(2) {
            let gap_start = pair[0].1;
            let gap_end = pair[1].0;
            cuts.push((gap_start + gap_end) / 2);
        }
        cuts.push(crop_width);

        Ok(cuts
            .windows(2)
            .filter_map(|w| {
                if w[1] <= w[0] {
                    return None;
                }
                TextBox::new(b.x1 + w[0], b.y1, b.x1 + w[1] - 1, b.y2)
            })
            .collect())
    }

    /// Split every box, keeping a box whole when its projection is inconsistent
    pub fn split_all(&self, boxes: &[TextBox]) -> Vec<TextBox> {
        boxes
            .iter()
            .flat_map(|b| match self.split(b) {
                Ok(parts) => parts,
                Err(e) => {
                    tracing::warn!(?b, error = %e, "column split failed, keeping box whole");
                    vec![*b]
                }
            })
            .collect()
    }
}

/// Mean intensity of every column of the box region (inclusive bounds)
pub fn column_projection(binary: &GrayImage, b: &TextBox) -> Vec<f32> {
    let x2 = b.x2.min(binary.width().saturating_sub(1));
    let y2 = b.y2.min(binary.height().saturating_sub(1));
    if b.x1 > x2 || b.y1 > y2 {
        return Vec::new();
    }
    let rows = (y2 - b.y1 + 1) as f32;
    (b.x1..=x2)
        .map(|x| {
            let sum: u32 = (b.y1..=y2).map(|y| binary.get_pixel(x, y)[0] as u32).sum();
            sum as f32 / rows
        })
        .collect()
}

/// Half-open column ranges holding ink, from a column projection.
///
/// Boundaries are the crop start, every toggle between background and ink
/// columns, and the crop end. They must pair up; an odd count means the ink
/// touches exactly one crop edge and the box cannot be split.
pub fn ink_segments(projection: &[f32]) -> Result<Vec<(u32, u32)>> {
    let is_ink = |mean: f32| mean < BACKGROUND as f32;
    let Some(&first) = projection.first() else {
        return Ok(Vec::new());
    };

    let mut boundaries = vec![0u32];
    let mut in_ink = is_ink(first);
    for (i, &mean) in projection.iter().enumerate().skip(1) {
        if is_ink(mean) != in_ink {
            boundaries.push(i as u32);
            in_ink = !in_ink;
        }
    }
    boundaries.push(projection.len() as u32);

    if boundaries.len() % 2 != 0 {
        return Err(DetectError::ProjectionInvariant { boundaries });
    }

    // Runs alternate starting with the state of the first column
    let first_ink = is_ink(first);
    Ok(boundaries
        .windows(2)
        .enumerate()
        .filter(|(run, _)| (run % 2 == 0) == first_ink)
        .map(|(_, w)| (w[0], w[1]))
        .collect())
}
