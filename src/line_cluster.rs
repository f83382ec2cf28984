//! Text line clustering and in-line box merging
//!
//! Candidate boxes are grouped into horizontal bands by projecting their
//! vertical spans onto the row axis. Within each band, horizontally
//! overlapping boxes are merged so every band yields a clean left-to-right
//! sequence.

use crate::types::{Band, TextBox};

/// Drop boxes much smaller than the typical glyph box.
///
/// A box survives when both its width and height reach `1 / divisor` of the
/// mean width and height over all candidates.
pub fn filter_by_size(boxes: &[TextBox], divisor: f64) -> Vec<TextBox> {
    if boxes.is_empty() {
        return Vec::new();
    }
    let count = boxes.len() as f64;
    let mean_w = boxes.iter().map(|b| b.width() as f64).sum::<f64>() / count;
    let mean_h = boxes.iter().map(|b| b.height() as f64).sum::<f64>() / count;

    boxes
        .iter()
        .filter(|b| b.width() as f64 >= mean_w / divisor && b.height() as f64 >= mean_h / divisor)
        .copied()
        .collect()
}

/// Rows covered by at least one box's `[y1, y2)` span
pub fn occupancy_mask(boxes: &[TextBox], height: u32) -> Vec<bool> {
    let mut mask = vec![false; height as usize];
    for b in boxes {
        let end = b.y2.min(height) as usize;
        for row in &mut mask[(b.y1 as usize).min(end)..end] {
            *row = true;
        }
    }
    mask
}

/// Split the occupancy mask into bands of consecutive occupied rows.
///
/// The scan starts outside any band, so a mask occupied at row 0 opens a band
/// at row 0, and a band still open at the last row is closed at the mask end.
pub fn find_bands(mask: &[bool]) -> Vec<Band> {
    let mut boundaries = Vec::new();
    let mut inside = false;
    for (row, &occupied) in mask.iter().enumerate() {
        if occupied != inside {
            boundaries.push(row as u32);
            inside = occupied;
        }
    }
    if inside {
        boundaries.push(mask.len() as u32);
    }

    boundaries
        .chunks_exact(2)
        .map(|pair| Band::new(pair[0], pair[1]))
        .collect()
}

/// Boxes belonging to `band`, stretched to the band's rows and sorted by `x1`
pub fn band_members(band: &Band, boxes: &[TextBox], tolerance: u32, height: u32) -> Vec<TextBox> {
    let y2 = band.end.min(height.saturating_sub(1));
    let mut members: Vec<TextBox> = boxes
        .iter()
        .filter(|b| band.contains(b, tolerance))
        .filter_map(|b| TextBox::new(b.x1, band.start, b.x2, y2))
        .collect();
    members.sort_by_key(|b| b.x1);
    members
}

/// One left-to-right merge pass over boxes sorted by `x1`.
///
/// A box that does not reach the next one is kept; otherwise the pair is
/// replaced by their horizontal union and the scan skips past both.
fn merge_pass(sorted: &[TextBox]) -> (Vec<TextBox>, bool) {
    let mut out = Vec::with_capacity(sorted.len());
    let mut merged = false;
    let mut i = 0;
    while i + 1 < sorted.len() {
        let cur = sorted[i];
        let next = sorted[i + 1];
        if cur.x2 <= next.x1 {
            out.push(cur);
            i += 1;
        } else {
            let x1 = cur.x1.min(cur.x2).min(next.x1).min(next.x2);
            let x2 = cur.x1.max(cur.x2).max(next.x1).max(next.x2);
            out.push(TextBox { x1, x2, ..cur });
            merged = true;
            i += 2;
        }
    }
    if i + 1 == sorted.len() {
        out.push(sorted[i]);
    }
    (out, merged)
}

/// Merge overlapping boxes of one band until no two outputs overlap
pub fn merge_band(sorted: &[TextBox]) -> Vec<TextBox> {
    let (mut boxes, mut merged) = merge_pass(sorted);
    while merged {
        boxes.sort_by_key(|b| b.x1);
        (boxes, merged) = merge_pass(&boxes);
    }
    debug_assert!(boxes
        .windows(2)
        .all(|pair| !pair[0].overlaps_horizontally(&pair[1])));
    boxes
}

/// Group boxes into text lines and merge them, top band first
pub fn cluster_lines(boxes: &[TextBox], height: u32, tolerance: u32) -> Vec<TextBox> {
    let mask = occupancy_mask(boxes, height);
    let bands = find_bands(&mask);
    tracing::debug!(bands = bands.len(), "found text line bands");

    bands
        .iter()
        .flat_map(|band| merge_band(&band_members(band, boxes, tolerance, height)))
        .collect()
}
