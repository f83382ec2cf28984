//! Maximally stable extremal region extraction
//!
//! Builds the component tree of a grayscale image with union-find, flooding
//! pixels from dark to bright, then keeps the components whose area changes
//! least over `delta` grey levels. Only region bounding rectangles are kept;
//! the pipeline never needs the pixel lists.

use image::GrayImage;

use crate::config::MserOptions;

const NONE: u32 = u32::MAX;

/// A stable region found by [`MserDetector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MserRegion {
    /// Inclusive bounds of the region's pixels
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    /// Pixel count
    pub area: u32,
    /// Grey level at which the region was sampled
    pub level: u8,
}

/// Component at one grey level of the flooding
#[derive(Debug, Clone, Copy)]
struct Node {
    level: u8,
    area: u32,
    bounds: [u32; 4],
    parent: u32,
}

/// MSER detector over 8-bit grayscale images
#[derive(Debug, Clone, Default)]
pub struct MserDetector {
    options: MserOptions,
}

impl MserDetector {
    pub fn new(options: MserOptions) -> Self {
        Self { options }
    }

    /// Find stable regions: dark-on-bright, then bright-on-dark when enabled
    pub fn detect(&self, gray: &GrayImage) -> Vec<MserRegion> {
        let mut regions = self.detect_pass(gray, false);
        if self.options.both_polarities {
            regions.extend(self.detect_pass(gray, true));
        }
        regions
    }

    fn detect_pass(&self, gray: &GrayImage, inverted: bool) -> Vec<MserRegion> {
        let nodes = build_component_tree(gray, inverted);
        select_stable(&nodes, &self.options)
    }
}

/// Union-find forest over pixel indices; inactive pixels have parent `NONE`
struct Forest {
    parent: Vec<u32>,
    rank: Vec<u8>,
    area: Vec<u32>,
    bounds: Vec<[u32; 4]>,
}

impl Forest {
    fn new(len: usize) -> Self {
        Self {
            parent: vec![NONE; len],
            rank: vec![0; len],
            area: vec![0; len],
            bounds: vec![[0; 4]; len],
        }
    }

    fn activate(&mut self, p: u32, x: u32, y: u32) {
        let i = p as usize;
        self.parent[i] = p;
        self.area[i] = 1;
        self.bounds[i] = [x, y, x, y];
    }

    fn is_active(&self, p: u32) -> bool {
        self.parent[p as usize] != NONE
    }

    fn find(&mut self, mut p: u32) -> u32 {
        while self.parent[p as usize] != p {
            let grand = self.parent[self.parent[p as usize] as usize];
            self.parent[p as usize] = grand;
            p = grand;
        }
        p
    }

    /// Join two roots, returning the surviving root
    fn union(&mut self, a: u32, b: u32) -> u32 {
        let (ai, bi) = (a as usize, b as usize);
        let (root, child) = if self.rank[ai] >= self.rank[bi] {
            (a, b)
        } else {
            (b, a)
        };
        let (ri, ci) = (root as usize, child as usize);
        if self.rank[ai] == self.rank[bi] {
            self.rank[ri] += 1;
        }
        self.parent[ci] = root;
        self.area[ri] += self.area[ci];
        let cb = self.bounds[ci];
        let rb = &mut self.bounds[ri];
        rb[0] = rb[0].min(cb[0]);
        rb[1] = rb[1].min(cb[1]);
        rb[2] = rb[2].max(cb[2]);
        rb[3] = rb[3].max(cb[3]);
        root
    }
}

/// Flood the image level by level and record one node per component change.
///
/// Nodes are appended in increasing level order, so a parent always has a
/// larger index and a strictly higher level than its children.
fn build_component_tree(gray: &GrayImage, inverted: bool) -> Vec<Node> {
    let (w, h) = gray.dimensions();
    let raw = gray.as_raw();
    let level_of = |i: usize| if inverted { 255 - raw[i] } else { raw[i] };

    // Counting sort of pixel indices by level
    let mut starts = [0usize; 257];
    for i in 0..raw.len() {
        starts[level_of(i) as usize + 1] += 1;
    }
    for l in 1..257 {
        starts[l] += starts[l - 1];
    }
    let mut fill = starts;
    let mut order = vec![0u32; raw.len()];
    for i in 0..raw.len() {
        let l = level_of(i) as usize;
        order[fill[l]] = i as u32;
        fill[l] += 1;
    }

    let mut forest = Forest::new(raw.len());
    let mut last_node = vec![NONE; raw.len()];
    let mut stamp = vec![0u16; raw.len()];
    let mut nodes: Vec<Node> = Vec::new();
    let mut links: Vec<(u32, u32)> = Vec::new();
    let mut touched: Vec<u32> = Vec::new();

    for level in 0..=255u8 {
        let pixels = &order[starts[level as usize]..starts[level as usize + 1]];
        if pixels.is_empty() {
            continue;
        }
        links.clear();
        touched.clear();

        for &p in pixels {
            let (x, y) = (p % w, p / w);
            forest.activate(p, x, y);

            let mut neighbors = [NONE; 4];
            if x > 0 {
                neighbors[0] = p - 1;
            }
            if x + 1 < w {
                neighbors[1] = p + 1;
            }
            if y > 0 {
                neighbors[2] = p - w;
            }
            if y + 1 < h {
                neighbors[3] = p + w;
            }

            for q in neighbors {
                if q == NONE || !forest.is_active(q) {
                    continue;
                }
                let a = forest.find(p);
                let b = forest.find(q);
                if a == b {
                    continue;
                }
                // Components finalized at earlier levels become children of
                // whatever node this component forms at the current level.
                for r in [a, b] {
                    let n = last_node[r as usize];
                    if n != NONE {
                        links.push((n, r));
                        last_node[r as usize] = NONE;
                    }
                }
                forest.union(a, b);
            }
        }

        let mark = level as u16 + 1;
        for &p in pixels {
            let r = forest.find(p);
            if stamp[r as usize] != mark {
                stamp[r as usize] = mark;
                touched.push(r);
            }
        }

        for &r in &touched {
            last_node[r as usize] = nodes.len() as u32;
            nodes.push(Node {
                level,
                area: forest.area[r as usize],
                bounds: forest.bounds[r as usize],
                parent: NONE,
            });
        }

        for &(child, r) in &links {
            let root = forest.find(r);
            nodes[child as usize].parent = last_node[root as usize];
        }
    }

    nodes
}

/// Relative area growth of each node over the next `delta` levels
fn variations(nodes: &[Node], delta: u8) -> Vec<f32> {
    nodes
        .iter()
        .map(|node| {
            let limit = node.level as u16 + delta as u16;
            let mut ancestor = node;
            while ancestor.parent != NONE {
                let parent = &nodes[ancestor.parent as usize];
                if parent.level as u16 > limit {
                    break;
                }
                ancestor = parent;
            }
            (ancestor.area - node.area) as f32 / node.area as f32
        })
        .collect()
}

fn select_stable(nodes: &[Node], options: &MserOptions) -> Vec<MserRegion> {
    let var = variations(nodes, options.delta);

    let mut min_child_var = vec![f32::INFINITY; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        if node.parent != NONE {
            let p = node.parent as usize;
            min_child_var[p] = min_child_var[p].min(var[i]);
        }
    }

    nodes
        .iter()
        .enumerate()
        .filter(|(i, node)| {
            let v = var[*i];
            let parent_var = if node.parent == NONE {
                f32::INFINITY
            } else {
                var[node.parent as usize]
            };
            node.area >= options.min_area
                && node.area <= options.max_area
                && v <= options.max_variation
                && v <= parent_var
                && v <= min_child_var[*i]
        })
        .map(|(_, node)| MserRegion {
            x_min: node.bounds[0],
            y_min: node.bounds[1],
            x_max: node.bounds[2],
            y_max: node.bounds[3],
            area: node.area,
            level: node.level,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn white_with_blocks(w: u32, h: u32, blocks: &[(u32, u32, u32, u32, u8)]) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        for &(x0, y0, bw, bh, v) in blocks {
            for y in y0..y0 + bh {
                for x in x0..x0 + bw {
                    img.put_pixel(x, y, Luma([v]));
                }
            }
        }
        img
    }

    #[test]
    fn test_single_dark_block_is_stable() {
        let img = white_with_blocks(200, 200, &[(20, 30, 15, 10, 0)]);
        let regions = MserDetector::default().detect(&img);
        assert_eq!(regions.len(), 1);
        let r = regions[0];
        assert_eq!((r.x_min, r.y_min, r.x_max, r.y_max), (20, 30, 34, 39));
        assert_eq!(r.area, 150);
        assert_eq!(r.level, 0);
    }

    #[test]
    fn test_blocks_below_min_area_ignored() {
        let img = white_with_blocks(200, 200, &[(20, 30, 5, 5, 0), (60, 60, 10, 10, 0)]);
        let regions = MserDetector::default().detect(&img);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 100);
    }

    #[test]
    fn test_bright_region_on_dark_background() {
        let mut img = GrayImage::from_pixel(200, 200, Luma([0]));
        for y in 10..20 {
            for x in 10..30 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let dark_only = MserDetector::new(MserOptions {
            both_polarities: false,
            ..Default::default()
        });
        assert!(dark_only.detect(&img).is_empty());

        let regions = MserDetector::default().detect(&img);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 200);
    }

    #[test]
    fn test_gradient_region_is_unstable() {
        // A ramp grows by a full column every level, so its variation is large
        let img = GrayImage::from_fn(120, 20, |x, _| Luma([(x * 2).min(255) as u8]));
        let options = MserOptions {
            both_polarities: false,
            max_area: 100_000,
            ..Default::default()
        };
        let regions = MserDetector::new(options).detect(&img);
        assert!(regions.iter().all(|r| r.area == 120 * 20));
    }

    #[test]
    fn test_component_tree_parent_levels_increase() {
        let img = white_with_blocks(40, 40, &[(5, 5, 10, 10, 0), (8, 8, 4, 4, 0), (20, 20, 10, 10, 80)]);
        let nodes = build_component_tree(&img, false);
        for node in &nodes {
            if node.parent != NONE {
                let parent = &nodes[node.parent as usize];
                assert!(parent.level > node.level);
                assert!(parent.area >= node.area);
            }
        }
        let roots = nodes.iter().filter(|n| n.parent == NONE).count();
        assert_eq!(roots, 1);
        assert_eq!(nodes.last().unwrap().area, 1600);
    }
}
