use glam::DVec2;
use std::collections::HashMap;

#[inline(always)]
fn to_cell(p: DVec2, cell_size: f64) -> (i32, i32) {
    ((p.x / cell_size).floor() as i32, (p.y / cell_size).floor() as i32)
}

/// Spatial hash grid over point anchors in scene coordinates.
/// Stores indices into the caller's point list.
#[derive(Debug, Clone, Default)]
pub struct PointGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl PointGrid {
    pub fn build(points: impl Iterator<Item = DVec2>, cell_size: f64) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (idx, p) in points.enumerate() {
            if p.is_finite() {
                cells.entry(to_cell(p, cell_size)).or_default().push(idx);
            }
        }
        Self { cells, cell_size }
    }

    /// Indices whose cell intersects the square of half-width `radius`
    /// around `center`. May contain false positives, never false negatives.
    pub fn query_radius(&self, center: DVec2, radius: f64) -> Vec<usize> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        let min = to_cell(center - DVec2::splat(radius), self.cell_size);
        let max = to_cell(center + DVec2::splat(radius), self.cell_size);

        let mut results = Vec::new();
        for y in min.1..=max.1 {
            for x in min.0..=max.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }
}

/// Spatial index of feature bounding boxes.
/// Each feature is inserted into every cell its bbox overlaps, so a point
/// query returns a superset of the features containing it.
#[derive(Debug, Clone, Default)]
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn build(bboxes: impl Iterator<Item = Option<(DVec2, DVec2)>>, cell_size: f64) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (idx, bbox) in bboxes.enumerate() {
            let Some((min, max)) = bbox.filter(|(min, max)| min.is_finite() && max.is_finite()) else {
                continue;
            };
            let min_cell = to_cell(min, cell_size);
            let max_cell = to_cell(max, cell_size);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        Self { cells, cell_size }
    }

    /// Candidate features at a point, in insertion order
    pub fn query_point(&self, p: DVec2) -> &[usize] {
        if self.cells.is_empty() {
            return &[];
        }
        self.cells
            .get(&to_cell(p, self.cell_size))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
