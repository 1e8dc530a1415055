//! Uniform grid bucketing for radius queries.
//!
//! Cells are hashed into square buckets at least as wide as the interaction
//! radius, so any pair closer than the radius sits in the same or an
//! adjacent bucket. Each node scans its 3×3 block and keeps partners with a
//! higher index, which visits every candidate pair exactly once.

use hashbrown::HashMap;
use rayon::prelude::*;

use crate::model::CellNode;

/// Relative padding on the bucket width. Keeps a pair just under the radius
/// from landing two buckets apart after the floating-point division.
const CELL_PAD: f64 = 1e-6;

pub(crate) struct UniformGrid {
    cell_size: f64,
    buckets: HashMap<(i64, i64), Vec<u32>>,
}

impl UniformGrid {
    pub(crate) fn new(cells: &[CellNode], radius: f64) -> Self {
        let mut grid = Self {
            cell_size: radius * (1.0 + CELL_PAD),
            buckets: HashMap::new(),
        };
        for (i, cell) in cells.iter().enumerate() {
            let key = grid.key(cell);
            grid.buckets.entry(key).or_default().push(i as u32);
        }
        grid
    }

    /// Bucket of a cell. The `as` cast saturates, so every cell beyond the
    /// `i64` range shares the edge bucket.
    fn key(&self, cell: &CellNode) -> (i64, i64) {
        (
            (cell.x / self.cell_size).floor() as i64,
            (cell.y / self.cell_size).floor() as i64,
        )
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// All index pairs `(i, j)`, `i < j`, strictly closer than `radius`.
    pub(crate) fn pairs_within(&self, cells: &[CellNode], radius: f64) -> Vec<(u32, u32)> {
        (0..cells.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let (cx, cy) = self.key(&cells[i]);
                let mut local = Vec::new();
                for dx in -1..=1i64 {
                    for dy in -1..=1i64 {
                        // Keys saturate for huge coordinates; an offset past
                        // the edge names no bucket, so it must not alias one.
                        let (Some(bx), Some(by)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                            continue;
                        };
                        let Some(bucket) = self.buckets.get(&(bx, by)) else {
                            continue;
                        };
                        for &j in bucket {
                            if (j as usize) > i && super::within(&cells[i], &cells[j as usize], radius) {
                                local.push((i as u32, j));
                            }
                        }
                    }
                }
                local.sort_unstable();
                local
            })
            .collect()
    }
}
