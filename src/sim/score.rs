//! Score accumulation

use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid};
use crate::consts::POINTS_PER_TILE;

/// Monotonic score counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreModel {
    total: u64,
}

impl ScoreModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Credit `count` removed tiles; returns the points added
    pub fn award_tiles(&mut self, count: usize) -> u64 {
        let points = count as u64 * POINTS_PER_TILE;
        self.total = self.total.saturating_add(points);
        points
    }

    pub fn reset(&mut self) {
        self.total = 0;
    }
}

/// Flag `cells` as removed and credit each one that wasn't already
///
/// This is the only place tiles become `removed`, so a tile is scored once
/// no matter how many passes see it.
pub fn mark_removed(grid: &mut Grid, score: &mut ScoreModel, cells: &[Cell]) -> usize {
    let mut newly = 0;
    for &cell in cells {
        let tile = grid.tile_mut(cell);
        if tile.color.is_some() && !tile.removed {
            tile.removed = true;
            newly += 1;
        }
    }
    score.award_tiles(newly);
    newly
}
