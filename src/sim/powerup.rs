//! Power-up bubbles and the player's charge inventory

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid, choose_existing_color};

/// Special projectile types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Clears every occupied neighbor of the landing cell
    AreaClear,
    /// Takes the most common neighbor color, then matches normally
    ColorConvert,
}

/// Remaining charges per power-up (never negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerupInventory {
    pub area_clear: u32,
    pub color_convert: u32,
}

impl PowerupInventory {
    pub fn new(area_clear: u32, color_convert: u32) -> Self {
        Self {
            area_clear,
            color_convert,
        }
    }

    pub fn charges(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::AreaClear => self.area_clear,
            PowerupKind::ColorConvert => self.color_convert,
        }
    }

    /// Spend one charge. Returns false (and changes nothing) when empty.
    pub fn try_consume(&mut self, kind: PowerupKind) -> bool {
        let slot = match kind {
            PowerupKind::AreaClear => &mut self.area_clear,
            PowerupKind::ColorConvert => &mut self.color_convert,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

/// Occupied one-hop neighbors of `cell`, regardless of color
pub fn area_clear_cluster(grid: &Grid, cell: Cell) -> Vec<Cell> {
    grid.neighbors(cell)
        .into_iter()
        .filter(|&n| grid.tile(n).is_settled())
        .collect()
}

/// Most frequent color among the occupied neighbors of `cell`
///
/// Ties go to the color met first in neighbor order. With no occupied
/// neighbor, falls back to the board's color policy.
pub fn convert_color(grid: &Grid, cell: Cell, rng: &mut impl Rng, color_count: u8) -> u8 {
    // (color, count) in first-encounter order
    let mut tally: Vec<(u8, u32)> = Vec::with_capacity(6);
    for n in grid.neighbors(cell) {
        let tile = grid.tile(n);
        if !tile.is_settled() {
            continue;
        }
        let Some(color) = tile.color else { continue };
        match tally.iter_mut().find(|(c, _)| *c == color) {
            Some((_, count)) => *count += 1,
            None => tally.push((color, 1)),
        }
    }

    let mut best: Option<(u8, u32)> = None;
    for &(color, count) in &tally {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((color, count));
        }
    }

    match best {
        Some((color, _)) => color,
        None => choose_existing_color(grid, rng, color_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_inventory_never_negative() {
        let mut inv = PowerupInventory::new(1, 0);
        assert!(inv.try_consume(PowerupKind::AreaClear));
        assert!(!inv.try_consume(PowerupKind::AreaClear));
        assert!(!inv.try_consume(PowerupKind::ColorConvert));
        assert_eq!(inv, PowerupInventory::new(0, 0));
    }

    #[test]
    fn test_area_clear_takes_occupied_neighbors_only() {
        let mut grid = Grid::new(8, 8);
        let center = Cell::new(3, 4);
        for (i, n) in grid.neighbors(center).into_iter().enumerate().take(4) {
            grid.set_color(n, i as u8);
        }
        grid.set_color(Cell::new(7, 7), 1);
        assert_eq!(area_clear_cluster(&grid, center).len(), 4);
    }

    #[test]
    fn test_convert_majority_vote() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut grid = Grid::new(8, 8);
        let center = Cell::new(3, 4);
        let n = grid.neighbors(center);
        grid.set_color(n[0], 5);
        grid.set_color(n[1], 2);
        grid.set_color(n[2], 2);
        assert_eq!(convert_color(&grid, center, &mut rng, 7), 2);
    }

    #[test]
    fn test_convert_tie_goes_to_first_seen() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut grid = Grid::new(8, 8);
        let center = Cell::new(3, 4);
        let n = grid.neighbors(center);
        grid.set_color(n[0], 4);
        grid.set_color(n[1], 1);
        grid.set_color(n[2], 1);
        grid.set_color(n[3], 4);
        assert_eq!(convert_color(&grid, center, &mut rng, 7), 4);
    }

    #[test]
    fn test_convert_fallback_uses_board_colors() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut grid = Grid::new(8, 8);
        grid.set_color(Cell::new(0, 0), 6);
        for _ in 0..10 {
            assert_eq!(convert_color(&grid, Cell::new(5, 6), &mut rng, 7), 6);
        }
    }
}
