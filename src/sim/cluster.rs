//! Flood-fill cluster analysis
//!
//! Both passes use the tiles' `visited` flag as scratch space and skip tiles
//! that are empty or already marked removed.

use super::grid::{Cell, Grid};

/// Depth-first fill from `seed` without resetting `visited` first
///
/// With `color = Some(c)` only tiles of color `c` join the cluster.
fn flood(grid: &mut Grid, seed: Cell, color: Option<u8>) -> Vec<Cell> {
    let mut cluster = Vec::new();
    let seed_tile = grid.tile(seed);
    if !seed_tile.is_settled() || seed_tile.visited {
        return cluster;
    }
    if color.is_some() && seed_tile.color != color {
        return cluster;
    }

    let mut stack = vec![seed];
    grid.tile_mut(seed).visited = true;

    while let Some(current) = stack.pop() {
        cluster.push(current);
        for next in grid.neighbors(current) {
            let tile = grid.tile(next);
            if tile.visited || !tile.is_settled() {
                continue;
            }
            if color.is_some() && tile.color != color {
                continue;
            }
            grid.tile_mut(next).visited = true;
            stack.push(next);
        }
    }

    cluster
}

/// All tiles connected to `seed`
///
/// With `match_color` only same-colored tiles are followed; without it the
/// fill is color-agnostic. Returns an empty cluster for an empty seed.
pub fn find_cluster(grid: &mut Grid, seed: Cell, match_color: bool) -> Vec<Cell> {
    grid.reset_visited();
    let color = if match_color {
        match grid.tile(seed).color {
            Some(c) => Some(c),
            None => return Vec::new(),
        }
    } else {
        None
    };
    flood(grid, seed, color)
}

/// Islands of tiles with no path to the top row
///
/// First every tile reachable from row 0 is marked, then each remaining
/// settled tile seeds its own color-agnostic island.
pub fn find_floating_clusters(grid: &mut Grid) -> Vec<Vec<Cell>> {
    grid.reset_visited();

    for col in 0..grid.columns() {
        flood(grid, Cell::new(col, 0), None);
    }

    let mut islands = Vec::new();
    for row in 1..grid.rows() {
        for col in 0..grid.columns() {
            let island = flood(grid, Cell::new(col, row), None);
            if !island.is_empty() {
                islands.push(island);
            }
        }
    }
    islands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(cells: &[(usize, usize, u8)]) -> Grid {
        let mut grid = Grid::new(8, 10);
        for &(col, row, color) in cells {
            grid.set_color(Cell::new(col, row), color);
        }
        grid
    }

    #[test]
    fn test_same_color_cluster() {
        let mut grid = grid_with(&[(0, 0, 1), (1, 0, 1), (2, 0, 1), (3, 0, 2), (0, 1, 1)]);
        let mut cluster = find_cluster(&mut grid, Cell::new(1, 0), true);
        cluster.sort();
        assert_eq!(
            cluster,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0), Cell::new(2, 0)]
        );
    }

    #[test]
    fn test_color_agnostic_cluster() {
        let mut grid = grid_with(&[(0, 0, 1), (1, 0, 2), (2, 0, 3), (5, 0, 1)]);
        let cluster = find_cluster(&mut grid, Cell::new(0, 0), false);
        assert_eq!(cluster.len(), 3);
    }

    #[test]
    fn test_cluster_skips_removed() {
        let mut grid = grid_with(&[(0, 0, 1), (1, 0, 1), (2, 0, 1)]);
        grid.tile_mut(Cell::new(1, 0)).removed = true;
        let cluster = find_cluster(&mut grid, Cell::new(0, 0), true);
        assert_eq!(cluster, vec![Cell::new(0, 0)]);
    }

    #[test]
    fn test_empty_seed_gives_empty_cluster() {
        let mut grid = grid_with(&[(0, 0, 1)]);
        assert!(find_cluster(&mut grid, Cell::new(4, 4), true).is_empty());
        assert!(find_cluster(&mut grid, Cell::new(4, 4), false).is_empty());
    }

    #[test]
    fn test_floating_islands() {
        // Column 3 hangs from the ceiling; (6,4)-(7,4) float
        let mut grid = grid_with(&[
            (3, 0, 1),
            (3, 1, 2),
            (3, 2, 3),
            (6, 4, 1),
            (7, 4, 1),
            (0, 7, 4),
        ]);
        let mut islands = find_floating_clusters(&mut grid);
        for island in &mut islands {
            island.sort();
        }
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0], vec![Cell::new(6, 4), Cell::new(7, 4)]);
        assert_eq!(islands[1], vec![Cell::new(0, 7)]);
    }

    #[test]
    fn test_nothing_floats_when_all_supported() {
        let mut grid = grid_with(&[(0, 0, 1), (0, 1, 2), (1, 2, 3), (1, 3, 4)]);
        assert!(find_floating_clusters(&mut grid).is_empty());
    }
}
