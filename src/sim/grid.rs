//! Tile grid with offset-hexagonal adjacency
//!
//! Tiles live in a plain rectangular array. Every other row is pushed right by
//! half a tile, so each tile touches six others. Which six depends on the row's
//! parity, `(row + row_offset) % 2`, and `row_offset` flips whenever a row is
//! pushed in from the top so existing tiles keep their neighbors.

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Neighbor offsets `(dcol, drow)` indexed by row parity.
/// Parity 0 rows sit flush left, parity 1 rows are shifted right half a tile.
const NEIGHBOR_OFFSETS: [[(isize, isize); 6]; 2] = [
    [(1, 0), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1)],
    [(1, 0), (1, 1), (0, 1), (-1, 0), (0, -1), (1, -1)],
];

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: usize,
    pub row: usize,
}

impl Cell {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// A single grid slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub column: usize,
    pub row: usize,
    /// Palette index, `None` when empty
    pub color: Option<u8>,
    /// Marked for removal (fading or falling); color stays set until the animation ends
    pub removed: bool,
    /// Downward pixel offset while falling
    pub vertical_shift: f32,
    /// Current fall speed (pixels/s)
    pub fall_velocity: f32,
    /// Opacity 0-1
    pub alpha: f32,
    /// Scratch flag for flood fills
    pub visited: bool,
}

impl Tile {
    fn empty(column: usize, row: usize) -> Self {
        Self {
            column,
            row,
            color: None,
            removed: false,
            vertical_shift: 0.0,
            fall_velocity: 0.0,
            alpha: 1.0,
            visited: false,
        }
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.color.is_some()
    }

    /// Occupied and not on its way out
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.color.is_some() && !self.removed
    }

    /// Back to EMPTY with animation state reset
    pub fn clear(&mut self) {
        self.color = None;
        self.removed = false;
        self.vertical_shift = 0.0;
        self.fall_velocity = 0.0;
        self.alpha = 1.0;
    }

    /// Copy every mutable field from `other`, keeping this tile's coordinates
    fn copy_contents(&mut self, other: &Tile) {
        self.color = other.color;
        self.removed = other.removed;
        self.vertical_shift = other.vertical_shift;
        self.fall_velocity = other.fall_velocity;
        self.alpha = other.alpha;
        self.visited = other.visited;
    }
}

/// Returned when a row cannot be pushed in because the bottom row is occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOverflow;

impl fmt::Display for GridOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bottom row is occupied, cannot inject a new row")
    }
}

impl std::error::Error for GridOverflow {}

/// The tile matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    columns: usize,
    rows: usize,
    row_offset: usize,
    /// Row-major storage
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(columns: usize, rows: usize) -> Self {
        let mut tiles = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for col in 0..columns {
                tiles.push(Tile::empty(col, row));
            }
        }
        Self {
            columns,
            rows,
            row_offset: 0,
            tiles,
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// 1 when the row is shifted right by half a tile
    #[inline]
    pub fn parity(&self, row: usize) -> usize {
        (row + self.row_offset) % 2
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        cell.row * self.columns + cell.col
    }

    /// Bounds-checked conversion from signed coordinates
    pub fn cell_at(&self, col: isize, row: isize) -> Option<Cell> {
        if col < 0 || row < 0 || col as usize >= self.columns || row as usize >= self.rows {
            None
        } else {
            Some(Cell::new(col as usize, row as usize))
        }
    }

    /// Tile at `cell`. Panics if out of bounds; callers pass cells produced by the grid.
    #[inline]
    pub fn tile(&self, cell: Cell) -> &Tile {
        &self.tiles[self.index(cell)]
    }

    #[inline]
    pub fn tile_mut(&mut self, cell: Cell) -> &mut Tile {
        let idx = self.index(cell);
        &mut self.tiles[idx]
    }

    /// Place a color with fresh animation state
    pub fn set_color(&mut self, cell: Cell, color: u8) {
        let tile = self.tile_mut(cell);
        tile.clear();
        tile.color = Some(color);
    }

    pub fn clear(&mut self, cell: Cell) {
        self.tile_mut(cell).clear();
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The up-to-six in-bounds neighbors of `cell`
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        NEIGHBOR_OFFSETS[self.parity(cell.row)]
            .iter()
            .filter_map(|&(dc, dr)| self.cell_at(cell.col as isize + dc, cell.row as isize + dr))
            .collect()
    }

    /// Cells holding a color, in row-major order
    pub fn occupied_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.tiles
            .iter()
            .filter(|t| t.is_occupied())
            .map(|t| Cell::new(t.column, t.row))
    }

    pub fn occupied_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_occupied()).count()
    }

    /// Distinct colors on the board, ignoring tiles already marked removed
    pub fn present_colors(&self) -> BTreeSet<u8> {
        self.tiles
            .iter()
            .filter(|t| t.is_settled())
            .filter_map(|t| t.color)
            .collect()
    }

    pub fn row_occupied(&self, row: usize) -> bool {
        self.tiles[row * self.columns..(row + 1) * self.columns]
            .iter()
            .any(|t| t.is_occupied())
    }

    /// Any settled tile on the loss line
    pub fn bottom_row_occupied(&self) -> bool {
        let row = self.rows - 1;
        self.tiles[row * self.columns..]
            .iter()
            .any(|t| t.is_settled())
    }

    pub fn reset_visited(&mut self) {
        for tile in &mut self.tiles {
            tile.visited = false;
        }
    }

    /// Empty every tile and reset the parity offset
    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.clear();
            tile.visited = false;
        }
        self.row_offset = 0;
    }

    /// Push every row down by one and fill row 0 with fresh colors
    ///
    /// New colors come from [`choose_existing_color`]. Fails without touching the
    /// grid when the bottom row is already occupied.
    pub fn inject_row(&mut self, rng: &mut impl Rng, color_count: u8) -> Result<(), GridOverflow> {
        if self.row_occupied(self.rows - 1) {
            return Err(GridOverflow);
        }

        let palette = self.present_colors();

        for row in (1..self.rows).rev() {
            for col in 0..self.columns {
                let src = self.tiles[(row - 1) * self.columns + col].clone();
                self.tiles[row * self.columns + col].copy_contents(&src);
            }
        }

        for col in 0..self.columns {
            let color = pick_color(&palette, rng, color_count);
            let tile = &mut self.tiles[col];
            tile.clear();
            tile.visited = false;
            tile.color = Some(color);
        }

        self.row_offset = (self.row_offset + 1) % 2;
        Ok(())
    }
}

fn pick_color(palette: &BTreeSet<u8>, rng: &mut impl Rng, color_count: u8) -> u8 {
    if palette.is_empty() {
        rng.random_range(0..color_count.max(1))
    } else {
        let pick = rng.random_range(0..palette.len());
        palette.iter().copied().nth(pick).unwrap_or(0)
    }
}

/// Color policy for new rows and launcher bubbles
///
/// Uniform among colors still on the board, or uniform over the whole palette
/// when the board is empty.
pub fn choose_existing_color(grid: &Grid, rng: &mut impl Rng, color_count: u8) -> u8 {
    pick_color(&grid.present_colors(), rng, color_count)
}
