//! Pixel-space layout and collision tests
//!
//! All positions are bubble centers in screen space (y grows downward).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid};
use crate::consts::*;

/// Pixel geometry of the play field, derived from the surface size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Top-left corner of the play field
    pub origin: Vec2,
    pub tile_width: f32,
    pub tile_height: f32,
    /// Vertical pitch between rows (rows interlock, so less than tile height)
    pub row_height: f32,
    /// Bubble radius
    pub radius: f32,
    /// Play field width, including the half-tile shift of odd rows
    pub field_width: f32,
    /// Launcher pivot (bubble center when loaded)
    pub launcher: Vec2,
    /// Power-up button centers
    pub area_clear_button: Vec2,
    pub color_convert_button: Vec2,
    pub button_radius: f32,
}

impl Layout {
    /// Fit a `columns x rows` grid plus launcher into a surface
    pub fn new(columns: usize, rows: usize, width: f32, height: f32) -> Self {
        // Width budget: columns + half a tile of row shift.
        // Height budget: rows, plus two tiles for the launcher strip.
        let by_width = width / (columns as f32 + 0.5);
        let by_height = height / ((rows as f32 - 1.0) * ROW_HEIGHT_RATIO + 1.0 + 2.5);
        let tile_width = by_width.min(by_height).max(1.0);
        let tile_height = tile_width;
        let row_height = tile_width * ROW_HEIGHT_RATIO;
        let field_width = tile_width * (columns as f32 + 0.5);
        let field_height = (rows as f32 - 1.0) * row_height + tile_height;

        let origin = Vec2::new(((width - field_width) / 2.0).max(0.0), 0.0);
        let launcher = Vec2::new(
            origin.x + field_width / 2.0,
            origin.y + field_height + tile_height,
        );
        let button_offset = tile_width * 3.0;

        Self {
            origin,
            tile_width,
            tile_height,
            row_height,
            radius: tile_width / 2.0,
            field_width,
            launcher,
            area_clear_button: Vec2::new(launcher.x - button_offset, launcher.y),
            color_convert_button: Vec2::new(launcher.x + button_offset, launcher.y),
            button_radius: tile_width * BUTTON_RADIUS_RATIO,
        }
    }

    /// Left and right edges of the play field
    #[inline]
    pub fn walls(&self) -> (f32, f32) {
        (self.origin.x, self.origin.x + self.field_width)
    }

    /// The ceiling line bubbles stick to
    #[inline]
    pub fn ceiling(&self) -> f32 {
        self.origin.y
    }

    /// Center of the tile at `cell`
    pub fn grid_to_pixel(&self, grid: &Grid, cell: Cell) -> Vec2 {
        let shift = if grid.parity(cell.row) == 1 {
            self.tile_width / 2.0
        } else {
            0.0
        };
        Vec2::new(
            self.origin.x + cell.col as f32 * self.tile_width + shift + self.tile_width / 2.0,
            self.origin.y + cell.row as f32 * self.row_height + self.tile_height / 2.0,
        )
    }

    /// Nearest grid cell to a pixel position, clamped into the grid
    pub fn pixel_to_grid(&self, grid: &Grid, pos: Vec2) -> Cell {
        let max_row = grid.rows() as f32 - 1.0;
        let row = ((pos.y - self.origin.y - self.tile_height / 2.0) / self.row_height)
            .round()
            .clamp(0.0, max_row) as usize;

        let shift = if grid.parity(row) == 1 {
            self.tile_width / 2.0
        } else {
            0.0
        };
        let max_col = grid.columns() as f32 - 1.0;
        let col = ((pos.x - self.origin.x - shift - self.tile_width / 2.0) / self.tile_width)
            .round()
            .clamp(0.0, max_col) as usize;

        Cell::new(col, row)
    }

    /// Map a position from another layout into this one, keeping it in the
    /// same place relative to the grid
    pub fn remap_from(&self, old: &Layout, pos: Vec2) -> Vec2 {
        let scale = self.tile_width / old.tile_width;
        self.origin + (pos - old.origin) * scale
    }
}

/// `distance < r1 + r2`
#[inline]
pub fn circles_intersect(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    c1.distance_squared(c2) < (r1 + r2) * (r1 + r2)
}

/// Bounce a projectile off the side walls
///
/// Mirrors the angle (`180 - angle`) and clamps the center back inside.
/// Speed is untouched. Returns true if a wall was hit.
pub fn reflect_off_walls(pos: &mut Vec2, angle: &mut f32, radius: f32, layout: &Layout) -> bool {
    let (left, right) = layout.walls();
    if pos.x - radius <= left {
        *angle = 180.0 - *angle;
        pos.x = left + radius;
        true
    } else if pos.x + radius >= right {
        *angle = 180.0 - *angle;
        pos.x = right - radius;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> (Grid, Layout) {
        let grid = Grid::new(12, 16);
        let layout = Layout::new(12, 16, 500.0, 900.0);
        (grid, layout)
    }

    #[test]
    fn test_grid_pixel_roundtrip() {
        let (grid, layout) = layout();
        for row in 0..16 {
            for col in 0..12 {
                let cell = Cell::new(col, row);
                let p = layout.grid_to_pixel(&grid, cell);
                assert_eq!(layout.pixel_to_grid(&grid, p), cell);
            }
        }
    }

    #[test]
    fn test_odd_rows_are_shifted() {
        let (grid, layout) = layout();
        let even = layout.grid_to_pixel(&grid, Cell::new(0, 0));
        let odd = layout.grid_to_pixel(&grid, Cell::new(0, 1));
        assert!((odd.x - even.x - layout.tile_width / 2.0).abs() < 1e-3);
        assert!((odd.y - even.y - layout.row_height).abs() < 1e-3);
    }

    #[test]
    fn test_pixel_to_grid_clamps() {
        let (grid, layout) = layout();
        assert_eq!(
            layout.pixel_to_grid(&grid, Vec2::new(-100.0, -100.0)),
            Cell::new(0, 0)
        );
        assert_eq!(
            layout.pixel_to_grid(&grid, Vec2::new(10_000.0, 10_000.0)),
            Cell::new(11, 15)
        );
    }

    #[test]
    fn test_field_fits_surface() {
        let (_, layout) = layout();
        assert!(layout.field_width <= 500.0 + 1e-3);
        assert!(layout.launcher.y + layout.tile_height <= 900.0);
    }

    #[test]
    fn test_circles_intersect() {
        assert!(circles_intersect(Vec2::ZERO, 10.0, Vec2::new(19.0, 0.0), 10.0));
        assert!(!circles_intersect(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_wall_reflection_mirrors_angle() {
        let (_, layout) = layout();
        let (left, right) = layout.walls();

        let mut pos = Vec2::new(left + 2.0, 300.0);
        let mut angle = 150.0;
        assert!(reflect_off_walls(&mut pos, &mut angle, 10.0, &layout));
        assert_eq!(angle, 30.0);
        assert_eq!(pos.x, left + 10.0);

        let mut pos = Vec2::new(right, 300.0);
        let mut angle = 30.0;
        assert!(reflect_off_walls(&mut pos, &mut angle, 10.0, &layout));
        assert_eq!(angle, 150.0);
        assert_eq!(pos.x, right - 10.0);

        let mut pos = Vec2::new((left + right) / 2.0, 300.0);
        let mut angle = 60.0;
        assert!(!reflect_off_walls(&mut pos, &mut angle, 10.0, &layout));
        assert_eq!(angle, 60.0);
    }

    #[test]
    fn test_remap_keeps_relative_position() {
        let (grid, small) = layout();
        let big = Layout::new(12, 16, 1000.0, 1800.0);
        let cell = Cell::new(4, 7);
        let p = small.grid_to_pixel(&grid, cell);
        let mapped = big.remap_from(&small, p);
        assert_eq!(big.pixel_to_grid(&grid, mapped), cell);
    }
}
