//! Render snapshot
//!
//! Built by the worker once per tick after the update, then handed to the
//! draw callback. Owns its data so the renderer never touches live state.

use glam::Vec2;
use serde::Serialize;

use crate::sim::{BubbleKind, GamePhase, GameState, Layout, PowerupInventory};

/// One occupied tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub col: usize,
    pub row: usize,
    pub color: u8,
    /// Center in pixels, before `vertical_shift`
    pub x: f32,
    pub y: f32,
    pub alpha: f32,
    pub vertical_shift: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleView {
    pub pos: Vec2,
    pub kind: BubbleKind,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub layout: Layout,
    pub tiles: Vec<TileView>,
    /// Bubble in flight, if any
    pub projectile: Option<BubbleView>,
    /// Launcher bubble (hidden while a shot is in flight)
    pub loaded: Option<BubbleView>,
    pub preview: BubbleView,
    pub aim_angle: f32,
    pub score: u64,
    pub turn: u32,
    /// Simulation ticks run this session
    pub ticks: u64,
    pub powerups: PowerupInventory,
    pub phase: GamePhase,
    pub paused: bool,
}

impl Frame {
    pub fn capture(state: &GameState, paused: bool) -> Self {
        let tiles = state
            .grid
            .tiles()
            .iter()
            .filter_map(|tile| {
                let color = tile.color?;
                let center = state
                    .layout
                    .grid_to_pixel(&state.grid, crate::sim::Cell::new(tile.column, tile.row));
                Some(TileView {
                    col: tile.column,
                    row: tile.row,
                    color,
                    x: center.x,
                    y: center.y,
                    alpha: tile.alpha,
                    vertical_shift: tile.vertical_shift,
                })
            })
            .collect();

        let view = |pos: Vec2, kind: BubbleKind| BubbleView { pos, kind };

        Self {
            layout: state.layout,
            tiles,
            projectile: state
                .projectile
                .visible
                .then(|| view(state.projectile.pos, state.projectile.kind)),
            loaded: state
                .loaded
                .visible
                .then(|| view(state.loaded.pos, state.loaded.kind)),
            preview: view(state.preview.pos, state.preview.kind),
            aim_angle: state.aim_angle,
            score: state.score.total(),
            turn: state.turn,
            ticks: state.time_ticks,
            powerups: state.powerups,
            phase: state.phase,
            paused,
        }
    }

    /// Ready for input and not paused
    pub fn is_aiming(&self) -> bool {
        self.phase == GamePhase::Ready && !self.paused
    }
}
