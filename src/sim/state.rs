//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Layout;
use super::grid::{Cell, Grid, choose_existing_color};
use super::powerup::{PowerupInventory, PowerupKind};
use super::score::ScoreModel;
use crate::config::EngineConfig;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to aim and shoot
    Ready,
    /// Projectile in flight
    Shooting,
    /// Matched tiles fading, detached tiles falling
    Resolving,
    /// Run ended
    GameOver,
}

/// What a launcher bubble carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BubbleKind {
    /// Palette color
    Normal(u8),
    AreaClear,
    ColorConvert,
}

impl BubbleKind {
    pub fn powerup(self) -> Option<PowerupKind> {
        match self {
            BubbleKind::Normal(_) => None,
            BubbleKind::AreaClear => Some(PowerupKind::AreaClear),
            BubbleKind::ColorConvert => Some(PowerupKind::ColorConvert),
        }
    }
}

impl From<PowerupKind> for BubbleKind {
    fn from(kind: PowerupKind) -> Self {
        match kind {
            PowerupKind::AreaClear => BubbleKind::AreaClear,
            PowerupKind::ColorConvert => BubbleKind::ColorConvert,
        }
    }
}

/// A bubble on the launcher or in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    /// Center in pixels
    pub pos: Vec2,
    pub kind: BubbleKind,
    /// Travel direction in degrees (90 = straight up)
    pub angle: f32,
    /// Pixels per second
    pub speed: f32,
    pub visible: bool,
}

impl Bubble {
    pub fn new(pos: Vec2, kind: BubbleKind) -> Self {
        Self {
            pos,
            kind,
            angle: 90.0,
            speed: 0.0,
            visible: true,
        }
    }
}

/// Which animation the resolve phase is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvePhase {
    /// Matched tiles fading out
    Fading,
    /// Detached islands dropping
    Falling,
}

/// Tiles being animated out after a snap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub phase: ResolvePhase,
    pub fading: Vec<Cell>,
    pub falling: Vec<Cell>,
}

/// Things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Projectile settled into a cell
    Snapped { col: usize, row: usize },
    /// Tiles removed by a match or area clear
    Matched { count: usize },
    /// Tiles detached from the ceiling
    Dropped { count: usize },
    /// A new row was pushed in from the top
    RowInjected,
    /// Snap found no free cell; projectile vanished
    ShotDiscarded { col: usize, row: usize },
    /// Run ended with this score
    GameOver { score: u64 },
}

/// Complete game state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub color_count: u8,
    pub initial_fill_fraction: f32,
    pub turns_per_row: u32,
    pub starting_charges: PowerupInventory,
    pub grid: Grid,
    pub layout: Layout,
    pub phase: GamePhase,
    /// The bubble in flight (hidden while not shooting)
    pub projectile: Bubble,
    /// Bubble sitting on the launcher
    pub loaded: Bubble,
    /// Bubble that will be loaded next
    pub preview: Bubble,
    /// Launcher aim in degrees
    pub aim_angle: f32,
    pub score: ScoreModel,
    pub powerups: PowerupInventory,
    /// Turns taken this game
    pub turn: u32,
    pub resolution: Option<Resolution>,
    /// Shots that found no cell to snap into
    pub discarded_shots: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl GameState {
    /// Create a session and generate its first level
    pub fn new(config: &EngineConfig) -> Self {
        let seed = config.resolve_seed();
        let layout = Layout::new(
            config.columns,
            config.rows,
            config.surface_width,
            config.surface_height,
        );
        let starting_charges =
            PowerupInventory::new(config.area_clear_charges, config.color_convert_charges);
        let launcher = layout.launcher;

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            color_count: config.color_count,
            initial_fill_fraction: config.initial_fill_fraction,
            turns_per_row: config.turns_per_row,
            starting_charges,
            grid: Grid::new(config.columns, config.rows),
            layout,
            phase: GamePhase::Ready,
            projectile: Bubble::new(launcher, BubbleKind::Normal(0)),
            loaded: Bubble::new(launcher, BubbleKind::Normal(0)),
            preview: Bubble::new(launcher, BubbleKind::Normal(0)),
            aim_angle: 90.0,
            score: ScoreModel::new(),
            powerups: starting_charges,
            turn: 0,
            resolution: None,
            discarded_shots: 0,
            time_ticks: 0,
        };
        state.projectile.visible = false;

        super::tick::generate_level(&mut state);
        state
    }

    /// Next color from the board's color policy
    pub fn draw_color(&mut self) -> u8 {
        choose_existing_color(&self.grid, &mut self.rng, self.color_count)
    }

    /// Where the preview bubble waits
    pub fn preview_position(&self) -> Vec2 {
        self.layout.launcher
            + Vec2::new(-1.5 * self.layout.tile_width, 0.5 * self.layout.tile_height)
    }

    /// Refill the launcher with two fresh bubbles
    pub fn reload_launcher(&mut self) {
        let loaded = self.draw_color();
        let preview = self.draw_color();
        self.loaded = Bubble::new(self.layout.launcher, BubbleKind::Normal(loaded));
        self.preview = Bubble::new(self.preview_position(), BubbleKind::Normal(preview));
    }

    /// Move preview onto the launcher and draw a new preview
    pub fn advance_launcher(&mut self) {
        let mut next = self.preview.kind;
        // Never hand over a color that has left the board
        if let BubbleKind::Normal(color) = next {
            let present = self.grid.present_colors();
            if !present.is_empty() && !present.contains(&color) {
                next = BubbleKind::Normal(self.draw_color());
            }
        }
        let preview = self.draw_color();
        self.loaded = Bubble::new(self.layout.launcher, next);
        self.preview = Bubble::new(self.preview_position(), BubbleKind::Normal(preview));
    }

    /// Recompute pixel geometry for a new surface, keeping the board
    pub fn set_surface_size(&mut self, width: f32, height: f32) {
        let old = self.layout;
        self.layout = Layout::new(self.grid.columns(), self.grid.rows(), width, height);
        let scale = self.layout.tile_width / old.tile_width;

        self.projectile.pos = self.layout.remap_from(&old, self.projectile.pos);
        self.projectile.speed *= scale;
        for tile_cell in self.grid.occupied_cells().collect::<Vec<_>>() {
            let tile = self.grid.tile_mut(tile_cell);
            tile.vertical_shift *= scale;
            tile.fall_velocity *= scale;
        }
        self.loaded.pos = self.layout.launcher;
        self.preview.pos = self.preview_position();
        log::debug!(
            "Surface resized to {}x{}, tile width {:.1} -> {:.1}",
            width,
            height,
            old.tile_width,
            self.layout.tile_width
        );
    }

    /// Start a new game on the same session
    pub fn restart(&mut self) {
        self.score.reset();
        self.powerups = self.starting_charges;
        self.turn = 0;
        self.resolution = None;
        self.discarded_shots = 0;
        self.aim_angle = 90.0;
        self.projectile.visible = false;
        self.phase = GamePhase::Ready;
        super::tick::generate_level(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig {
            seed: Some(1234),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_state_is_ready_with_level() {
        let state = GameState::new(&config());
        assert_eq!(state.phase, GamePhase::Ready);
        assert!(state.grid.occupied_count() > 0);
        assert!(!state.grid.bottom_row_occupied());
        assert!(matches!(state.loaded.kind, BubbleKind::Normal(_)));
        assert!(!state.projectile.visible);
    }

    #[test]
    fn test_same_seed_same_level() {
        let a = GameState::new(&config());
        let b = GameState::new(&config());
        assert_eq!(a.grid.tiles(), b.grid.tiles());
        assert_eq!(a.loaded.kind, b.loaded.kind);
    }

    #[test]
    fn test_resize_keeps_board() {
        let mut state = GameState::new(&config());
        let before = state.grid.tiles().to_vec();
        state.set_surface_size(960.0, 1600.0);
        assert_eq!(state.grid.tiles(), &before[..]);
        assert_eq!(state.loaded.pos, state.layout.launcher);
    }

    #[test]
    fn test_launcher_colors_exist_on_board() {
        let mut state = GameState::new(&config());
        let present = state.grid.present_colors();
        for _ in 0..20 {
            state.advance_launcher();
            if let BubbleKind::Normal(c) = state.loaded.kind {
                assert!(present.contains(&c));
            }
        }
    }
}
