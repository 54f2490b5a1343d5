//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (row-major)
//! - No threads, rendering or platform dependencies

pub mod cluster;
pub mod geometry;
pub mod grid;
pub mod powerup;
pub mod score;
pub mod state;
pub mod tick;

pub use cluster::{find_cluster, find_floating_clusters};
pub use geometry::{Layout, circles_intersect, reflect_off_walls};
pub use grid::{Cell, Grid, GridOverflow, Tile, choose_existing_color};
pub use powerup::{PowerupInventory, PowerupKind, area_clear_cluster, convert_color};
pub use score::{ScoreModel, mark_removed};
pub use state::{
    Bubble, BubbleKind, GameEvent, GamePhase, GameState, ResolvePhase, Resolution,
};
pub use tick::{TickInput, apply_input, generate_level, tick};
