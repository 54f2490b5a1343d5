//! Bubble Burst - a hex-offset bubble shooter puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, collisions, clusters, game state)
//! - `input`: Pointer events to aim/shoot intents
//! - `engine`: Threaded fixed-cadence update loop and lifecycle control
//! - `frame`: Read-only render snapshot handed to the draw callback
//! - `config`: Data-driven engine configuration

pub mod config;
pub mod engine;
pub mod frame;
pub mod input;
pub mod sim;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, FrameSink};
pub use frame::Frame;
pub use input::{PointerEvent, PointerKind};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference grid dimensions
    pub const DEFAULT_COLUMNS: usize = 12;
    pub const DEFAULT_ROWS: usize = 16;
    /// Number of distinct bubble colors in play
    pub const DEFAULT_COLOR_COUNT: u8 = 7;
    /// Fraction of rows filled when a level is generated
    pub const DEFAULT_FILL_FRACTION: f32 = 0.5;
    /// A new row is pushed in from the top every N turns
    pub const DEFAULT_TURNS_PER_ROW: u32 = 3;
    /// Starting power-up charges
    pub const DEFAULT_POWERUP_CHARGES: u32 = 3;

    /// Aim limits (degrees, 90 = straight up)
    pub const MIN_AIM_DEGREES: f32 = 10.0;
    pub const MAX_AIM_DEGREES: f32 = 170.0;

    /// Minimum same-color cluster size that pops
    pub const MATCH_MIN: usize = 3;
    /// Points awarded per removed tile (matched or dropped)
    pub const POINTS_PER_TILE: u64 = 100;

    /// Row pitch relative to tile width (rows interlock)
    pub const ROW_HEIGHT_RATIO: f32 = 0.85;
    /// Projectile speed in tile widths per second
    pub const BUBBLE_SPEED_TILES: f32 = 25.0;
    /// Alpha lost per second by a matched tile
    pub const MATCH_FADE_RATE: f32 = 15.0;
    /// Alpha lost per second by a falling tile
    pub const FALL_FADE_RATE: f32 = 8.0;
    /// Initial fall speed and acceleration (tile widths per second, per second²)
    pub const FALL_START_SPEED_TILES: f32 = 22.5;
    pub const FALL_GRAVITY_TILES: f32 = 17.5;
    /// Power-up button hit radius relative to tile width
    pub const BUTTON_RADIUS_RATIO: f32 = 0.75;

    /// Upper bound on a single simulation step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Worker loop sleep between iterations (milliseconds)
    pub const LOOP_SLEEP_MS: u64 = 2;
}

#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

#[inline]
pub fn rad_to_deg(radians: f32) -> f32 {
    radians * 180.0 / std::f32::consts::PI
}

/// Unit direction for an aim angle in screen space (y grows downward, 90° points up)
#[inline]
pub fn aim_direction(degrees: f32) -> Vec2 {
    let rad = deg_to_rad(degrees);
    Vec2::new(rad.cos(), -rad.sin())
}

/// Clamp an aim angle so shots never travel sideways, down or backward
#[inline]
pub fn clamp_aim(degrees: f32) -> f32 {
    degrees.clamp(consts::MIN_AIM_DEGREES, consts::MAX_AIM_DEGREES)
}
