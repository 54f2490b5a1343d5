//! Simulation step
//!
//! One call to [`tick`] advances the state machine by `dt` seconds:
//! READY (aim/shoot) -> SHOOTING (flight, snap) -> RESOLVING (fade, fall) -> READY,
//! with GAME_OVER as the terminal phase.

use rand::Rng;

use super::cluster::{find_cluster, find_floating_clusters};
use super::geometry::{circles_intersect, reflect_off_walls};
use super::grid::{Cell, GridOverflow};
use super::powerup::{PowerupKind, area_clear_cluster, convert_color};
use super::score::mark_removed;
use super::state::{Bubble, BubbleKind, GameEvent, GamePhase, GameState, ResolvePhase, Resolution};
use crate::consts::*;
use crate::{aim_direction, clamp_aim};

/// One player intent, applied while READY
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// New aim angle in degrees (clamped on apply)
    pub aim: Option<f32>,
    /// Fire the loaded bubble
    pub shoot: bool,
    /// Swap the loaded bubble for a power-up
    pub select_powerup: Option<PowerupKind>,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.phase == GamePhase::GameOver {
        return events;
    }

    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.time_ticks += 1;

    match state.phase {
        GamePhase::Ready => apply_input(state, input),
        GamePhase::Shooting => update_flight(state, dt, &mut events),
        GamePhase::Resolving => update_resolution(state, dt, &mut events),
        GamePhase::GameOver => {}
    }

    events
}

/// Apply one intent: power-up first, then aim, then fire
///
/// Only acts while READY, so anything after a shot in the same batch of
/// intents is ignored instead of steering or arming the bubble in flight.
pub fn apply_input(state: &mut GameState, input: &TickInput) {
    if state.phase != GamePhase::Ready {
        return;
    }
    if let Some(kind) = input.select_powerup {
        select_powerup(state, kind);
    }
    if let Some(angle) = input.aim {
        state.aim_angle = clamp_aim(angle);
    }
    if input.shoot {
        shoot(state);
    }
}

/// Fill the top rows with a fresh level and reload the launcher
pub fn generate_level(state: &mut GameState) {
    state.grid.reset();

    let columns = state.grid.columns();
    let rows = state.grid.rows();
    let color_count = state.color_count.max(1);
    // Never start with the loss line occupied
    let filled = ((rows as f32 * state.initial_fill_fraction).floor() as usize).min(rows - 1);

    for row in 0..filled {
        // Colors come in short runs so the opening board has matches to find
        let mut color = state.rng.random_range(0..color_count);
        let mut run = 0;
        for col in 0..columns {
            if run >= 2 {
                let mut next = state.rng.random_range(0..color_count);
                if next == color {
                    next = (next + 1) % color_count;
                }
                color = next;
                run = 0;
            }
            run += 1;
            state.grid.set_color(Cell::new(col, row), color);
        }
    }

    state.reload_launcher();
    log::info!(
        "Level generated: {}x{} grid, {} rows filled, {} colors (seed {})",
        columns,
        rows,
        filled,
        color_count,
        state.seed
    );
}

fn select_powerup(state: &mut GameState, kind: PowerupKind) {
    if state.loaded.kind.powerup().is_some() {
        log::debug!("Power-up already loaded, ignoring {:?}", kind);
        return;
    }
    if !state.powerups.try_consume(kind) {
        log::debug!("No {:?} charges left", kind);
        return;
    }
    state.loaded.kind = kind.into();
    log::debug!(
        "Loaded {:?} ({} charges left)",
        kind,
        state.powerups.charges(kind)
    );
}

fn shoot(state: &mut GameState) {
    state.projectile = Bubble {
        pos: state.layout.launcher,
        kind: state.loaded.kind,
        angle: state.aim_angle,
        speed: BUBBLE_SPEED_TILES * state.layout.tile_width,
        visible: true,
    };
    state.loaded.visible = false;
    state.phase = GamePhase::Shooting;
}

/// Move the projectile in sub-steps no longer than half a radius
fn update_flight(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let radius = state.layout.radius;
    let move_dist = state.projectile.speed * dt;
    let step_size = radius * 0.5;
    let num_steps = ((move_dist / step_size).ceil() as usize).clamp(1, 64);
    let step_dt = dt / num_steps as f32;

    for _ in 0..num_steps {
        let projectile = &mut state.projectile;
        projectile.pos += aim_direction(projectile.angle) * projectile.speed * step_dt;
        reflect_off_walls(
            &mut projectile.pos,
            &mut projectile.angle,
            radius,
            &state.layout,
        );

        let ceiling = state.layout.ceiling();
        if projectile.pos.y - radius <= ceiling {
            projectile.pos.y = ceiling + radius;
            snap(state, events);
            return;
        }

        if hits_tile(state) {
            snap(state, events);
            return;
        }
    }
}

/// Projectile overlaps any occupied tile
fn hits_tile(state: &GameState) -> bool {
    let pos = state.projectile.pos;
    let radius = state.layout.radius;
    state.grid.occupied_cells().any(|cell| {
        let center = state.layout.grid_to_pixel(&state.grid, cell);
        circles_intersect(pos, radius, center, radius)
    })
}

/// Settle the projectile into the grid and decide what it removes
fn snap(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.projectile.visible = false;

    let target = state.layout.pixel_to_grid(&state.grid, state.projectile.pos);
    let cell = if state.grid.tile(target).is_occupied() {
        // Near miss: take the first free cell below in the same column
        let below = (target.row + 1..state.grid.rows())
            .map(|row| Cell::new(target.col, row))
            .find(|&c| !state.grid.tile(c).is_occupied());
        match below {
            Some(c) => c,
            None => {
                state.discarded_shots += 1;
                log::warn!(
                    "Shot discarded: no free cell at or below ({}, {}) [{} discarded so far]",
                    target.col,
                    target.row,
                    state.discarded_shots
                );
                events.push(GameEvent::ShotDiscarded {
                    col: target.col,
                    row: target.row,
                });
                advance_turn(state, events);
                return;
            }
        }
    } else {
        target
    };

    events.push(GameEvent::Snapped {
        col: cell.col,
        row: cell.row,
    });

    let color = match state.projectile.kind {
        BubbleKind::AreaClear => {
            // The marker itself never lands; only its neighbors go
            let cluster = area_clear_cluster(&state.grid, cell);
            let count = mark_removed(&mut state.grid, &mut state.score, &cluster);
            log::debug!("Area clear at ({}, {}) removed {}", cell.col, cell.row, count);
            events.push(GameEvent::Matched { count });
            begin_resolution(state, ResolvePhase::Fading, cluster);
            return;
        }
        BubbleKind::ColorConvert => {
            let color = convert_color(&state.grid, cell, &mut state.rng, state.color_count);
            log::debug!("Color convert at ({}, {}) became {}", cell.col, cell.row, color);
            color
        }
        BubbleKind::Normal(color) => color,
    };
    state.grid.set_color(cell, color);

    let cluster = find_cluster(&mut state.grid, cell, true);
    if cluster.len() >= MATCH_MIN {
        let count = mark_removed(&mut state.grid, &mut state.score, &cluster);
        log::debug!("Matched {} of color {} at ({}, {})", count, color, cell.col, cell.row);
        events.push(GameEvent::Matched { count });
        begin_resolution(state, ResolvePhase::Fading, cluster);
        return;
    }

    let floating: Vec<Cell> = find_floating_clusters(&mut state.grid)
        .into_iter()
        .flatten()
        .collect();
    if !floating.is_empty() {
        let count = start_falling(state, &floating);
        events.push(GameEvent::Dropped { count });
        begin_resolution(state, ResolvePhase::Falling, floating);
        return;
    }

    advance_turn(state, events);
}

fn begin_resolution(state: &mut GameState, phase: ResolvePhase, cells: Vec<Cell>) {
    let (fading, falling) = match phase {
        ResolvePhase::Fading => (cells, Vec::new()),
        ResolvePhase::Falling => (Vec::new(), cells),
    };
    state.resolution = Some(Resolution {
        phase,
        fading,
        falling,
    });
    state.phase = GamePhase::Resolving;
}

/// Mark detached tiles removed (scoring each once) and give them a push
fn start_falling(state: &mut GameState, cells: &[Cell]) -> usize {
    let count = mark_removed(&mut state.grid, &mut state.score, cells);
    let start_speed = FALL_START_SPEED_TILES * state.layout.tile_width;
    for &cell in cells {
        let tile = state.grid.tile_mut(cell);
        tile.vertical_shift = 0.0;
        tile.fall_velocity = start_speed;
    }
    log::debug!("{} tiles detached", count);
    count
}

fn update_resolution(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let Some(mut resolution) = state.resolution.take() else {
        advance_turn(state, events);
        return;
    };

    match resolution.phase {
        ResolvePhase::Fading => {
            let mut active = false;
            for &cell in &resolution.fading {
                let tile = state.grid.tile_mut(cell);
                if tile.color.is_none() {
                    continue;
                }
                active = true;
                tile.alpha = (tile.alpha - MATCH_FADE_RATE * dt).max(0.0);
                if tile.alpha <= 0.0 {
                    tile.clear();
                }
            }
            if active {
                state.resolution = Some(resolution);
                return;
            }

            // Fade done: anything the match cut loose falls now
            let floating: Vec<Cell> = find_floating_clusters(&mut state.grid)
                .into_iter()
                .flatten()
                .collect();
            if floating.is_empty() {
                advance_turn(state, events);
                return;
            }
            let count = start_falling(state, &floating);
            events.push(GameEvent::Dropped { count });
            resolution.phase = ResolvePhase::Falling;
            resolution.falling = floating;
            state.resolution = Some(resolution);
        }
        ResolvePhase::Falling => {
            let gravity = FALL_GRAVITY_TILES * state.layout.tile_width;
            let row_height = state.layout.row_height;
            let floor = (state.grid.rows() as f32 - 1.0) * row_height + state.layout.tile_height;

            let mut active = false;
            for &cell in &resolution.falling {
                let tile = state.grid.tile_mut(cell);
                if tile.color.is_none() {
                    continue;
                }
                active = true;
                tile.fall_velocity += gravity * dt;
                tile.vertical_shift += tile.fall_velocity * dt;
                tile.alpha = (tile.alpha - FALL_FADE_RATE * dt).max(0.0);
                let below_floor = cell.row as f32 * row_height + tile.vertical_shift > floor;
                if tile.alpha <= 0.0 || below_floor {
                    tile.clear();
                }
            }
            if active {
                state.resolution = Some(resolution);
            } else {
                advance_turn(state, events);
            }
        }
    }
}

/// End of turn: row cadence, next bubble, loss check
fn advance_turn(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.resolution = None;
    state.turn += 1;

    if state.turn % state.turns_per_row == 0 {
        match state.grid.inject_row(&mut state.rng, state.color_count) {
            Ok(()) => {
                log::debug!("Row injected on turn {}", state.turn);
                events.push(GameEvent::RowInjected);
            }
            Err(GridOverflow) => {
                enter_game_over(state, events);
                return;
            }
        }
    }

    state.advance_launcher();

    if state.grid.bottom_row_occupied() {
        enter_game_over(state, events);
        return;
    }

    state.phase = GamePhase::Ready;
}

fn enter_game_over(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;
    state.projectile.visible = false;
    let score = state.score.total();
    log::info!("Game over on turn {} with score {}", state.turn, score);
    events.push(GameEvent::GameOver { score });
}
