//! Pointer input to player intents
//!
//! Runs on the worker while draining the command queue, so it reads the live
//! layout and phase without any locking.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp_aim;
use crate::rad_to_deg;
use crate::sim::{GamePhase, GameState, Layout, PowerupKind, TickInput, circles_intersect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A raw pointer/touch sample in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self { kind, x, y }
    }
}

/// Aim angle from the launcher pivot to a point, in degrees (90 = up)
pub fn aim_angle_to(layout: &Layout, point: Vec2) -> f32 {
    let dx = point.x - layout.launcher.x;
    let dy = layout.launcher.y - point.y; // Screen y is flipped
    clamp_aim(rad_to_deg(dy.atan2(dx)))
}

/// Which power-up button (if any) is under `point`
pub fn button_at(layout: &Layout, point: Vec2) -> Option<PowerupKind> {
    if circles_intersect(point, 0.0, layout.area_clear_button, layout.button_radius) {
        Some(PowerupKind::AreaClear)
    } else if circles_intersect(point, 0.0, layout.color_convert_button, layout.button_radius) {
        Some(PowerupKind::ColorConvert)
    } else {
        None
    }
}

/// Turns a press-drag-release gesture into aim and shoot intents
#[derive(Debug, Clone, Default)]
pub struct InputAdapter {
    /// A press started above the launcher line and hasn't been released
    aiming: bool,
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one event against the current state
    ///
    /// Only acts while READY. Power-up buttons answer to a press when they still
    /// have charges; presses above the launcher line aim, and releasing such a
    /// press fires.
    pub fn handle(&mut self, event: PointerEvent, state: &GameState) -> Option<TickInput> {
        if state.phase != GamePhase::Ready {
            self.aiming = false;
            return None;
        }

        let layout = &state.layout;
        let point = Vec2::new(event.x, event.y);
        let above_launcher = point.y < layout.launcher.y;

        match event.kind {
            PointerKind::Down => {
                if let Some(kind) = button_at(layout, point) {
                    self.aiming = false;
                    if state.powerups.charges(kind) == 0 {
                        return None;
                    }
                    return Some(TickInput {
                        select_powerup: Some(kind),
                        ..Default::default()
                    });
                }
                if !above_launcher {
                    return None;
                }
                self.aiming = true;
                Some(TickInput {
                    aim: Some(aim_angle_to(layout, point)),
                    ..Default::default()
                })
            }
            PointerKind::Move => {
                if !above_launcher {
                    return None;
                }
                Some(TickInput {
                    aim: Some(aim_angle_to(layout, point)),
                    ..Default::default()
                })
            }
            PointerKind::Up => {
                let was_aiming = std::mem::take(&mut self.aiming);
                if !was_aiming || !above_launcher {
                    return None;
                }
                Some(TickInput {
                    aim: Some(aim_angle_to(layout, point)),
                    shoot: true,
                    ..Default::default()
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn state() -> GameState {
        GameState::new(&EngineConfig {
            seed: Some(11),
            ..Default::default()
        })
    }

    #[test]
    fn test_press_drag_release_fires() {
        let state = state();
        let mut adapter = InputAdapter::new();
        let l = state.layout.launcher;

        let down = adapter
            .handle(PointerEvent::new(PointerKind::Down, l.x, l.y - 100.0), &state)
            .unwrap();
        assert!((down.aim.unwrap() - 90.0).abs() < 1e-3);
        assert!(!down.shoot);

        let up = adapter
            .handle(PointerEvent::new(PointerKind::Up, l.x + 100.0, l.y - 100.0), &state)
            .unwrap();
        assert!((up.aim.unwrap() - 45.0).abs() < 1e-3);
        assert!(up.shoot);
    }

    #[test]
    fn test_release_without_press_does_nothing() {
        let state = state();
        let mut adapter = InputAdapter::new();
        let l = state.layout.launcher;
        assert!(
            adapter
                .handle(PointerEvent::new(PointerKind::Up, l.x, l.y - 50.0), &state)
                .is_none()
        );
    }

    #[test]
    fn test_below_launcher_ignored() {
        let state = state();
        let mut adapter = InputAdapter::new();
        let l = state.layout.launcher;
        assert!(
            adapter
                .handle(PointerEvent::new(PointerKind::Move, l.x, l.y + 5.0), &state)
                .is_none()
        );
    }

    #[test]
    fn test_aim_is_clamped() {
        let state = state();
        let l = state.layout.launcher;
        let angle = aim_angle_to(&state.layout, Vec2::new(l.x + 500.0, l.y - 1.0));
        assert_eq!(angle, crate::consts::MIN_AIM_DEGREES);
    }

    #[test]
    fn test_buttons_gated_by_charges() {
        let mut state = state();
        let mut adapter = InputAdapter::new();
        let b = state.layout.area_clear_button;

        let input = adapter
            .handle(PointerEvent::new(PointerKind::Down, b.x, b.y), &state)
            .unwrap();
        assert_eq!(input.select_powerup, Some(PowerupKind::AreaClear));

        state.powerups.area_clear = 0;
        assert!(
            adapter
                .handle(PointerEvent::new(PointerKind::Down, b.x, b.y), &state)
                .is_none()
        );

        let c = state.layout.color_convert_button;
        let input = adapter
            .handle(PointerEvent::new(PointerKind::Down, c.x + 3.0, c.y - 3.0), &state)
            .unwrap();
        assert_eq!(input.select_powerup, Some(PowerupKind::ColorConvert));
    }

    #[test]
    fn test_ignored_outside_ready() {
        let mut state = state();
        state.phase = GamePhase::Shooting;
        let mut adapter = InputAdapter::new();
        let l = state.layout.launcher;
        assert!(
            adapter
                .handle(PointerEvent::new(PointerKind::Down, l.x, l.y - 100.0), &state)
                .is_none()
        );
    }
}
