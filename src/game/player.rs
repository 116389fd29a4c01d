//! Player pose, per-tick input and the motion integrator.

use crate::grid::GridPos;
use crate::render::raycast::Pose;
use crate::settings::Settings;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Everything the player asked for during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    /// Horizontal mouse travel in pixels since the last tick.
    pub mouse_dx: f32,
    pub fire: bool,
    pub use_door: bool,
    /// Weapon slot requested, zero based.
    pub select_weapon: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    /// Heading in radians, kept in `[0, TAU)`.
    pub angle: f32,
    pub fov: f32,
    pub move_speed: f32,
    pub rot_speed: f32,
    pub health: i32,
    pub max_health: i32,
    pub armor: i32,
    pub kills: u32,
}

impl Player {
    pub fn new(x: f32, y: f32, settings: &Settings) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            fov: settings.fov,
            move_speed: settings.move_speed,
            rot_speed: settings.rot_speed,
            health: 100,
            max_health: 100,
            armor: 0,
            kills: 0,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            angle: self.angle,
            fov: self.fov,
        }
    }

    pub fn cell(&self) -> GridPos {
        GridPos::containing(self.x, self.y)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Move to a new position and face east.
    pub fn respawn_at(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.angle = 0.0;
    }

    pub fn turn(&mut self, input: &InputSnapshot, mouse_sensitivity: f32) {
        let mut delta = input.mouse_dx * mouse_sensitivity;
        if input.turn_left {
            delta -= self.rot_speed;
        }
        if input.turn_right {
            delta += self.rot_speed;
        }
        self.angle = (self.angle + delta).rem_euclid(TAU);
    }

    /// Apply walking and strafing. The whole step is discarded if it would
    /// end in a cell `walkable` rejects. Returns whether the player moved.
    pub fn advance(&mut self, input: &InputSnapshot, walkable: impl Fn(GridPos) -> bool) -> bool {
        let (sin, cos) = self.angle.sin_cos();
        let (strafe_sin, strafe_cos) = (self.angle - FRAC_PI_2).sin_cos();
        let mut dx = 0.0;
        let mut dy = 0.0;
        if input.forward {
            dx += cos * self.move_speed;
            dy += sin * self.move_speed;
        }
        if input.backward {
            dx -= cos * self.move_speed;
            dy -= sin * self.move_speed;
        }
        if input.strafe_left {
            dx += strafe_cos * self.move_speed;
            dy += strafe_sin * self.move_speed;
        }
        if input.strafe_right {
            dx -= strafe_cos * self.move_speed;
            dy -= strafe_sin * self.move_speed;
        }
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let nx = self.x + dx;
        let ny = self.y + dy;
        if !walkable(GridPos::containing(nx, ny)) {
            return false;
        }
        self.x = nx;
        self.y = ny;
        true
    }

    /// Armor soaks damage first. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let absorbed = amount.min(self.armor);
        self.armor -= absorbed;
        let lost = (amount - absorbed).min(self.health.max(0));
        self.health -= lost;
        lost.unsigned_abs()
    }

    /// Heal up to `max_health`, returning the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let restored = amount.min(self.max_health - self.health).max(0);
        self.health += restored;
        restored
    }

    pub fn add_armor(&mut self, amount: i32, cap: i32) -> i32 {
        let added = amount.min(cap - self.armor).max(0);
        self.armor += added;
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(3.5, 3.5, &Settings::default())
    }

    fn open(_: GridPos) -> bool {
        true
    }

    // -- turning -------------------------------------------------------------

    #[test]
    fn turning_wraps_heading() {
        let mut player = player();
        let input = InputSnapshot {
            turn_left: true,
            ..InputSnapshot::default()
        };
        player.turn(&input, 0.002);
        assert!(player.angle > 6.0 && player.angle < TAU, "{}", player.angle);
    }

    #[test]
    fn mouse_adds_to_keyboard_turn() {
        let mut player = player();
        let input = InputSnapshot {
            turn_right: true,
            mouse_dx: 10.0,
            ..InputSnapshot::default()
        };
        player.turn(&input, 0.002);
        assert!((player.angle - 0.05).abs() < 1e-6);
    }

    // -- walking -------------------------------------------------------------

    #[test]
    fn forward_moves_along_heading() {
        let mut player = player();
        let input = InputSnapshot {
            forward: true,
            ..InputSnapshot::default()
        };
        assert!(player.advance(&input, open));
        assert!((player.x - 3.55).abs() < 1e-6);
        assert!((player.y - 3.5).abs() < 1e-6);
    }

    #[test]
    fn strafe_left_moves_toward_negative_y_when_facing_east() {
        let mut player = player();
        let input = InputSnapshot {
            strafe_left: true,
            ..InputSnapshot::default()
        };
        player.advance(&input, open);
        assert!(player.y < 3.5);
        assert!((player.x - 3.5).abs() < 1e-5);
    }

    #[test]
    fn blocked_step_is_discarded_whole() {
        let mut player = player();
        let input = InputSnapshot {
            forward: true,
            strafe_left: true,
            ..InputSnapshot::default()
        };
        assert!(!player.advance(&input, |_| false));
        assert_eq!((player.x, player.y), (3.5, 3.5));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut player = player();
        let input = InputSnapshot {
            forward: true,
            backward: true,
            ..InputSnapshot::default()
        };
        assert!(!player.advance(&input, open));
    }

    // -- vitals --------------------------------------------------------------

    #[test]
    fn armor_absorbs_damage_first() {
        let mut player = player();
        player.armor = 6;
        assert_eq!(player.take_damage(10), 4);
        assert_eq!(player.armor, 0);
        assert_eq!(player.health, 96);
    }

    #[test]
    fn healing_is_capped() {
        let mut player = player();
        player.health = 90;
        assert_eq!(player.heal(25), 10);
        assert_eq!(player.health, 100);
        assert_eq!(player.add_armor(25, 100), 25);
        player.armor = 90;
        assert_eq!(player.add_armor(25, 100), 10);
    }
}
