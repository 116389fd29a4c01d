//! Enemies, weapons and hitscan resolution.

use crate::grid::GridPos;
use crate::levelgen::EnemyKind;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Bearing tolerance for a pellet to connect.
pub const HIT_CONE: f32 = 0.2;

/// Wrap an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Dormant,
    Active,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: i32,
    pub speed: f32,
    pub damage: u32,
    pub cooldown_ticks: u32,
    pub attack_range: f32,
    pub detection_range: f32,
}

impl EnemyKind {
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Demon => EnemyStats {
                health: 100,
                speed: 0.02,
                damage: 10,
                cooldown_ticks: 60,
                attack_range: 1.5,
                detection_range: 8.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub max_health: i32,
    pub state: EnemyState,
    pub cooldown: u32,
    stats: EnemyStats,
}

impl Enemy {
    pub fn new(kind: EnemyKind, x: f32, y: f32) -> Self {
        let stats = kind.stats();
        Self {
            kind,
            x,
            y,
            health: stats.health,
            max_health: stats.health,
            state: EnemyState::Dormant,
            cooldown: 0,
            stats,
        }
    }

    pub fn stats(&self) -> &EnemyStats {
        &self.stats
    }

    pub fn is_alive(&self) -> bool {
        self.state != EnemyState::Dead
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (x - self.x).hypot(y - self.y)
    }

    /// Advance one tick toward `target`. `walkable` decides which cells the
    /// enemy may step into. Returns the damage dealt if it attacks.
    pub fn update(&mut self, target: (f32, f32), walkable: impl Fn(GridPos) -> bool) -> Option<u32> {
        if self.state == EnemyState::Dead {
            return None;
        }
        let (tx, ty) = target;
        let distance = self.distance_to(tx, ty);
        if self.state == EnemyState::Dormant {
            if distance >= self.stats.detection_range {
                return None;
            }
            self.state = EnemyState::Active;
        }

        if distance > self.stats.attack_range {
            let angle = (ty - self.y).atan2(tx - self.x);
            let nx = self.x + angle.cos() * self.stats.speed;
            let ny = self.y + angle.sin() * self.stats.speed;
            if walkable(GridPos::containing(nx, ny)) {
                self.x = nx;
                self.y = ny;
            }
        }

        self.cooldown = self.cooldown.saturating_sub(1);
        if distance <= self.stats.attack_range && self.cooldown == 0 {
            self.cooldown = self.stats.cooldown_ticks;
            return Some(self.stats.damage);
        }
        None
    }

    /// Apply damage. Returns `true` if this hit killed the enemy.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.state == EnemyState::Dead {
            return false;
        }
        self.health = self.health.saturating_sub_unsigned(amount);
        // Getting shot wakes an enemy regardless of range.
        self.state = EnemyState::Active;
        if self.health <= 0 {
            self.state = EnemyState::Dead;
            return true;
        }
        false
    }

    pub fn health_fraction(&self) -> f32 {
        (self.health.max(0) as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Weapons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponKind {
    Pistol,
    Shotgun,
}

impl WeaponKind {
    pub const ALL: [Self; 2] = [Self::Pistol, Self::Shotgun];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pistol => "Pistol",
            Self::Shotgun => "Shotgun",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub damage: u32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub fire_rate: u32,
    pub cooldown: u32,
    /// Total spread in radians; pellets land within half of it either side.
    pub spread: f32,
    pub pellets: u32,
}

impl Weapon {
    pub fn pistol() -> Self {
        Self {
            kind: WeaponKind::Pistol,
            damage: 25,
            ammo: 50,
            max_ammo: 50,
            fire_rate: 15,
            cooldown: 0,
            spread: 0.02,
            pellets: 1,
        }
    }

    pub fn shotgun() -> Self {
        Self {
            kind: WeaponKind::Shotgun,
            damage: 15,
            ammo: 24,
            max_ammo: 24,
            fire_rate: 30,
            cooldown: 0,
            spread: 0.1,
            pellets: 7,
        }
    }

    pub fn of_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Pistol => Self::pistol(),
            WeaponKind::Shotgun => Self::shotgun(),
        }
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown == 0 && self.ammo > 0
    }

    /// Pull the trigger. On success returns one angular offset per pellet.
    pub fn fire<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Vec<f32>> {
        if !self.can_fire() {
            return None;
        }
        self.ammo -= 1;
        self.cooldown = self.fire_rate;
        let half = self.spread / 2.0;
        let offsets = (0..self.pellets)
            .map(|_| if half > 0.0 { rng.random_range(-half..=half) } else { 0.0 })
            .collect();
        Some(offsets)
    }

    pub fn tick(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Add ammo up to capacity, returning how much was taken.
    pub fn reload(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.max_ammo.saturating_sub(self.ammo));
        self.ammo += taken;
        taken
    }
}

// ---------------------------------------------------------------------------
// Hitscan
// ---------------------------------------------------------------------------

/// Index of the nearest live enemy a pellet fired from `origin` along
/// `angle` strikes before travelling `wall_distance`.
pub fn hitscan(origin: (f32, f32), angle: f32, enemies: &[Enemy], wall_distance: f32) -> Option<usize> {
    let (ox, oy) = origin;
    enemies
        .iter()
        .enumerate()
        .filter(|(_, enemy)| enemy.is_alive())
        .filter_map(|(index, enemy)| {
            let distance = enemy.distance_to(ox, oy);
            let bearing = (enemy.y - oy).atan2(enemy.x - ox);
            let off = normalize_angle(bearing - angle).abs();
            (off < HIT_CONE && distance < wall_distance).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
