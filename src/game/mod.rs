//! Core game logic, free of `egui`.
//!
//! A [`GameState`] holds one play session. The only way to advance it is
//! [`GameState::tick`], which consumes an [`InputSnapshot`] and reports what
//! happened as [`GameEvent`]s so upper layers can react.

pub mod combat;
pub mod door;
pub mod player;

pub use combat::{Enemy, EnemyState, Weapon, WeaponKind, hitscan};
pub use door::{Door, DoorRegistry, DoorState, OpenOutcome};
pub use player::{InputSnapshot, Player};

use crate::error::Result;
use crate::grid::{GridPos, KeyColor, TileGrid, TileKind};
use crate::levelgen::{KeySpawn, Level, LevelConfig, LevelGenerator, PickupKind, PickupSpawn};
use crate::render::raycast::Caster;
use crate::render::{Scene, SpriteInstance, TextureId};
use crate::settings::Settings;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rustc_hash::FxHashSet;

const PICKUP_RADIUS: f32 = 0.6;
/// Sample points ahead of the player checked for a door to use.
const USE_REACH: [f32; 3] = [0.5, 1.0, 1.5];
const HEALTH_PICKUP: i32 = 25;
const ARMOR_PICKUP: i32 = 25;
const ARMOR_CAP: i32 = 100;
const AMMO_PICKUP: u32 = 10;

const MUZZLE_FLASH_TICKS: u32 = 10;
const DAMAGE_FLASH_TICKS: u32 = 20;
const FIRE_SHAKE: u32 = 5;
const DAMAGE_SHAKE: u32 = 8;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted by [`GameState::tick`] so upper layers know what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    WeaponFired { weapon: WeaponKind },
    WeaponSwitched { weapon: WeaponKind },
    EnemyHit { enemy: usize, damage: u32 },
    EnemyKilled { enemy: usize },
    PlayerDamaged { amount: u32 },
    PickupCollected { kind: PickupKind },
    KeyCollected { color: KeyColor },
    DoorOpened { pos: GridPos },
    DoorLocked { color: KeyColor },
    /// Carries the number of the level just finished.
    LevelCompleted { level: u32 },
    PlayerDied,
}

/// Countdown timers for screen effects, in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    pub muzzle_flash: u32,
    pub damage_flash: u32,
    pub screen_shake: u32,
}

impl Effects {
    fn tick(&mut self) {
        self.muzzle_flash = self.muzzle_flash.saturating_sub(1);
        self.damage_flash = self.damage_flash.saturating_sub(1);
        self.screen_shake = self.screen_shake.saturating_sub(1);
    }
}

/// Whether a body may stand in `pos`.
pub fn walkable(grid: &TileGrid, doors: &DoorRegistry, pos: GridPos) -> bool {
    match grid.kind(pos) {
        Some(TileKind::Floor | TileKind::Exit) => true,
        Some(TileKind::Door(_)) => !doors.blocks_movement(pos),
        Some(TileKind::Wall(_)) | None => false,
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub level: Level,
    pub doors: DoorRegistry,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<PickupSpawn>,
    pub keys: Vec<KeySpawn>,
    pub held_keys: FxHashSet<KeyColor>,
    pub weapons: Vec<Weapon>,
    pub current_weapon: usize,
    pub effects: Effects,
    /// Cleared when the player dies; a stopped game ignores input.
    pub running: bool,
    pub ticks: u64,
    generator: LevelGenerator,
    caster: Caster,
    rng: SmallRng,
}

impl GameState {
    /// Start a session on a freshly generated first level.
    ///
    /// # Errors
    ///
    /// Fails if `settings` do not validate.
    pub fn new(settings: Settings, seed: u64) -> Result<Self> {
        settings.validate()?;
        let generator = Self::generator_for(&settings)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let level = generator.generate(1, &mut rng);
        Self::assemble(settings, generator, level, rng)
    }

    /// Start a session on a prepared level.
    ///
    /// # Errors
    ///
    /// Fails if `settings` do not validate.
    pub fn with_level(settings: Settings, level: Level, seed: u64) -> Result<Self> {
        settings.validate()?;
        let generator = Self::generator_for(&settings)?;
        Self::assemble(settings, generator, level, SmallRng::seed_from_u64(seed))
    }

    fn generator_for(settings: &Settings) -> Result<LevelGenerator> {
        LevelGenerator::new(LevelConfig {
            width: settings.map_width,
            height: settings.map_height,
            ..LevelConfig::default()
        })
    }

    fn assemble(
        settings: Settings,
        generator: LevelGenerator,
        level: Level,
        rng: SmallRng,
    ) -> Result<Self> {
        let caster = Caster::from_settings(&settings)?;
        let (x, y) = level.spawn;
        let player = Player::new(x, y, &settings);
        let mut state = Self {
            settings,
            level,
            doors: DoorRegistry::default(),
            player,
            enemies: Vec::new(),
            pickups: Vec::new(),
            keys: Vec::new(),
            held_keys: FxHashSet::default(),
            weapons: WeaponKind::ALL.into_iter().map(Weapon::of_kind).collect(),
            current_weapon: 0,
            effects: Effects::default(),
            running: true,
            ticks: 0,
            generator,
            caster,
            rng,
        };
        state.populate();
        Ok(state)
    }

    fn enter_level(&mut self, level: Level) {
        self.level = level;
        self.populate();
    }

    /// Reset doors, actors and items from the current level.
    fn populate(&mut self) {
        let level = &self.level;
        log::info!(
            "Entering level {} ({} rooms, {} doors, {} enemies)",
            level.number,
            level.rooms.len(),
            level.doors.len(),
            level.enemies.len()
        );
        self.doors = DoorRegistry::from_spawns(&level.doors);
        self.enemies = level
            .enemies
            .iter()
            .map(|spawn| Enemy::new(spawn.kind, spawn.x, spawn.y))
            .collect();
        self.pickups.clone_from(&level.pickups);
        self.keys.clone_from(&level.keys);
        self.held_keys.clear();
        let (x, y) = level.spawn;
        self.player.respawn_at(x, y);
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapons.get(self.current_weapon)
    }

    pub fn caster(&self) -> &Caster {
        &self.caster
    }

    /// Advance the session by one fixed tick.
    pub fn tick(&mut self, input: &InputSnapshot) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        self.ticks += 1;

        if let Some(slot) = input.select_weapon {
            self.switch_weapon(slot, &mut events);
        }
        self.player.turn(input, self.settings.mouse_sensitivity);
        let grid = &self.level.grid;
        let doors = &self.doors;
        self.player.advance(input, |pos| walkable(grid, doors, pos));
        if input.use_door {
            self.use_door(&mut events);
        }
        if input.fire {
            self.fire(&mut events);
        }
        self.collect_items(&mut events);
        self.doors.tick();
        self.update_enemies(&mut events);
        if !self.running {
            return events;
        }
        for weapon in &mut self.weapons {
            weapon.tick();
        }
        self.effects.tick();

        if self.player.cell() == self.level.exit {
            let finished = self.level.number;
            log::info!("Level {finished} completed with {} kills", self.player.kills);
            let next = self.generator.generate(finished + 1, &mut self.rng);
            self.enter_level(next);
            events.push(GameEvent::LevelCompleted { level: finished });
        }
        events
    }

    fn switch_weapon(&mut self, slot: usize, events: &mut Vec<GameEvent>) {
        if slot == self.current_weapon {
            return;
        }
        let Some(weapon) = self.weapons.get(slot) else {
            return;
        };
        log::debug!("Switched to {}", weapon.kind.name());
        events.push(GameEvent::WeaponSwitched {
            weapon: weapon.kind,
        });
        self.current_weapon = slot;
    }

    fn use_door(&mut self, events: &mut Vec<GameEvent>) {
        let (sin, cos) = self.player.angle.sin_cos();
        let (x, y) = (self.player.x, self.player.y);
        let here = self.player.cell();
        // The first solid cell ahead decides; doors behind a wall are out of reach.
        let target = USE_REACH
            .into_iter()
            .map(|reach| GridPos::containing(x + cos * reach, y + sin * reach))
            .filter(|pos| *pos != here)
            .find_map(|pos| match self.level.grid.kind(pos) {
                Some(TileKind::Floor) => None,
                Some(TileKind::Door(_)) => Some(Some(pos)),
                Some(TileKind::Wall(_) | TileKind::Exit) | None => Some(None),
            })
            .flatten();
        let Some(pos) = target else {
            return;
        };

        if let Some(door) = self.doors.get(pos)
            && door.locked
            && self.held_keys.contains(&door.color)
        {
            let color = door.color;
            let unlocked = self.doors.unlock(color);
            log::debug!("Unlocked {unlocked} {} door(s)", color.name());
        }

        match self.doors.request_open(pos) {
            OpenOutcome::Opening => {
                log::debug!("Door at ({}, {}) opening", pos.x, pos.y);
                events.push(GameEvent::DoorOpened { pos });
            }
            OpenOutcome::Locked(color) => events.push(GameEvent::DoorLocked { color }),
            OpenOutcome::AlreadyOpen | OpenOutcome::NoDoor => {}
        }
    }

    fn fire(&mut self, events: &mut Vec<GameEvent>) {
        let Some(weapon) = self.weapons.get_mut(self.current_weapon) else {
            return;
        };
        let Some(offsets) = weapon.fire(&mut self.rng) else {
            return;
        };
        let (kind, damage) = (weapon.kind, weapon.damage);
        events.push(GameEvent::WeaponFired { weapon: kind });
        self.effects.muzzle_flash = MUZZLE_FLASH_TICKS;
        self.effects.screen_shake = self.effects.screen_shake.max(FIRE_SHAKE);

        let origin = (self.player.x, self.player.y);
        for offset in offsets {
            let angle = self.player.angle + offset;
            let wall = self
                .caster
                .march(&self.level.grid, &self.doors, origin.0, origin.1, angle)
                .map_or(self.caster.max_depth(), |hit| hit.raw_distance);
            let Some(index) = hitscan(origin, angle, &self.enemies, wall) else {
                continue;
            };
            let Some(enemy) = self.enemies.get_mut(index) else {
                continue;
            };
            let killed = enemy.take_damage(damage);
            events.push(GameEvent::EnemyHit {
                enemy: index,
                damage,
            });
            if killed {
                self.player.kills += 1;
                events.push(GameEvent::EnemyKilled { enemy: index });
            }
        }
    }

    fn collect_items(&mut self, events: &mut Vec<GameEvent>) {
        let (px, py) = (self.player.x, self.player.y);
        let within_reach = |x: f32, y: f32| (x - px).hypot(y - py) < PICKUP_RADIUS;

        let mut picked = Vec::new();
        self.pickups.retain(|pickup| {
            let near = within_reach(pickup.x, pickup.y);
            if near {
                picked.push(pickup.kind);
            }
            !near
        });
        for kind in picked {
            match kind {
                PickupKind::Health => {
                    self.player.heal(HEALTH_PICKUP);
                }
                PickupKind::Armor => {
                    self.player.add_armor(ARMOR_PICKUP, ARMOR_CAP);
                }
                PickupKind::Ammo => {
                    for weapon in &mut self.weapons {
                        weapon.reload(AMMO_PICKUP);
                    }
                }
            }
            events.push(GameEvent::PickupCollected { kind });
        }

        let mut found = Vec::new();
        self.keys.retain(|key| {
            let near = within_reach(key.x, key.y);
            if near {
                found.push(key.color);
            }
            !near
        });
        for color in found {
            log::debug!("Picked up the {} key", color.name());
            self.held_keys.insert(color);
            events.push(GameEvent::KeyCollected { color });
        }
    }

    fn update_enemies(&mut self, events: &mut Vec<GameEvent>) {
        let target = (self.player.x, self.player.y);
        let grid = &self.level.grid;
        let doors = &self.doors;
        let attacks: Vec<u32> = self
            .enemies
            .iter_mut()
            .filter_map(|enemy| enemy.update(target, |pos| walkable(grid, doors, pos)))
            .collect();

        for amount in attacks {
            self.player.take_damage(amount);
            events.push(GameEvent::PlayerDamaged { amount });
            self.effects.damage_flash = DAMAGE_FLASH_TICKS;
            self.effects.screen_shake = self.effects.screen_shake.max(DAMAGE_SHAKE);
            if !self.player.is_alive() {
                log::info!(
                    "Player died on level {} after {} kills",
                    self.level.number,
                    self.player.kills
                );
                self.running = false;
                events.push(GameEvent::PlayerDied);
                return;
            }
        }
    }

    /// Everything the renderer needs for one frame.
    pub fn scene(&self) -> Scene<'_> {
        let enemies = self.enemies.iter().map(|enemy| {
            let alive = enemy.is_alive();
            SpriteInstance {
                x: enemy.x,
                y: enemy.y,
                texture: if alive {
                    TextureId::Enemy
                } else {
                    TextureId::EnemyDead
                },
                scale: 0.8,
                health: alive.then(|| enemy.health_fraction()),
            }
        });
        let pickups = self.pickups.iter().map(|pickup| SpriteInstance {
            x: pickup.x,
            y: pickup.y,
            texture: TextureId::Pickup(pickup.kind),
            scale: 0.4,
            health: None,
        });
        let keys = self.keys.iter().map(|key| SpriteInstance {
            x: key.x,
            y: key.y,
            texture: TextureId::Key(key.color),
            scale: 0.4,
            health: None,
        });
        Scene {
            grid: &self.level.grid,
            doors: &self.doors,
            pose: self.player.pose(),
            sprites: enemies.chain(pickups).chain(keys).collect(),
            weapon: self.weapon().map_or(WeaponKind::Pistol, |weapon| weapon.kind),
            muzzle_flash: self.effects.muzzle_flash as f32 / MUZZLE_FLASH_TICKS as f32,
            damage_flash: self.effects.damage_flash as f32 / DAMAGE_FLASH_TICKS as f32,
            shake: self.effects.screen_shake,
        }
    }
}
