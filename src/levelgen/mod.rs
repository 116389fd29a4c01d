//! Procedural dungeon generation.
//!
//! [`LevelGenerator::generate`] partitions the map with a [`BspNode`] tree,
//! carves rooms and corridors into a [`TileGrid`], then scatters doors, keys,
//! pickups and enemy spawns. All randomness comes from the caller's `Rng`, so
//! a seeded generator reproduces a level exactly.

mod bsp;

pub use bsp::{BspNode, Corridor, Region, Room, RoomLimits, split};

use crate::error::{Error, Result};
use crate::grid::{FLOOR, GridPos, KeyColor, TileGrid, WALL};
use rand::Rng;
use rand::seq::IndexedRandom;
use rustc_hash::FxHashSet;

/// Number of distinct wall zones rooms cycle through.
const ZONE_COUNT: usize = 4;
const MAX_DOORS: u32 = 3;

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickupKind {
    Health,
    Ammo,
    Armor,
}

impl PickupKind {
    /// Weighted draw: 40% health, 20% ammo, 40% armor.
    fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f32 = rng.random();
        if roll < 0.4 {
            Self::Health
        } else if roll < 0.6 {
            Self::Ammo
        } else {
            Self::Armor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Demon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorSpawn {
    pub pos: GridPos,
    pub color: KeyColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySpawn {
    pub x: f32,
    pub y: f32,
    pub color: KeyColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupSpawn {
    pub x: f32,
    pub y: f32,
    pub kind: PickupKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub x: f32,
    pub y: f32,
    pub kind: EnemyKind,
}

/// A generated dungeon and everything placed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub number: u32,
    pub grid: TileGrid,
    /// Player start, in continuous coordinates.
    pub spawn: (f32, f32),
    pub exit: GridPos,
    pub doors: Vec<DoorSpawn>,
    pub keys: Vec<KeySpawn>,
    pub pickups: Vec<PickupSpawn>,
    pub enemies: Vec<EnemySpawn>,
    /// Rooms in generation order. The first holds the spawn, the last the exit.
    pub rooms: Vec<Room>,
    pub corridors: Vec<Corridor>,
    pub tree: BspNode,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelConfig {
    pub width: i32,
    pub height: i32,
    /// Smallest region side a split may produce.
    pub min_leaf: i32,
    pub min_room: i32,
    pub max_room: i32,
    pub corridor_width: i32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            min_leaf: 6,
            min_room: 4,
            max_room: 8,
            corridor_width: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelGenerator {
    config: LevelConfig,
}

impl LevelGenerator {
    /// # Errors
    ///
    /// [`Error::MapTooSmall`] when the map cannot hold a single room, and
    /// [`Error::InvalidSetting`] for inconsistent room, leaf or corridor sizes.
    pub fn new(config: LevelConfig) -> Result<Self> {
        let fits_room = config.min_room + 2;
        if config.width < fits_room || config.height < fits_room {
            return Err(Error::MapTooSmall {
                width: config.width,
                height: config.height,
            });
        }
        if config.min_room < 1 || config.max_room < config.min_room {
            return Err(Error::setting(
                "room size",
                format!("{}..={} is empty", config.min_room, config.max_room),
            ));
        }
        if config.min_leaf < fits_room {
            return Err(Error::setting(
                "min_leaf",
                format!("{} cannot hold a room of {}", config.min_leaf, config.min_room),
            ));
        }
        // Corridors run between room centres; no wider than the smallest
        // room keeps them off the outer ring.
        if config.corridor_width < 1 || config.corridor_width > config.min_room {
            return Err(Error::setting(
                "corridor_width",
                format!("{} is outside 1..={}", config.corridor_width, config.min_room),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Split depth budget for a level number.
    pub fn depth_for(level: u32) -> u32 {
        4 + level / 3
    }

    /// Door count for a level number.
    pub fn doors_for(level: u32) -> usize {
        (1 + level / 2).min(MAX_DOORS) as usize
    }

    pub fn generate<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> Level {
        let cfg = &self.config;
        let root = Region::new(0, 0, cfg.width, cfg.height);
        let limits = RoomLimits {
            min: cfg.min_room,
            max: cfg.max_room,
        };
        let tree = BspNode::partition(root, Self::depth_for(level), cfg.min_leaf, rng)
            .furnish(limits, rng);

        let rooms: Vec<Room> = tree
            .rooms()
            .into_iter()
            .enumerate()
            .map(|(i, room)| Room {
                zone: WALL + (i % ZONE_COUNT) as u8,
                ..room.clone()
            })
            .collect();
        let corridors: Vec<Corridor> = tree.corridors().into_iter().cloned().collect();

        let mut grid = TileGrid::filled(cfg.width, cfg.height, WALL);
        for room in &rooms {
            carve_room(&mut grid, room);
        }
        for corridor in &corridors {
            for (a, b) in corridor.segments() {
                carve_segment(&mut grid, a, b, cfg.corridor_width);
            }
        }

        let doors = place_doors(&mut grid, &rooms, &corridors, level, rng);
        let keys = place_keys(&rooms, &doors);
        let pickups = place_pickups(&rooms, rng);
        let enemies = place_enemies(&rooms, level, rng);

        let (spawn, exit) = match (rooms.first(), rooms.last()) {
            (Some(first), Some(last)) => (first.center.center(), last.center),
            // Unreachable with a validated config: every tree has a leaf room.
            _ => (GridPos::new(cfg.width / 2, cfg.height / 2).center(), GridPos::new(1, 1)),
        };
        grid.set(exit, crate::grid::EXIT);

        log::debug!(
            "level {level}: depth {}, {} rooms, {} corridors, {} doors, {} enemies",
            tree.depth(),
            rooms.len(),
            corridors.len(),
            doors.len(),
            enemies.len()
        );

        Level {
            number: level,
            grid,
            spawn,
            exit,
            doors,
            keys,
            pickups,
            enemies,
            rooms,
            corridors,
            tree,
        }
    }
}

// ---------------------------------------------------------------------------
// Carving
// ---------------------------------------------------------------------------

/// Paint the room's perimeter with its zone wall, then carve its floor.
///
/// The perimeter only replaces cells that are still walls, so an earlier
/// room's floor is never sealed over.
fn carve_room(grid: &mut TileGrid, room: &Room) {
    for y in room.y - 1..=room.y + room.height {
        for x in room.x - 1..=room.x + room.width {
            let pos = GridPos::new(x, y);
            if !room.contains(pos) && grid.get(pos).is_some_and(|code| code != FLOOR) {
                grid.set(pos, room.zone);
            }
        }
    }
    for y in room.y..room.y + room.height {
        for x in room.x..room.x + room.width {
            grid.set(GridPos::new(x, y), FLOOR);
        }
    }
}

/// Carve a straight horizontal or vertical run `width` cells thick.
fn carve_segment(grid: &mut TileGrid, a: GridPos, b: GridPos, width: i32) {
    let lo = -(width / 2);
    let hi = lo + width - 1;
    if a.x == b.x {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for w in lo..=hi {
                grid.set(GridPos::new(a.x + w, y), FLOOR);
            }
        }
    } else {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for w in lo..=hi {
                grid.set(GridPos::new(x, a.y + w), FLOOR);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Content placement
// ---------------------------------------------------------------------------

/// Lock a few corridor corners behind colored doors.
///
/// Corners inside a room are skipped, so doors only stand in corridors and
/// spawn, exit and key cells stay open.
fn place_doors<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    rooms: &[Room],
    corridors: &[Corridor],
    level: u32,
    rng: &mut R,
) -> Vec<DoorSpawn> {
    let mut seen = FxHashSet::default();
    let candidates: Vec<GridPos> = corridors
        .iter()
        .filter_map(Corridor::corner)
        .filter(|corner| {
            !rooms.iter().any(|room| room.contains(*corner)) && seen.insert(*corner)
        })
        .collect();

    let count = LevelGenerator::doors_for(level);
    let doors: Vec<DoorSpawn> = candidates
        .choose_multiple(rng, count)
        .zip(KeyColor::ALL.iter().cycle())
        .map(|(&pos, &color)| DoorSpawn { pos, color })
        .collect();

    for door in &doors {
        grid.set(door.pos, door.color.door_code());
    }
    doors
}

/// The key for the n-th door waits in the room after it in generation order.
fn place_keys(rooms: &[Room], doors: &[DoorSpawn]) -> Vec<KeySpawn> {
    doors
        .iter()
        .zip(rooms.iter().skip(1))
        .map(|(door, room)| {
            let (x, y) = room.center.center();
            KeySpawn {
                x,
                y,
                color: door.color,
            }
        })
        .collect()
}

/// One or two pickups in every room except the spawn room.
fn place_pickups<R: Rng + ?Sized>(rooms: &[Room], rng: &mut R) -> Vec<PickupSpawn> {
    let mut pickups = Vec::new();
    for room in rooms.iter().skip(1) {
        let count = rng.random_range(1..=2);
        for _ in 0..count {
            let kind = PickupKind::roll(rng);
            let spread_x = (room.width - 2).max(0) as f32;
            let spread_y = (room.height - 2).max(0) as f32;
            let dx = (rng.random::<f32>() - 0.5) * spread_x;
            let dy = (rng.random::<f32>() - 0.5) * spread_y;
            pickups.push(PickupSpawn {
                x: room.center.x as f32 + dx + 0.5,
                y: room.center.y as f32 + dy + 0.5,
                kind,
            });
        }
    }
    pickups
}

/// Enemies in every room past the first two, denser on later levels.
fn place_enemies<R: Rng + ?Sized>(rooms: &[Room], level: u32, rng: &mut R) -> Vec<EnemySpawn> {
    let per_room = 1 + level / 2;
    let mut enemies = Vec::new();
    for room in rooms.iter().skip(2) {
        let count = rng.random_range(1..=per_room);
        for _ in 0..count {
            let inner_w = (room.width - 2).max(0) as f32;
            let inner_h = (room.height - 2).max(0) as f32;
            let x = room.x as f32 + 1.0 + rng.random::<f32>() * inner_w;
            let y = room.y as f32 + 1.0 + rng.random::<f32>() * inner_h;
            enemies.push(EnemySpawn {
                x: x + 0.5,
                y: y + 0.5,
                kind: EnemyKind::Demon,
            });
        }
    }
    enemies
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
