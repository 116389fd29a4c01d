//! Door state machine and the registry that owns every door on a level.
//!
//! Doors only ever open: `Locked -> Closed -> Opening -> Open`. The grid keeps
//! the door's cell code for its whole life; how far it has opened is tracked
//! here.

use crate::grid::{GridPos, KeyColor};
use crate::levelgen::DoorSpawn;
use rustc_hash::FxHashMap;

/// How far a door opens per tick.
pub const DOOR_OPEN_STEP: f32 = 0.05;

/// Past this point the doorway is wide enough to walk through.
const PASSABLE_OPENING: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Locked,
    Closed,
    Opening,
    Open,
}

/// Result of asking a door to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opening,
    AlreadyOpen,
    Locked(KeyColor),
    NoDoor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub pos: GridPos,
    pub color: KeyColor,
    pub locked: bool,
    /// 0 is shut, 1 is fully open. Never decreases.
    pub open_amount: f32,
    pub opening: bool,
}

impl Door {
    pub fn new(pos: GridPos, color: KeyColor, locked: bool) -> Self {
        Self {
            pos,
            color,
            locked,
            open_amount: 0.0,
            opening: false,
        }
    }

    pub fn state(&self) -> DoorState {
        if self.locked {
            DoorState::Locked
        } else if self.open_amount >= 1.0 {
            DoorState::Open
        } else if self.opening {
            DoorState::Opening
        } else {
            DoorState::Closed
        }
    }

    /// Unlock if `key` matches. Returns whether the door is now unlocked.
    pub fn unlock(&mut self, key: KeyColor) -> bool {
        if key == self.color {
            self.locked = false;
        }
        !self.locked
    }

    pub fn request_open(&mut self) -> OpenOutcome {
        match self.state() {
            DoorState::Locked => OpenOutcome::Locked(self.color),
            DoorState::Open => OpenOutcome::AlreadyOpen,
            DoorState::Closed | DoorState::Opening => {
                self.opening = true;
                OpenOutcome::Opening
            }
        }
    }

    pub fn tick(&mut self) {
        if self.opening {
            self.open_amount = (self.open_amount + DOOR_OPEN_STEP).min(1.0);
            if self.open_amount >= 1.0 {
                self.opening = false;
            }
        }
    }

    /// Rays pass only once the door is fully open.
    pub fn blocks_ray(&self) -> bool {
        self.open_amount < 1.0
    }

    pub fn blocks_movement(&self) -> bool {
        self.open_amount <= PASSABLE_OPENING
    }
}

/// All doors of a level, keyed by cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoorRegistry {
    doors: FxHashMap<GridPos, Door>,
}

impl DoorRegistry {
    /// Spawned doors start locked.
    pub fn from_spawns(spawns: &[DoorSpawn]) -> Self {
        let doors = spawns
            .iter()
            .map(|spawn| (spawn.pos, Door::new(spawn.pos, spawn.color, true)))
            .collect();
        Self { doors }
    }

    pub fn insert(&mut self, door: Door) {
        self.doors.insert(door.pos, door);
    }

    pub fn get(&self, pos: GridPos) -> Option<&Door> {
        self.doors.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    /// Unlock every door of `color`, returning how many changed.
    pub fn unlock(&mut self, color: KeyColor) -> usize {
        let mut unlocked = 0;
        #[expect(clippy::iter_over_hash_type, reason = "order not significant for unlocking")]
        for door in self.doors.values_mut() {
            if door.locked && door.color == color {
                door.locked = false;
                unlocked += 1;
            }
        }
        unlocked
    }

    pub fn request_open(&mut self, pos: GridPos) -> OpenOutcome {
        self.doors
            .get_mut(&pos)
            .map_or(OpenOutcome::NoDoor, Door::request_open)
    }

    pub fn tick(&mut self) {
        #[expect(clippy::iter_over_hash_type, reason = "doors animate independently")]
        for door in self.doors.values_mut() {
            door.tick();
        }
    }

    /// Unregistered door cells count as shut.
    pub fn blocks_ray(&self, pos: GridPos) -> bool {
        self.doors.get(&pos).is_none_or(Door::blocks_ray)
    }

    pub fn blocks_movement(&self, pos: GridPos) -> bool {
        self.doors.get(&pos).is_none_or(Door::blocks_movement)
    }
}
