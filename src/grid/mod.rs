//! Tile grid storage and core value types.
//!
//! This module owns the map representation shared by the level generator,
//! the raycaster and the collision code. It is intentionally free of
//! rendering and game-rule concerns.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Cell codes
// ---------------------------------------------------------------------------

pub const FLOOR: u8 = 0;
pub const WALL: u8 = 1;
/// First and last textured wall variants used for room zones.
pub const WALL_ZONE_FIRST: u8 = 2;
pub const WALL_ZONE_LAST: u8 = 4;
pub const DOOR_RED: u8 = 5;
pub const DOOR_BLUE: u8 = 6;
pub const DOOR_YELLOW: u8 = 7;
pub const EXIT: u8 = 9;

// ---------------------------------------------------------------------------
// Core value types
// ---------------------------------------------------------------------------

/// An integer cell coordinate on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing a continuous position.
    pub fn containing(x: f32, y: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Centre of this cell in continuous coordinates.
    pub fn center(self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x, self.y - 1),
            Self::new(self.x, self.y + 1),
            Self::new(self.x - 1, self.y),
            Self::new(self.x + 1, self.y),
        ]
    }
}

/// Key and door colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyColor {
    Red,
    Blue,
    Yellow,
}

impl KeyColor {
    pub const ALL: [Self; 3] = [Self::Red, Self::Blue, Self::Yellow];

    pub const fn door_code(self) -> u8 {
        match self {
            Self::Red => DOOR_RED,
            Self::Blue => DOOR_BLUE,
            Self::Yellow => DOOR_YELLOW,
        }
    }

    pub const fn from_door_code(code: u8) -> Option<Self> {
        match code {
            DOOR_RED => Some(Self::Red),
            DOOR_BLUE => Some(Self::Blue),
            DOOR_YELLOW => Some(Self::Yellow),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }
}

/// What a cell code means to the rest of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    /// Any solid wall. Unknown non-zero codes land here too.
    Wall(u8),
    Door(KeyColor),
    Exit,
}

impl TileKind {
    pub const fn classify(code: u8) -> Self {
        match code {
            FLOOR => Self::Floor,
            EXIT => Self::Exit,
            other => match KeyColor::from_door_code(other) {
                Some(color) => Self::Door(color),
                None => Self::Wall(other),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tile grid
// ---------------------------------------------------------------------------

/// Rectangular grid of cell codes, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    cells: Vec<u8>,
}

impl TileGrid {
    /// A grid with every cell set to `code`.
    pub fn filled(width: i32, height: i32, code: u8) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![code; (width * height) as usize],
        }
    }

    /// Open floor surrounded by a ring of plain walls.
    pub fn bordered(width: i32, height: i32) -> Self {
        let mut grid = Self::filled(width, height, FLOOR);
        for x in 0..width {
            grid.set(GridPos::new(x, 0), WALL);
            grid.set(GridPos::new(x, height - 1), WALL);
        }
        for y in 0..height {
            grid.set(GridPos::new(0, y), WALL);
            grid.set(GridPos::new(width - 1, y), WALL);
        }
        grid
    }

    /// Build a grid from explicit rows.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyGrid`] for no rows or empty rows, [`Error::RaggedGrid`]
    /// when a row differs in length from the first.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(Error::EmptyGrid);
        }
        let height = rows.len();
        let mut cells = Vec::with_capacity(expected * height);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != expected {
                return Err(Error::RaggedGrid {
                    row,
                    expected,
                    found: cols.len(),
                });
            }
            cells.extend(cols);
        }
        Ok(Self {
            width: expected as i32,
            height: height as i32,
            cells,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Cell code at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: GridPos) -> Option<u8> {
        self.index(pos).and_then(|i| self.cells.get(i).copied())
    }

    pub fn kind(&self, pos: GridPos) -> Option<TileKind> {
        self.get(pos).map(TileKind::classify)
    }

    /// Overwrite a cell. Writes outside the grid are ignored.
    pub fn set(&mut self, pos: GridPos, code: u8) {
        if let Some(cell) = self.index(pos).and_then(|i| self.cells.get_mut(i)) {
            *cell = code;
        }
    }

    /// Rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Positions of every cell holding `code`.
    pub fn positions_of(&self, code: u8) -> Vec<GridPos> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| GridPos::new(x, y)))
            .filter(|&pos| self.get(pos) == Some(code))
            .collect()
    }

    /// True when no cell on the outer ring is floor.
    pub fn border_closed(&self) -> bool {
        let top_bottom = (0..self.width)
            .flat_map(|x| [GridPos::new(x, 0), GridPos::new(x, self.height - 1)]);
        let sides = (0..self.height)
            .flat_map(|y| [GridPos::new(0, y), GridPos::new(self.width - 1, y)]);
        top_bottom
            .chain(sides)
            .all(|pos| self.get(pos) != Some(FLOOR))
    }

    /// 4-connected flood fill from `from`, answering whether `to` is reached.
    ///
    /// `passable` decides which cell codes the fill may enter. The start cell
    /// is always entered.
    pub fn reachable(&self, from: GridPos, to: GridPos, passable: impl Fn(u8) -> bool) -> bool {
        if !self.in_bounds(from) || !self.in_bounds(to) {
            return false;
        }
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([from]);
        if let Some(slot) = self.index(from).and_then(|i| seen.get_mut(i)) {
            *slot = true;
        }
        while let Some(pos) = queue.pop_front() {
            if pos == to {
                return true;
            }
            for next in pos.neighbors() {
                let Some(i) = self.index(next) else {
                    continue;
                };
                let Some(code) = self.cells.get(i).copied() else {
                    continue;
                };
                if let Some(slot) = seen.get_mut(i) {
                    if !*slot && passable(code) {
                        *slot = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- construction --------------------------------------------------------

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![1, 1, 1], vec![1, 0], vec![1, 1, 1]];
        assert_eq!(
            TileGrid::from_rows(rows),
            Err(Error::RaggedGrid {
                row: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn from_rows_rejects_empty_input() {
        assert_eq!(TileGrid::from_rows(Vec::new()), Err(Error::EmptyGrid));
        assert_eq!(TileGrid::from_rows(vec![Vec::new()]), Err(Error::EmptyGrid));
    }

    #[test]
    fn from_rows_keeps_row_major_layout() {
        let grid = TileGrid::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]])
            .expect("rectangular rows");
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(GridPos::new(1, 0)), Some(2));
        assert_eq!(grid.get(GridPos::new(0, 2)), Some(5));
        let rows: Vec<&[u8]> = grid.rows().collect();
        assert_eq!(rows, vec![&[1, 2][..], &[3, 4][..], &[5, 6][..]]);
    }

    #[test]
    fn bordered_grid_is_closed() {
        let grid = TileGrid::bordered(16, 16);
        assert!(grid.border_closed());
        assert_eq!(grid.get(GridPos::new(15, 3)), Some(WALL));
        assert_eq!(grid.get(GridPos::new(3, 3)), Some(FLOOR));
    }

    #[test]
    fn open_border_is_detected() {
        let mut grid = TileGrid::bordered(8, 8);
        grid.set(GridPos::new(0, 4), FLOOR);
        assert!(!grid.border_closed());
    }

    // -- lookups -------------------------------------------------------------

    #[test]
    fn out_of_bounds_lookups_return_none() {
        let grid = TileGrid::bordered(4, 4);
        assert_eq!(grid.get(GridPos::new(-1, 0)), None);
        assert_eq!(grid.get(GridPos::new(0, 4)), None);
        assert_eq!(grid.get(GridPos::new(4, 0)), None);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut grid = TileGrid::bordered(4, 4);
        let before = grid.clone();
        grid.set(GridPos::new(10, 10), EXIT);
        assert_eq!(grid, before);
    }

    #[test]
    fn containing_floors_negative_coordinates() {
        assert_eq!(GridPos::containing(3.7, 0.2), GridPos::new(3, 0));
        assert_eq!(GridPos::containing(-0.5, 2.0), GridPos::new(-1, 2));
    }

    // -- classification ------------------------------------------------------

    #[test]
    fn codes_classify_as_documented() {
        assert_eq!(TileKind::classify(0), TileKind::Floor);
        assert_eq!(TileKind::classify(1), TileKind::Wall(1));
        assert_eq!(TileKind::classify(3), TileKind::Wall(3));
        assert_eq!(TileKind::classify(5), TileKind::Door(KeyColor::Red));
        assert_eq!(TileKind::classify(6), TileKind::Door(KeyColor::Blue));
        assert_eq!(TileKind::classify(7), TileKind::Door(KeyColor::Yellow));
        assert_eq!(TileKind::classify(9), TileKind::Exit);
        assert_eq!(TileKind::classify(8), TileKind::Wall(8));
    }

    #[test]
    fn door_codes_round_trip_through_colors() {
        for color in KeyColor::ALL {
            assert_eq!(KeyColor::from_door_code(color.door_code()), Some(color));
        }
    }

    // -- flood fill ----------------------------------------------------------

    #[test]
    fn reachable_follows_passable_cells() {
        let grid = TileGrid::from_rows(vec![
            vec![1, 1, 1, 1, 1],
            vec![1, 0, 1, 0, 1],
            vec![1, 0, 5, 0, 1],
            vec![1, 1, 1, 1, 1],
        ])
        .expect("rectangular rows");
        let from = GridPos::new(1, 1);
        let to = GridPos::new(3, 1);

        assert!(!grid.reachable(from, to, |c| c == FLOOR));
        assert!(grid.reachable(from, to, |c| {
            matches!(TileKind::classify(c), TileKind::Floor | TileKind::Door(_))
        }));
    }

    #[test]
    fn reachable_rejects_out_of_bounds_endpoints() {
        let grid = TileGrid::bordered(6, 6);
        assert!(!grid.reachable(GridPos::new(2, 2), GridPos::new(9, 9), |_| true));
    }
}
