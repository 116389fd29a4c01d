//! Fixed-step ray marching over the tile grid.

use crate::error::{Error, Result};
use crate::game::door::DoorRegistry;
use crate::grid::{GridPos, TileGrid, TileKind, WALL};
use crate::settings::Settings;

/// Finest allowed march step; anything smaller costs far too many samples per ray.
pub const MIN_RAY_STEP: f32 = 1e-3;

/// Where the camera stands and looks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub fov: f32,
}

/// Which way the struck face points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Face runs along the y axis (hit from the east or west).
    Vertical,
    /// Face runs along the x axis (hit from the north or south).
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Distance projected onto the view direction.
    pub distance: f32,
    /// Euclidean distance along the ray.
    pub raw_distance: f32,
    /// Code of the struck cell. Cells off the grid report [`WALL`].
    pub code: u8,
    pub cell: GridPos,
    /// Horizontal texture coordinate in `[0, 1)`.
    pub tex_u: f32,
    pub side: Side,
}

impl WallHit {
    fn at(x: f32, y: f32, distance: f32, code: u8, cell: GridPos) -> Self {
        let dx = x - x.floor();
        let dy = y - y.floor();
        let (side, tex_u) = if (dx - 0.5).abs() > (dy - 0.5).abs() {
            (Side::Vertical, dy)
        } else {
            (Side::Horizontal, dx)
        };
        Self {
            distance,
            raw_distance: distance,
            code,
            cell,
            tex_u,
            side,
        }
    }
}

/// Casts one ray per screen strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caster {
    ray_count: usize,
    max_depth: f32,
    step: f32,
}

impl Caster {
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] for zero rays, a non-positive depth,
    /// or a step outside `[MIN_RAY_STEP, 1]`.
    pub fn new(ray_count: usize, max_depth: f32, step: f32) -> Result<Self> {
        if ray_count == 0 {
            return Err(Error::setting("ray_count", "must cast at least one ray"));
        }
        if !max_depth.is_finite() || max_depth <= 0.0 {
            return Err(Error::setting(
                "max_depth",
                format!("{max_depth} is not a positive distance"),
            ));
        }
        if !(MIN_RAY_STEP..=1.0).contains(&step) {
            return Err(Error::setting(
                "ray_step",
                format!("{step} is outside [{MIN_RAY_STEP}, 1]"),
            ));
        }
        Ok(Self {
            ray_count,
            max_depth,
            step,
        })
    }

    /// # Errors
    ///
    /// See [`Caster::new`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.ray_count, settings.max_depth, settings.ray_step)
    }

    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    pub fn max_depth(&self) -> f32 {
        self.max_depth
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn ray_angle(&self, pose: &Pose, column: usize) -> f32 {
        pose.angle - pose.fov / 2.0 + (column as f32 / self.ray_count as f32) * pose.fov
    }

    /// March from `(x, y)` until something opaque is struck. The returned
    /// hit is uncorrected: `distance == raw_distance`.
    pub fn march(
        &self,
        grid: &TileGrid,
        doors: &DoorRegistry,
        x: f32,
        y: f32,
        angle: f32,
    ) -> Option<WallHit> {
        let (sin, cos) = angle.sin_cos();
        let samples = (self.max_depth / self.step).ceil() as u32;
        for n in 1..=samples {
            let distance = n as f32 * self.step;
            if distance > self.max_depth {
                return None;
            }
            let hx = x + cos * distance;
            let hy = y + sin * distance;
            let cell = GridPos::containing(hx, hy);
            let Some(code) = grid.get(cell) else {
                return Some(WallHit::at(hx, hy, distance, WALL, cell));
            };
            let opaque = match TileKind::classify(code) {
                TileKind::Floor => false,
                TileKind::Wall(_) | TileKind::Exit => true,
                TileKind::Door(_) => doors.blocks_ray(cell),
            };
            if opaque {
                return Some(WallHit::at(hx, hy, distance, code, cell));
            }
        }
        None
    }

    /// Cast a ray from the pose and correct its distance for fish-eye.
    pub fn cast(
        &self,
        grid: &TileGrid,
        doors: &DoorRegistry,
        pose: &Pose,
        ray_angle: f32,
    ) -> Option<WallHit> {
        self.march(grid, doors, pose.x, pose.y, ray_angle)
            .map(|hit| WallHit {
                distance: hit.raw_distance * (ray_angle - pose.angle).cos(),
                ..hit
            })
    }

    /// One corrected hit per ray, left to right.
    pub fn cast_all(&self, grid: &TileGrid, doors: &DoorRegistry, pose: &Pose) -> Vec<Option<WallHit>> {
        (0..self.ray_count)
            .map(|column| self.cast(grid, doors, pose, self.ray_angle(pose, column)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::door::Door;
    use crate::grid::{DOOR_RED, EXIT, FLOOR, KeyColor};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

    fn caster() -> Caster {
        Caster::new(320, 20.0, 0.02).unwrap()
    }

    fn pose(x: f32, y: f32, angle: f32) -> Pose {
        Pose {
            x,
            y,
            angle,
            fov: FRAC_PI_3,
        }
    }

    // -- construction ------------------------------------------------------

    #[test]
    fn oversized_step_is_rejected() {
        assert!(Caster::new(320, 20.0, 1.5).is_err());
        assert!(Caster::new(320, 20.0, 1.0).is_ok());
        assert!(Caster::new(0, 20.0, 0.02).is_err());
        assert!(Caster::new(320, -1.0, 0.02).is_err());
    }

    #[test]
    fn needlessly_fine_step_is_rejected() {
        assert!(Caster::new(320, 20.0, 1e-9).is_err());
        assert!(Caster::new(320, 20.0, MIN_RAY_STEP).is_ok());
    }

    #[test]
    fn finest_step_still_stops_at_max_depth() {
        let grid = TileGrid::filled(64, 64, FLOOR);
        let caster = Caster::new(1, 20.0, MIN_RAY_STEP).unwrap();
        assert_eq!(caster.march(&grid, &DoorRegistry::default(), 2.5, 32.5, 0.0), None);
    }

    #[test]
    fn ray_angles_span_the_field_of_view() {
        let caster = caster();
        let pose = pose(3.5, 3.5, 1.0);
        let first = caster.ray_angle(&pose, 0);
        let middle = caster.ray_angle(&pose, 160);
        assert!((first - (1.0 - FRAC_PI_3 / 2.0)).abs() < 1e-6);
        assert!((middle - 1.0).abs() < 1e-6);
    }

    // -- marching ----------------------------------------------------------

    #[test]
    fn east_wall_of_bordered_room() {
        let grid = TileGrid::bordered(16, 16);
        let doors = DoorRegistry::default();
        let hit = caster()
            .cast(&grid, &doors, &pose(3.5, 3.5, 0.0), 0.0)
            .unwrap();
        // The wall ring's near face sits at x = 15.
        assert!((hit.distance - 11.5).abs() <= 0.02 + 1e-4, "{hit:?}");
        assert_eq!(hit.cell, GridPos::new(15, 3));
        assert_eq!(hit.code, WALL);
        assert_eq!(hit.side, Side::Vertical);
        assert!((hit.tex_u - 0.5).abs() < 1e-3);
    }

    #[test]
    fn straight_ahead_ray_needs_no_correction() {
        let grid = TileGrid::bordered(16, 16);
        let doors = DoorRegistry::default();
        let pose = pose(4.2, 6.7, 0.7);
        let hit = caster().cast(&grid, &doors, &pose, pose.angle).unwrap();
        assert_eq!(hit.distance, hit.raw_distance);
    }

    #[test]
    fn oblique_rays_are_shortened() {
        let grid = TileGrid::bordered(16, 16);
        let doors = DoorRegistry::default();
        let pose = pose(8.0, 8.0, 0.0);
        let hit = caster().cast(&grid, &doors, &pose, 0.4).unwrap();
        assert!(hit.distance < hit.raw_distance);
        assert!((hit.distance - hit.raw_distance * 0.4_f32.cos()).abs() < 1e-4);
    }

    #[test]
    fn open_map_returns_nothing_past_max_depth() {
        let grid = TileGrid::filled(64, 64, FLOOR);
        let doors = DoorRegistry::default();
        assert_eq!(caster().march(&grid, &doors, 2.5, 32.5, 0.0), None);
    }

    #[test]
    fn wall_just_inside_max_depth_is_hit() {
        let mut grid = TileGrid::filled(64, 64, FLOOR);
        // Near face at x = 22, 19.5 from the origin.
        for y in 0..64 {
            grid.set(GridPos::new(22, y), WALL);
        }
        let doors = DoorRegistry::default();
        let hit = caster().march(&grid, &doors, 2.5, 32.5, 0.0).unwrap();
        assert!((hit.raw_distance - 19.5).abs() <= 0.02 + 1e-3, "{hit:?}");
    }

    #[test]
    fn leaving_the_grid_counts_as_a_default_wall() {
        let grid = TileGrid::filled(8, 8, FLOOR);
        let doors = DoorRegistry::default();
        let hit = caster().march(&grid, &doors, 4.5, 4.5, 0.0).unwrap();
        assert_eq!(hit.code, WALL);
        assert!(!grid.in_bounds(hit.cell));
        assert!((hit.raw_distance - 3.5).abs() <= 0.02 + 1e-4);
    }

    #[test]
    fn north_facing_hits_sample_along_x() {
        let grid = TileGrid::bordered(16, 16);
        let doors = DoorRegistry::default();
        let hit = caster()
            .march(&grid, &doors, 5.25, 8.5, -FRAC_PI_2)
            .unwrap();
        assert_eq!(hit.side, Side::Horizontal);
        assert!((hit.tex_u - 0.25).abs() < 1e-3, "{hit:?}");
    }

    #[test]
    fn doors_block_until_fully_open() {
        let mut grid = TileGrid::bordered(16, 16);
        let door_cell = GridPos::new(8, 4);
        grid.set(door_cell, DOOR_RED);
        let mut doors = DoorRegistry::default();
        doors.insert(Door::new(door_cell, KeyColor::Red, false));

        let caster = caster();
        let hit = caster.march(&grid, &doors, 3.5, 4.5, 0.0).unwrap();
        assert_eq!(hit.cell, door_cell);

        doors.request_open(door_cell);
        for _ in 0..15 {
            doors.tick();
        }
        let hit = caster.march(&grid, &doors, 3.5, 4.5, 0.0).unwrap();
        assert_eq!(hit.cell, door_cell, "half-open doors still block");

        for _ in 0..20 {
            doors.tick();
        }
        let hit = caster.march(&grid, &doors, 3.5, 4.5, 0.0).unwrap();
        assert_eq!(hit.cell, GridPos::new(15, 4));
    }

    #[test]
    fn exit_cells_are_visible() {
        let mut grid = TileGrid::bordered(16, 16);
        grid.set(GridPos::new(6, 4), EXIT);
        let doors = DoorRegistry::default();
        let hit = caster().march(&grid, &doors, 3.5, 4.5, 0.0).unwrap();
        assert_eq!(hit.code, EXIT);
    }

    #[test]
    fn cast_all_yields_one_entry_per_ray() {
        let grid = TileGrid::bordered(16, 16);
        let doors = DoorRegistry::default();
        let caster = Caster::new(40, 20.0, 0.05).unwrap();
        let hits = caster.cast_all(&grid, &doors, &pose(8.0, 8.0, 0.3));
        assert_eq!(hits.len(), 40);
        assert!(hits.iter().all(Option::is_some));
    }
}
