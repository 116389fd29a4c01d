//! Software renderer: turns a [`Scene`] into pixels in a [`FrameBuffer`].
//!
//! Drawing happens in passes: floor and ceiling planes, textured wall
//! columns (recording a depth per screen column), depth-tested sprite
//! billboards, then the crosshair, weapon and full-screen flashes.

pub mod frame;
pub mod raycast;
pub mod sprite;
pub mod texture;

pub use frame::FrameBuffer;
pub use raycast::{Caster, Pose, Side, WallHit};
pub use sprite::{Projection, SpriteInstance};
pub use texture::{Texture, TextureAtlas, TextureId};

use crate::error::Result;
use crate::game::DoorRegistry;
use crate::game::combat::WeaponKind;
use crate::grid::TileGrid;
use crate::settings::Settings;
use egui::Color32;
use frame::shade;

/// Darkest a distant surface gets.
pub const MIN_SHADE: f32 = 0.3;
/// Horizontal-facing walls are lit a little less.
pub const HORIZONTAL_SHADE: f32 = 0.8;
/// Projected half-height of a wall is `(screen_height / distance) * WALL_SCALE`.
pub const WALL_SCALE: f32 = 0.5;

const CROSSHAIR: i32 = 8;
const MUZZLE_COLOR: Color32 = Color32::from_rgb(0xff, 0xdd, 0x55);
const DAMAGE_COLOR: Color32 = Color32::from_rgb(0xcc, 0x00, 0x00);
const BAR_GOOD: Color32 = Color32::from_rgb(0x00, 0xcc, 0x00);
const BAR_LOW: Color32 = Color32::from_rgb(0xdd, 0x00, 0x00);
const BAR_BACK: Color32 = Color32::from_rgb(0x30, 0x00, 0x00);

/// A read-only view of everything visible this frame.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub grid: &'a TileGrid,
    pub doors: &'a DoorRegistry,
    pub pose: Pose,
    pub sprites: Vec<SpriteInstance>,
    pub weapon: WeaponKind,
    /// Flash strengths in `[0, 1]`.
    pub muzzle_flash: f32,
    pub damage_flash: f32,
    /// Remaining shake ticks.
    pub shake: u32,
}

/// Brightness of a wall at `distance`.
pub fn wall_shade(distance: f32, max_depth: f32, side: Side) -> f32 {
    let falloff = (1.0 - distance / max_depth).max(MIN_SHADE);
    match side {
        Side::Vertical => falloff,
        Side::Horizontal => falloff * HORIZONTAL_SHADE,
    }
}

/// Top row and height of a wall slice at `distance`, centred on the horizon.
pub fn wall_span(screen_height: usize, distance: f32) -> (f32, f32) {
    let h = screen_height as f32;
    let half = (h / distance.max(1e-4)) * WALL_SCALE;
    (h / 2.0 - half, half * 2.0)
}

#[derive(Debug, Clone)]
pub struct Renderer {
    caster: Caster,
    atlas: TextureAtlas,
    depth: Vec<f32>,
}

impl Renderer {
    pub fn new(caster: Caster) -> Self {
        Self {
            caster,
            atlas: TextureAtlas::generate(),
            depth: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Fails when the ray settings are invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Caster::from_settings(settings).map(Self::new)
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    /// Wall distance per screen column from the last frame.
    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth
    }

    pub fn render(&mut self, scene: &Scene<'_>, frame: &mut FrameBuffer) {
        self.depth.clear();
        self.depth.resize(frame.width(), f32::INFINITY);

        self.draw_planes(&scene.pose, frame);
        self.draw_walls(scene, frame);
        self.draw_sprites(scene, frame);
        draw_crosshair(frame);
        self.draw_weapon(scene, frame);
        draw_flashes(scene, frame);
    }

    /// Perspective-correct floor and ceiling, mirrored about the horizon.
    fn draw_planes(&self, pose: &Pose, frame: &mut FrameBuffer) {
        let (w, h) = (frame.width(), frame.height());
        let floor = self.atlas.get(TextureId::Floor);
        let ceiling = self.atlas.get(TextureId::Ceiling);
        let horizon = h as f32 / 2.0;

        // Per column: ray direction scaled so that multiplying by a
        // perpendicular distance lands on the floor point.
        let rays: Vec<(f32, f32)> = (0..w)
            .map(|x| {
                let angle = pose.angle - pose.fov / 2.0 + (x as f32 / w as f32) * pose.fov;
                let stretch = 1.0 / (angle - pose.angle).cos();
                (angle.cos() * stretch, angle.sin() * stretch)
            })
            .collect();

        for y in h / 2..h {
            let offset = y as f32 + 0.5 - horizon;
            let distance = h as f32 * WALL_SCALE / offset;
            let brightness = (1.0 - distance / self.caster.max_depth()).max(MIN_SHADE);
            let mirrored = (h - 1 - y) as i32;
            for (x, &(dx, dy)) in rays.iter().enumerate() {
                let wx = pose.x + dx * distance;
                let wy = pose.y + dy * distance;
                let (u, v) = (wx - wx.floor(), wy - wy.floor());
                frame.put(x as i32, y as i32, shade(floor.sample(u, v), brightness));
                frame.put(x as i32, mirrored, shade(ceiling.sample(u, v), brightness));
            }
        }
    }

    fn draw_walls(&mut self, scene: &Scene<'_>, frame: &mut FrameBuffer) {
        let hits = self.caster.cast_all(scene.grid, scene.doors, &scene.pose);
        let (w, h) = (frame.width(), frame.height());
        let rays = hits.len().max(1);

        for (ray, hit) in hits.iter().enumerate() {
            let Some(hit) = hit else {
                continue;
            };
            let x0 = ray * w / rays;
            let x1 = ((ray + 1) * w / rays).max(x0 + 1).min(w);
            let texture = self.atlas.get(TextureId::for_cell(hit.code));
            let brightness = wall_shade(hit.distance, self.caster.max_depth(), hit.side);
            let (top, height) = wall_span(h, hit.distance);
            let first = top.max(0.0) as usize;
            let last = (top + height).min(h as f32).max(0.0) as usize;

            for x in x0..x1 {
                if let Some(slot) = self.depth.get_mut(x) {
                    *slot = hit.distance;
                }
            }
            for y in first..last {
                let v = (y as f32 + 0.5 - top) / height;
                let color = shade(texture.sample(hit.tex_u, v), brightness);
                for x in x0..x1 {
                    frame.put(x as i32, y as i32, color);
                }
            }
        }
    }

    fn draw_sprites(&self, scene: &Scene<'_>, frame: &mut FrameBuffer) {
        let (w, h) = (frame.width(), frame.height());
        let mut visible: Vec<(Projection, &SpriteInstance)> = scene
            .sprites
            .iter()
            .filter_map(|s| sprite::project(&scene.pose, s.x, s.y, s.scale, w, h).map(|p| (p, s)))
            .collect();
        sprite::sort_far_to_near(&mut visible);

        for (projection, instance) in visible {
            let texture = self.atlas.get(instance.texture);
            let brightness = (1.0 - projection.depth / self.caster.max_depth()).max(MIN_SHADE);
            sprite::blit(frame, &self.depth, texture, &projection, brightness);
            if let Some(health) = instance.health {
                self.draw_health_bar(frame, &projection, health);
            }
        }
    }

    fn draw_health_bar(&self, frame: &mut FrameBuffer, projection: &Projection, health: f32) {
        let centre = projection.screen_x as usize;
        let hidden = self
            .depth
            .get(centre)
            .is_none_or(|&wall| wall <= projection.depth);
        if hidden {
            return;
        }
        let width = (projection.size * 0.6).max(4.0);
        let height = (projection.size * 0.05).max(2.0) as i32;
        let x = (projection.screen_x - width / 2.0) as i32;
        let y = projection.top as i32 - height - 2;
        let fill = (width * health.clamp(0.0, 1.0)) as i32;
        let color = if health > 0.3 { BAR_GOOD } else { BAR_LOW };
        frame.fill_rect(x, y, width as i32, height, BAR_BACK);
        frame.fill_rect(x, y, fill, height, color);
    }

    fn draw_weapon(&self, scene: &Scene<'_>, frame: &mut FrameBuffer) {
        let id = match scene.weapon {
            WeaponKind::Pistol => TextureId::Pistol,
            WeaponKind::Shotgun => TextureId::Shotgun,
        };
        let texture = self.atlas.get(id);
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let scale = 1.5 * h / 400.0;
        let draw_w = texture.width() as f32 * scale;
        let draw_h = texture.height() as f32 * scale;

        let kick = scene.shake as f32;
        let shake_x = (kick * 2.3).sin() * kick;
        let shake_y = (kick * 1.7).cos().abs() * kick * 0.5;
        let left = (w - draw_w) / 2.0 + shake_x;
        let top = h - draw_h + shake_y;

        if scene.muzzle_flash > 0.0 {
            let size = 36.0 * scale;
            frame.blend_rect(
                (w / 2.0 - size / 2.0 + shake_x) as i32,
                (top - size * 0.6) as i32,
                size as i32,
                size as i32,
                MUZZLE_COLOR,
                scene.muzzle_flash,
            );
        }

        for dy in 0..draw_h as usize {
            let v = (dy as f32 + 0.5) / draw_h;
            for dx in 0..draw_w as usize {
                let texel = texture.sample((dx as f32 + 0.5) / draw_w, v);
                if texel.a() == 0 {
                    continue;
                }
                frame.put((left + dx as f32) as i32, (top + dy as f32) as i32, texel);
            }
        }
    }
}

fn draw_crosshair(frame: &mut FrameBuffer) {
    let cx = frame.width() as i32 / 2;
    let cy = frame.height() as i32 / 2;
    frame.fill_rect(cx - CROSSHAIR, cy, CROSSHAIR * 2 + 1, 1, Color32::WHITE);
    frame.fill_rect(cx, cy - CROSSHAIR, 1, CROSSHAIR * 2 + 1, Color32::WHITE);
}

fn draw_flashes(scene: &Scene<'_>, frame: &mut FrameBuffer) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    if scene.muzzle_flash > 0.0 {
        frame.blend_rect(0, 0, w, h, MUZZLE_COLOR, scene.muzzle_flash * 0.12);
    }
    if scene.damage_flash > 0.0 {
        frame.blend_rect(0, 0, w, h, DAMAGE_COLOR, scene.damage_flash * 0.4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::grid::{EXIT, FLOOR, GridPos};
    use crate::levelgen::{BspNode, EnemyKind, EnemySpawn, Level, Region};
    use std::f32::consts::FRAC_PI_3;

    fn room() -> TileGrid {
        TileGrid::bordered(16, 16)
    }

    fn scene<'a>(grid: &'a TileGrid, doors: &'a DoorRegistry) -> Scene<'a> {
        Scene {
            grid,
            doors,
            pose: Pose {
                x: 8.0,
                y: 8.0,
                angle: 0.0,
                fov: FRAC_PI_3,
            },
            sprites: Vec::new(),
            weapon: WeaponKind::Pistol,
            muzzle_flash: 0.0,
            damage_flash: 0.0,
            shake: 0,
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(Caster::new(64, 20.0, 0.02).unwrap())
    }

    // -- shading -------------------------------------------------------------

    #[test]
    fn shade_falls_off_to_a_floor() {
        assert!((wall_shade(0.0, 20.0, Side::Vertical) - 1.0).abs() < 1e-6);
        assert!((wall_shade(10.0, 20.0, Side::Vertical) - 0.5).abs() < 1e-6);
        assert!((wall_shade(19.0, 20.0, Side::Vertical) - MIN_SHADE).abs() < 1e-6);
        assert!((wall_shade(10.0, 20.0, Side::Horizontal) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn nearer_walls_are_taller() {
        let (near_top, near_h) = wall_span(400, 2.0);
        let (far_top, far_h) = wall_span(400, 8.0);
        assert!((near_h - 200.0).abs() < 1e-3);
        assert!((far_h - 50.0).abs() < 1e-3);
        assert!(near_top < far_top);
        assert!((near_top + near_h / 2.0 - 200.0).abs() < 1e-3, "centred on horizon");
    }

    // -- frames --------------------------------------------------------------

    #[test]
    fn enclosed_room_fills_every_depth_column() {
        let grid = room();
        let doors = DoorRegistry::default();
        let mut frame = FrameBuffer::new(64, 40);
        let mut renderer = renderer();
        renderer.render(&scene(&grid, &doors), &mut frame);
        assert_eq!(renderer.depth_buffer().len(), 64);
        assert!(renderer.depth_buffer().iter().all(|d| d.is_finite() && *d > 0.0));
        // Straight ahead the east wall face is seven cells away.
        let centre = renderer.depth_buffer()[32];
        assert!((centre - 7.0).abs() < 0.1, "{centre}");
    }

    #[test]
    fn missing_walls_leave_infinite_depth() {
        let grid = TileGrid::filled(64, 64, FLOOR);
        let doors = DoorRegistry::default();
        let mut frame = FrameBuffer::new(64, 40);
        let mut renderer = renderer();
        let mut view = scene(&grid, &doors);
        view.pose.x = 32.0;
        view.pose.y = 32.0;
        renderer.render(&view, &mut frame);
        assert!(renderer.depth_buffer().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn damage_flash_tints_the_frame_red() {
        let grid = room();
        let doors = DoorRegistry::default();
        let mut calm = FrameBuffer::new(64, 40);
        let mut hurt = FrameBuffer::new(64, 40);
        let mut renderer = renderer();
        let mut view = scene(&grid, &doors);
        renderer.render(&view, &mut calm);
        view.damage_flash = 1.0;
        renderer.render(&view, &mut hurt);
        let (Some(a), Some(b)) = (calm.get(2, 2), hurt.get(2, 2)) else {
            panic!("pixel out of range");
        };
        assert!(b.r() > a.r());
    }

    #[test]
    fn game_scene_renders_without_panicking() {
        let mut grid = room();
        grid.set(GridPos::new(12, 12), EXIT);
        let level = Level {
            number: 1,
            grid,
            spawn: (3.5, 3.5),
            exit: GridPos::new(12, 12),
            doors: Vec::new(),
            keys: Vec::new(),
            pickups: Vec::new(),
            enemies: vec![EnemySpawn {
                x: 6.5,
                y: 3.5,
                kind: EnemyKind::Demon,
            }],
            rooms: Vec::new(),
            corridors: Vec::new(),
            tree: BspNode::leaf(Region::new(0, 0, 16, 16)),
        };
        let game = GameState::with_level(Settings::default(), level, 5).unwrap();
        let mut frame = FrameBuffer::new(160, 100);
        let mut renderer = Renderer::from_settings(&game.settings).unwrap();
        renderer.render(&game.scene(), &mut frame);
        // The demon's body sits just left of the crosshair.
        let body = frame.get(76, 52).unwrap();
        assert!(body.r() > 100 && body.g() < 10, "{body:?}");
    }
}
