//! UI / presentation helpers.
//!
//! This module owns everything that depends on `egui` for presentation apart
//! from the app shell itself. It reads [`GameState`](crate::game::GameState)
//! and produces visual output; no game logic lives here.

use crate::game::{Door, GameState};
use crate::grid::{GridPos, KeyColor, TileKind};
use crate::render::FrameBuffer;
use egui::{Color32, ColorImage, Painter, Rect, Stroke, pos2, vec2};

/// Minimap tint of one cell.
pub fn minimap_color(code: u8, door: Option<&Door>) -> Color32 {
    match TileKind::classify(code) {
        TileKind::Floor => Color32::from_gray(24),
        TileKind::Wall(_) => Color32::from_gray(110),
        TileKind::Exit => Color32::from_rgb(0x00, 0xcc, 0x44),
        TileKind::Door(color) => {
            let tint = key_color(color);
            match door {
                Some(door) if !door.blocks_movement() => tint.gamma_multiply(0.35),
                _ => tint,
            }
        }
    }
}

pub fn key_color(color: KeyColor) -> Color32 {
    match color {
        KeyColor::Red => Color32::from_rgb(0xcc, 0x22, 0x22),
        KeyColor::Blue => Color32::from_rgb(0x22, 0x55, 0xcc),
        KeyColor::Yellow => Color32::from_rgb(0xdd, 0xbb, 0x22),
    }
}

/// Health readout color, shifting to red as it drops.
pub fn health_color(health: i32) -> Color32 {
    match health {
        h if h > 60 => Color32::from_rgb(0x44, 0xdd, 0x44),
        h if h > 30 => Color32::from_rgb(0xdd, 0xbb, 0x22),
        _ => Color32::from_rgb(0xdd, 0x22, 0x22),
    }
}

/// Copy the software frame into an egui image.
pub fn frame_image(frame: &FrameBuffer) -> ColorImage {
    ColorImage::from_rgba_unmultiplied([frame.width(), frame.height()], &frame.to_rgba())
}

/// The numbers shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hud {
    pub health: i32,
    pub armor: i32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub weapon: &'static str,
    pub kills: u32,
    pub level: u32,
    pub keys: Vec<KeyColor>,
}

impl Hud {
    pub fn of(game: &GameState) -> Self {
        let weapon = game.weapon();
        Self {
            health: game.player.health.max(0),
            armor: game.player.armor,
            ammo: weapon.map_or(0, |w| w.ammo),
            max_ammo: weapon.map_or(0, |w| w.max_ammo),
            weapon: weapon.map_or("None", |w| w.kind.name()),
            kills: game.player.kills,
            level: game.level.number,
            keys: KeyColor::ALL
                .into_iter()
                .filter(|color| game.held_keys.contains(color))
                .collect(),
        }
    }
}

/// Paint the level overview into `rect`, with the player as a dot and a
/// heading tick.
pub fn paint_minimap(painter: &Painter, rect: Rect, game: &GameState) {
    let grid = &game.level.grid;
    let cell = (rect.width() / grid.width() as f32).min(rect.height() / grid.height() as f32);
    if cell <= 0.0 {
        return;
    }
    painter.rect_filled(rect, 0.0, Color32::from_black_alpha(180));

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = GridPos::new(x, y);
            let Some(code) = grid.get(pos) else {
                continue;
            };
            let min = rect.min + vec2(x as f32 * cell, y as f32 * cell);
            let tile = Rect::from_min_size(min, vec2(cell, cell));
            painter.rect_filled(tile, 0.0, minimap_color(code, game.doors.get(pos)));
        }
    }

    let to_screen = |x: f32, y: f32| pos2(rect.min.x + x * cell, rect.min.y + y * cell);
    for enemy in game.enemies.iter().filter(|e| e.is_alive()) {
        painter.circle_filled(to_screen(enemy.x, enemy.y), cell * 0.4, Color32::RED);
    }

    let player = &game.player;
    let centre = to_screen(player.x, player.y);
    let (sin, cos) = player.angle.sin_cos();
    let tip = centre + vec2(cos, sin) * cell * 2.0;
    painter.line_segment([centre, tip], Stroke::new(1.5, Color32::YELLOW));
    painter.circle_filled(centre, cell * 0.6, Color32::YELLOW);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DOOR_RED, EXIT, FLOOR, WALL};
    use crate::settings::Settings;

    #[test]
    fn minimap_colors_by_tile_kind() {
        assert_ne!(minimap_color(FLOOR, None), minimap_color(WALL, None));
        assert_eq!(minimap_color(2, None), minimap_color(WALL, None));
        assert_eq!(minimap_color(EXIT, None), Color32::from_rgb(0x00, 0xcc, 0x44));
        assert_eq!(minimap_color(DOOR_RED, None), key_color(KeyColor::Red));
    }

    #[test]
    fn open_doors_fade_on_the_minimap() {
        let mut door = Door::new(GridPos::new(1, 1), KeyColor::Red, false);
        let shut = minimap_color(DOOR_RED, Some(&door));
        door.open_amount = 1.0;
        assert_ne!(minimap_color(DOOR_RED, Some(&door)), shut);
    }

    #[test]
    fn health_color_bands() {
        assert_eq!(health_color(100), health_color(61));
        assert_ne!(health_color(50), health_color(100));
        assert_eq!(health_color(-5), health_color(10));
    }

    #[test]
    fn frame_converts_to_matching_image() {
        let mut frame = FrameBuffer::new(4, 2);
        frame.put(1, 1, Color32::RED);
        let image = frame_image(&frame);
        assert_eq!(image.size, [4, 2]);
        assert_eq!(image.pixels[5], Color32::RED);
    }

    #[test]
    fn hud_reports_session_state() {
        let mut game = GameState::new(Settings::default(), 9).expect("valid settings");
        game.held_keys.insert(KeyColor::Yellow);
        game.held_keys.insert(KeyColor::Red);
        let hud = Hud::of(&game);
        assert_eq!(hud.health, 100);
        assert_eq!(hud.weapon, "Pistol");
        assert_eq!((hud.ammo, hud.max_ammo), (50, 50));
        assert_eq!(hud.level, 1);
        assert_eq!(hud.keys, vec![KeyColor::Red, KeyColor::Yellow]);
    }
}
