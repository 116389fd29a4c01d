//! Procedurally painted wall textures and sprites.

use crate::grid::{KeyColor, TileKind, WALL};
use crate::levelgen::PickupKind;
use egui::Color32;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

pub const TEXTURE_SIZE: usize = 64;

/// Stone speckle is random but must look the same every run.
const STONE_SEED: u64 = 0x5701_5eed;

const fn hex(rgb: u32) -> Color32 {
    Color32::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureId {
    /// Wall textures by cell code.
    Wall(u8),
    Door(KeyColor),
    Exit,
    Floor,
    Ceiling,
    Enemy,
    EnemyDead,
    Pickup(PickupKind),
    Key(KeyColor),
    Pistol,
    Shotgun,
}

impl TextureId {
    pub const DEFAULT_WALL: Self = Self::Wall(WALL);

    /// The texture painted on a solid cell.
    pub const fn for_cell(code: u8) -> Self {
        match TileKind::classify(code) {
            TileKind::Door(color) => Self::Door(color),
            TileKind::Exit => Self::Exit,
            TileKind::Wall(code) => Self::Wall(code),
            TileKind::Floor => Self::DEFAULT_WALL,
        }
    }
}

// ---------------------------------------------------------------------------
// Texture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<Color32>,
}

impl Texture {
    pub fn solid(width: usize, height: usize, color: Color32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn transparent(width: usize, height: usize) -> Self {
        Self::solid(width, height, Color32::TRANSPARENT)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Texel lookup; out of range reads are transparent.
    pub fn texel(&self, x: usize, y: usize) -> Color32 {
        if x >= self.width {
            return Color32::TRANSPARENT;
        }
        self.pixels
            .get(y * self.width + x)
            .copied()
            .unwrap_or(Color32::TRANSPARENT)
    }

    /// Sample with normalized coordinates, clamped to the edges.
    pub fn sample(&self, u: f32, v: f32) -> Color32 {
        let x = (u.clamp(0.0, 1.0) * self.width as f32) as usize;
        let y = (v.clamp(0.0, 1.0) * self.height as f32) as usize;
        self.texel(
            x.min(self.width.saturating_sub(1)),
            y.min(self.height.saturating_sub(1)),
        )
    }

    fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, color: Color32) {
        let x1 = (x + width).min(self.width);
        let y1 = (y + height).min(self.height);
        for row in y.min(y1)..y1 {
            let start = row * self.width;
            if let Some(span) = self.pixels.get_mut(start + x.min(x1)..start + x1) {
                span.fill(color);
            }
        }
    }

    fn stroke_rect(&mut self, x: usize, y: usize, width: usize, height: usize, line: usize, color: Color32) {
        self.fill_rect(x, y, width, line, color);
        self.fill_rect(x, (y + height).saturating_sub(line), width, line, color);
        self.fill_rect(x, y, line, height, color);
        self.fill_rect((x + width).saturating_sub(line), y, line, height, color);
    }

    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color32) {
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0
                    && let Some(pixel) = self.pixels.get_mut(y * self.width + x)
                {
                    *pixel = color;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Painters
// ---------------------------------------------------------------------------

fn brick(base: Color32, brick: Color32) -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, base);
    for (course, y) in (0..TEXTURE_SIZE).step_by(16).enumerate() {
        let offset = if course % 2 == 0 { 0 } else { 16 };
        for x in (0..TEXTURE_SIZE).step_by(32) {
            tex.fill_rect(x + offset, y, 30, 14, brick);
        }
        if offset > 0 {
            tex.fill_rect(0, y, 14, 14, brick);
        }
        tex.fill_rect(0, y, TEXTURE_SIZE, 2, Color32::BLACK);
    }
    tex
}

fn stone(base: Color32, speckle: Color32, rng: &mut SmallRng) -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, base);
    for _ in 0..50 {
        let color = if rng.random_bool(0.5) { speckle } else { base };
        let x = rng.random_range(0..TEXTURE_SIZE);
        let y = rng.random_range(0..TEXTURE_SIZE);
        let size = rng.random_range(2..10);
        tex.fill_rect(x, y, size, size, color);
    }
    tex
}

fn panel(base: Color32, trim: Color32) -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, base);
    tex.stroke_rect(4, 4, 56, 56, 3, trim);
    tex.stroke_rect(8, 8, 48, 48, 3, trim);
    tex
}

fn tech(base: Color32, line: Color32) -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, base);
    for i in 0..5 {
        tex.fill_rect(0, i * 12, TEXTURE_SIZE, 2, line);
    }
    for i in 0..4 {
        tex.fill_rect(8 + i * 16, 8, 4, 4, hex(0x00ff00));
    }
    tex
}

fn tiles(base: Color32, grout: Color32) -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, base);
    for y in (0..TEXTURE_SIZE).step_by(32) {
        for x in (0..TEXTURE_SIZE).step_by(32) {
            tex.stroke_rect(x, y, 32, 32, 1, grout);
        }
    }
    tex
}

const fn key_tint(color: KeyColor) -> Color32 {
    match color {
        KeyColor::Red => hex(0xcc2222),
        KeyColor::Blue => hex(0x2255cc),
        KeyColor::Yellow => hex(0xddbb22),
    }
}

fn door(color: KeyColor) -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, hex(0x3c3c44));
    tex.stroke_rect(0, 0, TEXTURE_SIZE, TEXTURE_SIZE, 4, hex(0x222228));
    tex.fill_rect(31, 4, 2, 56, hex(0x18181c));
    tex.fill_rect(4, 26, 56, 12, key_tint(color));
    tex.fill_rect(24, 28, 4, 8, hex(0x111111));
    tex.fill_rect(36, 28, 4, 8, hex(0x111111));
    tex
}

fn exit_sign() -> Texture {
    let mut tex = Texture::solid(TEXTURE_SIZE, TEXTURE_SIZE, hex(0x101010));
    for (i, x) in (0..TEXTURE_SIZE).step_by(8).enumerate() {
        let color = if i % 2 == 0 { hex(0x00cc44) } else { hex(0xeeeeee) };
        tex.fill_rect(x, 0, 8, 6, color);
        tex.fill_rect(x, 58, 8, 6, color);
    }
    tex.fill_rect(12, 22, 40, 20, hex(0x00aa33));
    tex.stroke_rect(12, 22, 40, 20, 2, hex(0xeeeeee));
    tex
}

fn demon() -> Texture {
    let mut tex = Texture::transparent(TEXTURE_SIZE, TEXTURE_SIZE);
    tex.fill_rect(20, 20, 24, 35, hex(0x8b0000));
    tex.fill_rect(22, 15, 20, 15, hex(0xa52a2a));
    tex.fill_rect(20, 12, 6, 8, hex(0x654321));
    tex.fill_rect(38, 12, 6, 8, hex(0x654321));
    tex.fill_rect(26, 20, 4, 4, hex(0xff0000));
    tex.fill_rect(34, 20, 4, 4, hex(0xff0000));
    tex.fill_rect(14, 25, 6, 20, hex(0x8b0000));
    tex.fill_rect(44, 25, 6, 20, hex(0x8b0000));
    tex.fill_rect(24, 55, 6, 9, hex(0x8b0000));
    tex.fill_rect(34, 55, 6, 9, hex(0x8b0000));
    tex.stroke_rect(20, 20, 24, 35, 2, Color32::BLACK);
    tex
}

fn corpse() -> Texture {
    let mut tex = Texture::transparent(TEXTURE_SIZE, TEXTURE_SIZE);
    tex.fill_ellipse(32.0, 52.0, 25.0, 8.0, hex(0x8b0000));
    tex.fill_rect(10, 44, 44, 12, hex(0x4a0000));
    tex
}

fn pickup(kind: PickupKind) -> Texture {
    let mut tex = Texture::transparent(TEXTURE_SIZE, TEXTURE_SIZE);
    match kind {
        PickupKind::Health => {
            tex.fill_rect(12, 20, 40, 40, hex(0xeeeeee));
            tex.fill_rect(28, 24, 8, 32, hex(0xcc0000));
            tex.fill_rect(16, 36, 32, 8, hex(0xcc0000));
        }
        PickupKind::Ammo => {
            tex.fill_rect(10, 36, 44, 24, hex(0x5a4a1a));
            for i in 0..4 {
                tex.fill_rect(14 + i * 10, 22, 6, 16, hex(0xd4a017));
            }
        }
        PickupKind::Armor => {
            tex.fill_rect(16, 20, 32, 40, hex(0x2e7d32));
            tex.fill_rect(26, 20, 12, 8, Color32::TRANSPARENT);
            tex.stroke_rect(16, 20, 32, 40, 2, hex(0x1b4d1e));
        }
    }
    tex
}

fn key(color: KeyColor) -> Texture {
    let mut tex = Texture::transparent(TEXTURE_SIZE, TEXTURE_SIZE);
    let tint = key_tint(color);
    tex.fill_ellipse(22.0, 40.0, 10.0, 10.0, tint);
    tex.fill_ellipse(22.0, 40.0, 4.0, 4.0, Color32::TRANSPARENT);
    tex.fill_rect(30, 38, 24, 5, tint);
    tex.fill_rect(46, 43, 4, 8, tint);
    tex.fill_rect(40, 43, 4, 6, tint);
    tex
}

fn pistol() -> Texture {
    let mut tex = Texture::transparent(80, 120);
    tex.fill_rect(25, 40, 30, 50, hex(0x333333));
    tex.fill_rect(35, 20, 10, 30, hex(0x222222));
    tex.fill_rect(30, 70, 20, 30, hex(0x654321));
    tex.fill_rect(40, 75, 6, 10, hex(0x888888));
    tex.fill_rect(27, 42, 4, 40, hex(0x666666));
    tex.fill_rect(37, 22, 4, 25, hex(0x666666));
    tex
}

fn shotgun() -> Texture {
    let mut tex = Texture::transparent(100, 120);
    tex.fill_rect(10, 60, 40, 20, hex(0x654321));
    tex.fill_rect(20, 45, 60, 25, hex(0x333333));
    tex.fill_rect(35, 25, 12, 30, hex(0x222222));
    tex.fill_rect(53, 25, 12, 30, hex(0x222222));
    tex.fill_rect(50, 55, 20, 10, hex(0x654321));
    tex.fill_rect(37, 27, 10, 25, hex(0x555555));
    tex.fill_rect(55, 27, 10, 25, hex(0x555555));
    tex
}

// ---------------------------------------------------------------------------
// Atlas
// ---------------------------------------------------------------------------

/// Every texture the renderer needs, keyed by [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    textures: FxHashMap<TextureId, Texture>,
    fallback: Texture,
}

impl Default for TextureAtlas {
    fn default() -> Self {
        Self::generate()
    }
}

impl TextureAtlas {
    pub fn generate() -> Self {
        let mut rng = SmallRng::seed_from_u64(STONE_SEED);
        let fallback = brick(hex(0x8b0000), hex(0x650000));

        let mut textures = FxHashMap::default();
        textures.insert(TextureId::DEFAULT_WALL, fallback.clone());
        textures.insert(TextureId::Wall(2), stone(hex(0x666666), hex(0x444444), &mut rng));
        textures.insert(TextureId::Wall(3), panel(hex(0x654321), hex(0x543210)));
        textures.insert(TextureId::Wall(4), tech(hex(0x006400), hex(0x004400)));
        textures.insert(TextureId::Floor, tiles(hex(0x4a4a4a), hex(0x3a3a3a)));
        textures.insert(TextureId::Ceiling, tiles(hex(0x2a2a2a), hex(0x1a1a1a)));
        textures.insert(TextureId::Exit, exit_sign());
        textures.insert(TextureId::Enemy, demon());
        textures.insert(TextureId::EnemyDead, corpse());
        textures.insert(TextureId::Pistol, pistol());
        textures.insert(TextureId::Shotgun, shotgun());
        for color in KeyColor::ALL {
            textures.insert(TextureId::Door(color), door(color));
            textures.insert(TextureId::Key(color), key(color));
        }
        for kind in [PickupKind::Health, PickupKind::Ammo, PickupKind::Armor] {
            textures.insert(TextureId::Pickup(kind), pickup(kind));
        }
        Self { textures, fallback }
    }

    /// Unknown ids get the default wall.
    pub fn get(&self, id: TextureId) -> &Texture {
        self.textures.get(&id).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
