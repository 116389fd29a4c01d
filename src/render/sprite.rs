//! Billboard projection and blitting.

use super::frame::{FrameBuffer, shade};
use super::raycast::Pose;
use super::texture::{Texture, TextureId};
use crate::game::combat::normalize_angle;

/// Sprites closer than this would cover the whole view.
const NEAR_PLANE: f32 = 0.2;

/// A billboard somewhere in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInstance {
    pub x: f32,
    pub y: f32,
    pub texture: TextureId,
    /// Height relative to a wall at the same depth.
    pub scale: f32,
    /// Health bar fill, for sprites that have one.
    pub health: Option<f32>,
}

/// Where a sprite lands on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub screen_x: f32,
    /// Distance along the view direction, comparable with wall depths.
    pub depth: f32,
    /// On-screen height in pixels.
    pub size: f32,
    pub top: f32,
}

/// Project a world point. Sprites outside the field of view, or practically
/// on top of the camera, are culled.
pub fn project(pose: &Pose, x: f32, y: f32, scale: f32, width: usize, height: usize) -> Option<Projection> {
    let dx = x - pose.x;
    let dy = y - pose.y;
    let distance = dx.hypot(dy);
    if distance < NEAR_PLANE {
        return None;
    }
    let relative = normalize_angle(dy.atan2(dx) - pose.angle);
    if relative.abs() > pose.fov / 2.0 {
        return None;
    }
    let depth = distance * relative.cos();
    let screen_h = height as f32;
    let wall = screen_h / depth;
    let size = wall * scale;
    // Stand on the floor line of a wall at the same depth.
    let bottom = screen_h / 2.0 + wall / 2.0;
    Some(Projection {
        screen_x: (relative / pose.fov + 0.5) * width as f32,
        depth,
        size,
        top: bottom - size,
    })
}

/// Painter's order: farthest first.
pub fn sort_far_to_near<T>(items: &mut [(Projection, T)]) {
    items.sort_by(|a, b| b.0.depth.total_cmp(&a.0.depth));
}

/// Draw a projected sprite, column by column, wherever it is nearer than
/// the walls recorded in `depth`. Transparent texels are skipped.
pub fn blit(frame: &mut FrameBuffer, depth: &[f32], texture: &Texture, projection: &Projection, brightness: f32) {
    let aspect = texture.width() as f32 / texture.height().max(1) as f32;
    let sprite_w = projection.size * aspect;
    if sprite_w < 1.0 || projection.size < 1.0 {
        return;
    }
    let left = projection.screen_x - sprite_w / 2.0;
    let first = left.max(0.0) as usize;
    let last = (left + sprite_w).min(frame.width() as f32).max(0.0) as usize;
    let top = projection.top.max(0.0) as i32;
    let bottom = (projection.top + projection.size).min(frame.height() as f32) as i32;

    for column in first..last {
        let Some(&wall) = depth.get(column) else {
            continue;
        };
        if wall <= projection.depth {
            continue;
        }
        let u = (column as f32 + 0.5 - left) / sprite_w;
        for row in top..bottom {
            let v = (row as f32 + 0.5 - projection.top) / projection.size;
            let texel = texture.sample(u, v);
            if texel.a() == 0 {
                continue;
            }
            frame.put(column as i32, row, shade(texel, brightness));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;
    use std::f32::consts::FRAC_PI_3;

    fn pose() -> Pose {
        Pose {
            x: 2.0,
            y: 2.0,
            angle: 0.0,
            fov: FRAC_PI_3,
        }
    }

    fn straight_ahead(depth: f32) -> Projection {
        project(&pose(), 2.0 + depth, 2.0, 1.0, 40, 40).unwrap()
    }

    // -- projection ----------------------------------------------------------

    #[test]
    fn centred_sprite_scales_with_inverse_distance() {
        let near = straight_ahead(2.0);
        let far = straight_ahead(4.0);
        assert!((near.screen_x - 20.0).abs() < 1e-4);
        assert!((near.size - 20.0).abs() < 1e-4);
        assert!((far.size - 10.0).abs() < 1e-4);
        assert!((near.top + near.size - 30.0).abs() < 1e-4, "feet on the floor line");
    }

    #[test]
    fn sprites_outside_the_view_are_culled() {
        assert_eq!(project(&pose(), 0.0, 2.0, 1.0, 40, 40), None);
        assert_eq!(project(&pose(), 2.0, 5.0, 1.0, 40, 40), None);
        assert_eq!(project(&pose(), 2.05, 2.0, 1.0, 40, 40), None);
        assert!(project(&pose(), 5.0, 2.5, 1.0, 40, 40).is_some());
    }

    #[test]
    fn painter_order_is_far_to_near() {
        let mut items = vec![(straight_ahead(2.0), 'a'), (straight_ahead(6.0), 'b'), (straight_ahead(4.0), 'c')];
        sort_far_to_near(&mut items);
        let order: Vec<char> = items.iter().map(|(_, tag)| *tag).collect();
        assert_eq!(order, vec!['b', 'c', 'a']);
    }

    // -- blitting ------------------------------------------------------------

    #[test]
    fn walls_in_front_hide_the_sprite() {
        let texture = Texture::solid(8, 8, Color32::WHITE);
        let projection = straight_ahead(2.0);
        let mut frame = FrameBuffer::new(40, 40);
        blit(&mut frame, &[1.0; 40], &texture, &projection, 1.0);
        assert!(frame.pixels().iter().all(|&p| p == Color32::BLACK));

        blit(&mut frame, &[10.0; 40], &texture, &projection, 1.0);
        assert_eq!(frame.get(20, 25), Some(Color32::WHITE));
    }

    #[test]
    fn transparent_texels_leave_the_background() {
        let texture = Texture::transparent(8, 8);
        let projection = straight_ahead(2.0);
        let mut frame = FrameBuffer::new(40, 40);
        frame.clear(Color32::RED);
        blit(&mut frame, &[10.0; 40], &texture, &projection, 1.0);
        assert!(frame.pixels().iter().all(|&p| p == Color32::RED));
    }
}
