//! User-tunable configuration, persisted through eframe storage.

use crate::error::{Error, Result};
use crate::render::raycast::MIN_RAY_STEP;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub screen_width: usize,
    pub screen_height: usize,
    /// Number of rays cast per frame, one per screen column strip.
    pub ray_count: usize,
    pub max_depth: f32,
    /// Ray marching increment in grid units. Must not exceed one cell.
    pub ray_step: f32,
    pub fov: f32,
    pub move_speed: f32,
    pub rot_speed: f32,
    pub mouse_sensitivity: f32,
    pub map_width: i32,
    pub map_height: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 400,
            ray_count: 320,
            max_depth: 20.0,
            ray_step: 0.02,
            fov: PI / 3.0,
            move_speed: 0.05,
            rot_speed: 0.03,
            mouse_sensitivity: 0.002,
            map_width: 64,
            map_height: 64,
        }
    }
}

impl Settings {
    /// Check every field, returning the first offending one.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSetting`] naming the field that is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RAY_STEP..=1.0).contains(&self.ray_step) {
            return Err(Error::setting(
                "ray_step",
                format!("{} is outside [{MIN_RAY_STEP}, 1]", self.ray_step),
            ));
        }
        // A diagonal step of two axes must still stay under one cell.
        if !(self.move_speed > 0.0 && self.move_speed <= 0.5) {
            return Err(Error::setting(
                "move_speed",
                format!("{} is outside (0, 0.5]", self.move_speed),
            ));
        }
        if !(self.rot_speed > 0.0 && self.rot_speed < PI) {
            return Err(Error::setting(
                "rot_speed",
                format!("{} is outside (0, pi)", self.rot_speed),
            ));
        }
        if self.ray_count == 0 {
            return Err(Error::setting("ray_count", "must cast at least one ray"));
        }
        if !self.max_depth.is_finite() || self.max_depth <= 0.0 {
            return Err(Error::setting(
                "max_depth",
                format!("{} is not a positive distance", self.max_depth),
            ));
        }
        if !(self.fov > 0.0 && self.fov < PI) {
            return Err(Error::setting(
                "fov",
                format!("{} is outside (0, pi)", self.fov),
            ));
        }
        if self.screen_width < 16 || self.screen_height < 16 {
            return Err(Error::setting(
                "screen",
                format!(
                    "{}x{} is smaller than 16x16",
                    self.screen_width, self.screen_height
                ),
            ));
        }
        if self.map_width < 16 || self.map_height < 16 {
            return Err(Error::MapTooSmall {
                width: self.map_width,
                height: self.map_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[test]
    fn step_larger_than_a_cell_is_rejected() {
        let settings = Settings {
            ray_step: 1.5,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidSetting {
                name: "ray_step",
                ..
            })
        ));
    }

    #[test]
    fn zero_step_is_rejected() {
        let settings = Settings {
            ray_step: 0.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn needlessly_fine_step_is_rejected() {
        let settings = Settings {
            ray_step: 1e-9,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidSetting {
                name: "ray_step",
                ..
            })
        ));
    }

    #[test]
    fn speeds_that_could_skip_a_wall_are_rejected() {
        let fast = Settings {
            move_speed: 1.5,
            ..Settings::default()
        };
        assert!(matches!(
            fast.validate(),
            Err(Error::InvalidSetting {
                name: "move_speed",
                ..
            })
        ));
        let frozen = Settings {
            move_speed: 0.0,
            ..Settings::default()
        };
        assert!(frozen.validate().is_err());
        let spinning = Settings {
            rot_speed: 4.0,
            ..Settings::default()
        };
        assert!(matches!(
            spinning.validate(),
            Err(Error::InvalidSetting {
                name: "rot_speed",
                ..
            })
        ));
    }

    #[test]
    fn zero_rays_is_rejected() {
        let settings = Settings {
            ray_count: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidSetting {
                name: "ray_count",
                ..
            })
        ));
    }

    #[test]
    fn tiny_map_is_rejected() {
        let settings = Settings {
            map_width: 8,
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(Error::MapTooSmall {
                width: 8,
                height: 64
            })
        );
    }

    #[test]
    fn straight_angle_fov_is_rejected() {
        let settings = Settings {
            fov: PI,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
