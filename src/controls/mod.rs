//! View state driven by user input.
//!
//! [`ViewControls`] is the single owner of camera, thickness and interaction
//! state. Input handlers mutate it between frames and call
//! [`publish`](ViewControls::publish) to push the derived matrices and scalars
//! into a [`UniformSet`]. It never touches geometry.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::gpu::{UniformError, UniformSet};

/// Camera distance used when no translation is configured.
pub const DEFAULT_VIEW_Z: f32 = -3.0;

/// Camera depth used in orthographic mode.
pub const ORTHOGRAPHIC_VIEW_Z: f32 = -0.5;

const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const Z_NEAR: f32 = 0.01;
const Z_FAR: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewControls {
    /// Ribbon width in normalized device units.
    pub thickness: f32,
    /// Flat 2-D view; disables rotation and camera translation.
    pub orthographic: bool,
    /// Model rotation about X, Y and Z, in degrees.
    pub rotation_degrees: [f32; 3],
    /// Camera translation.
    pub translation: [f32; 3],
    /// Output width over height.
    pub aspect: f32,
    /// Wrap the ribbon around a circle.
    pub polar: bool,
    /// Pointer position in normalized device coordinates.
    pub mouse: [f32; 2],
}

impl Default for ViewControls {
    fn default() -> Self {
        Self {
            thickness: 0.02,
            orthographic: true,
            rotation_degrees: [0.0; 3],
            translation: [0.0, 0.0, DEFAULT_VIEW_Z],
            aspect: 16.0 / 9.0,
            polar: false,
            mouse: [0.0, 0.0],
        }
    }
}

impl ViewControls {
    pub fn projection(&self) -> Mat4 {
        if self.orthographic {
            // Unit box: x and y pass through, depth lands inside 0..1.
            Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, Z_NEAR, Z_FAR)
        } else {
            Mat4::perspective_rh(FOV_Y, self.aspect.max(f32::EPSILON), Z_NEAR, Z_FAR)
        }
    }

    pub fn view(&self) -> Mat4 {
        if self.orthographic {
            Mat4::from_translation(Vec3::new(0.0, 0.0, ORTHOGRAPHIC_VIEW_Z))
        } else {
            Mat4::from_translation(Vec3::from_array(self.translation))
        }
    }

    pub fn model(&self) -> Mat4 {
        if self.orthographic {
            return Mat4::IDENTITY;
        }
        let [x, y, z] = self.rotation_degrees.map(f32::to_radians);
        Mat4::from_rotation_x(x) * Mat4::from_rotation_y(y) * Mat4::from_rotation_z(z)
    }

    /// Write the current state into `uniforms`.
    pub fn publish(&self, uniforms: &mut UniformSet) -> Result<(), UniformError> {
        uniforms.set("thickness", self.thickness)?;
        uniforms.set("aspect", self.aspect)?;
        uniforms.set("polar", if self.polar { 1.0f32 } else { 0.0 })?;
        uniforms.set("mouse", self.mouse)?;
        uniforms.set("projection", self.projection())?;
        uniforms.set("view", self.view())?;
        uniforms.set("model", self.model())?;
        Ok(())
    }
}
