use bevy::prelude::*;

use super::LightSettings;
use crate::math;

/// Goal-seeking state of the scene's point light.
#[derive(Component, Reflect, Debug, Clone)]
pub struct PointerLight {
    /// Position the light is easing toward.
    pub goal: Vec3,
    /// Current angle on the idle orbit, in radians.
    pub orbit_angle: f32,
    /// `true` while a pointer is over the canvas.
    pub pointer_over: bool,
}

impl PointerLight {
    /// Light resting at the start of its orbit.
    pub fn new(settings: &LightSettings) -> Self {
        Self {
            goal: math::orbit_point(0.0, settings.orbit_radius, settings.height),
            orbit_angle: 0.0,
            pointer_over: false,
        }
    }

    /// Switches to pointer tracking.
    pub fn on_pointer_enter(&mut self) {
        self.pointer_over = true;
    }

    /// Switches back to the idle orbit.
    pub fn on_pointer_leave(&mut self) {
        self.pointer_over = false;
    }

    /// Aims the light above the ground point under `ray`.
    ///
    /// Returns `false` and keeps the old goal when the ray misses the ground.
    pub fn set_goal_from_ray(&mut self, ray: Ray3d, height: f32) -> bool {
        match math::ground_hit(ray) {
            Some(hit) => {
                self.goal = Vec3::new(hit.x, height, hit.z);
                true
            }
            None => false,
        }
    }

    /// Advances one frame of `dt_ms` milliseconds from `live` and returns the
    /// light's new position.
    ///
    /// Idle frames move the orbit by `dt_ms * orbit_speed` so the drift is the
    /// same at any frame rate. The approach toward the goal is a fixed
    /// per-frame fraction.
    pub fn advance(&mut self, live: Vec3, dt_ms: f32, settings: &LightSettings) -> Vec3 {
        let factor = if self.pointer_over {
            settings.tracking_lerp
        } else {
            self.orbit_angle += dt_ms * settings.orbit_speed;
            self.goal = math::orbit_point(self.orbit_angle, settings.orbit_radius, live.y);
            settings.idle_lerp
        };
        live.lerp(self.goal, factor)
    }
}
