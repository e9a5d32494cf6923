//! Pointer-following point light.
//!
//! While the pointer is over the canvas the light chases the spot on the
//! ground under it; otherwise it drifts along a slow orbit around the scene.

mod entities;
pub mod systems;

pub use entities::PointerLight;

use bevy::prelude::*;

/// Point light tuning.
#[derive(Clone, Debug, Reflect)]
pub struct LightSettings {
    /// Height the light keeps above the ground plane.
    pub height: f32,
    /// Radius of the idle orbit.
    pub orbit_radius: f32,
    /// Orbit angle advanced per elapsed millisecond.
    pub orbit_speed: f32,
    /// Per-frame approach factor while tracking the pointer.
    pub tracking_lerp: f32,
    /// Per-frame approach factor while orbiting.
    pub idle_lerp: f32,
    /// Luminous intensity in lumens.
    pub intensity: f32,
    /// Cut-off range of the light.
    pub range: f32,
    /// Light color.
    pub color: Color,
    /// Whether the light casts shadows.
    pub shadows: bool,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            height: 6.0,
            orbit_radius: 13.0,
            orbit_speed: 0.0005,
            tracking_lerp: 0.1,
            idle_lerp: 0.01,
            intensity: 2_000_000.0,
            range: 40.0,
            color: Color::srgb(1.0, 0.96, 0.9),
            shadows: true,
        }
    }
}
