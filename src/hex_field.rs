//! Tiled hexagon backdrop.
//!
//! One extruded flat-top hexagon mesh is shared by every [`HexInstance`], so
//! the renderer batches the whole field into instanced draws. The field is
//! re-tiled whenever [`ViewportExtents`](crate::scene::ViewportExtents)
//! changes so it always covers the screen with a margin.

mod entities;
pub mod systems;

pub use entities::HexInstance;

use bevy::prelude::*;

/// Geometry and look of the hex backdrop.
#[derive(Clone, Debug, Reflect)]
pub struct HexFieldSettings {
    /// Circumradius of one hexagon in world-units.
    pub radius: f32,
    /// Spacing multiplier leaving a thin gap between neighbours.
    pub gap: f32,
    /// Extrusion depth; tops sit at `y = 0`.
    pub depth: f32,
    /// Hex color understood by [`MaterialCache`](crate::materials::MaterialCache).
    pub color: String,
}

impl HexFieldSettings {
    /// Center-to-center distance between columns (`x`) and rows (`y`).
    pub fn spacing(&self) -> Vec2 {
        Vec2::new(
            1.5 * self.radius * self.gap,
            3.0_f32.sqrt() * self.radius * self.gap,
        )
    }
}

impl Default for HexFieldSettings {
    fn default() -> Self {
        Self {
            radius: 1.0,
            gap: 1.01,
            depth: 1.0,
            color: "#3a4250".into(),
        }
    }
}
