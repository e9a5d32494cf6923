use bevy::prelude::*;

use crate::math;

/// The hex backdrop: shared mesh/material plus the instance slots spawned so far.
#[derive(Component)]
pub struct HexField {
    /// Columns in the current tiling.
    pub cols: u32,
    /// Rows in the current tiling.
    pub rows: u32,
    pub(super) mesh: Handle<Mesh>,
    pub(super) material: Handle<StandardMaterial>,
    pub(super) slots: Vec<Entity>,
}

impl HexField {
    /// Empty field; slots are created by the first rebuild.
    pub fn new(mesh: Handle<Mesh>, material: Handle<StandardMaterial>) -> Self {
        Self {
            cols: 0,
            rows: 0,
            mesh,
            material,
            slots: Vec::new(),
        }
    }
}

/// One hexagon copy. Child of the [`HexField`] entity.
#[derive(Component, Reflect)]
pub struct HexInstance;

/// Tiling that covers a viewport: dimensions plus centered `(x, z)` positions.
#[derive(Debug, PartialEq)]
pub struct HexFieldLayout {
    /// Column count.
    pub cols: u32,
    /// Row count.
    pub rows: u32,
    /// One entry per instance, row-major.
    pub positions: Vec<Vec2>,
}

impl HexFieldLayout {
    /// Smallest tiling (in steps of four, plus one) covering `extents`.
    pub fn cover(extents: Vec2, spacing: Vec2) -> Self {
        let cols = math::grid_span(extents.x, spacing.x);
        let rows = math::grid_span(extents.y, spacing.y);
        let positions = (0..cols * rows)
            .map(|i| math::hex_offset_position(i, cols, rows, spacing))
            .collect();
        Self {
            cols,
            rows,
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_field::HexFieldSettings;

    #[test]
    fn layout_covers_viewport() {
        let spacing = HexFieldSettings::default().spacing();
        let layout = HexFieldLayout::cover(Vec2::new(75.2, 42.3), spacing);
        assert_eq!(layout.cols, (75.2 / spacing.x / 4.0).ceil() as u32 * 4 + 1);
        assert_eq!(layout.rows, (42.3 / spacing.y / 4.0).ceil() as u32 * 4 + 1);
        assert_eq!(layout.positions.len(), (layout.cols * layout.rows) as usize);

        let min_x = layout.positions.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        let max_x = layout.positions.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        assert!(min_x <= -75.2 / 2.0 + spacing.x);
        assert!(max_x >= 75.2 / 2.0 - spacing.x);
    }

    #[test]
    fn layout_is_deterministic() {
        let spacing = HexFieldSettings::default().spacing();
        let a = HexFieldLayout::cover(Vec2::new(30.0, 20.0), spacing);
        let b = HexFieldLayout::cover(Vec2::new(30.0, 20.0), spacing);
        assert_eq!(a, b);
    }

    #[test]
    fn small_resizes_keep_dimensions() {
        let spacing = Vec2::ONE;
        let a = HexFieldLayout::cover(Vec2::new(30.0, 19.0), spacing);
        let b = HexFieldLayout::cover(Vec2::new(30.5, 19.5), spacing);
        assert_eq!((a.cols, a.rows), (b.cols, b.rows));
    }
}
