//! Pure computation helpers extracted for testability.
//!
//! All functions in this module are free of Bevy ECS dependencies and operate
//! on plain numeric / `Vec3` / `Ray3d` inputs, making them straightforward to
//! unit-test.

use bevy::math::Affine3A;
use bevy::math::primitives::InfinitePlane3d;
use bevy::prelude::{Ray3d, Vec2, Vec3};

/// Fraction of the viewport width a label may occupy before it is shrunk.
pub const LABEL_VIEWPORT_PADDING: f32 = 0.9;

/// Number of hex columns (or rows) needed to cover `extent` world-units.
///
/// Always `ceil(extent / spacing / 4) * 4 + 1`, so the count is odd, moves in
/// steps of four and leaves a margin on both sides. Degenerate inputs yield 1.
pub fn grid_span(extent: f32, spacing: f32) -> u32 {
    if extent.is_nan() || spacing.is_nan() || extent <= 0.0 || spacing <= 0.0 {
        return 1;
    }
    (extent / spacing / 4.0).ceil() as u32 * 4 + 1
}

/// Centered ground-plane position of instance `index` in a flat-top hex field.
///
/// Offset coordinates: `col = index % cols`, `row = index / cols`, odd
/// columns shifted by half a row. Returned as `(x, z)`.
pub fn hex_offset_position(index: u32, cols: u32, rows: u32, spacing: Vec2) -> Vec2 {
    let col = index % cols;
    let row = index / cols;
    let x = spacing.x * col as f32;
    let z = spacing.y * row as f32 + (col % 2) as f32 * 0.5 * spacing.y;
    Vec2::new(
        x - cols as f32 * 0.5 * spacing.x,
        z - rows as f32 * 0.5 * spacing.y,
    )
}

/// Visible world extents on the ground plane for a camera looking straight
/// down from `distance` with vertical field of view `fov` (radians).
///
/// A zero-height viewport uses an aspect ratio of 1.
pub fn ground_extents(fov: f32, distance: f32, viewport_px: Vec2) -> Vec2 {
    let aspect = if viewport_px.y > 0.0 {
        viewport_px.x / viewport_px.y
    } else {
        1.0
    };
    let height = 2.0 * (fov / 2.0).tan() * distance;
    Vec2::new(height * aspect, height)
}

/// Uniform shrink factor that keeps a label of `width` inside the padded
/// viewport. Exactly `1.0` when it already fits.
pub fn fit_scale(width: f32, viewport_width: f32) -> f32 {
    let padded = LABEL_VIEWPORT_PADDING * viewport_width;
    if width > padded && width > 0.0 {
        padded / width
    } else {
        1.0
    }
}

/// Point where `ray` meets the horizontal plane `y = 0`.
///
/// `None` when the ray is parallel to or pointing away from the plane.
pub fn ground_hit(ray: Ray3d) -> Option<Vec3> {
    let distance = ray.intersect_plane(Vec3::ZERO, InfinitePlane3d::new(Vec3::Y))?;
    Some(ray.get_point(distance))
}

/// Position on a horizontal circle of `radius` at `height`.
///
/// `angle = 0` lies on +Z; the angle grows toward +X.
pub fn orbit_point(angle: f32, radius: f32, height: f32) -> Vec3 {
    Vec3::new(angle.sin() * radius, height, angle.cos() * radius)
}

/// Distance along `ray` to the unit cube (`[-0.5, 0.5]^3`) placed by
/// `box_from_local`, or `None` on a miss.
///
/// Boxes with a collapsed axis (zero scale) never report a hit.
pub fn ray_box_distance(ray: Ray3d, box_from_local: &Affine3A) -> Option<f32> {
    if box_from_local.matrix3.determinant().abs() < 1e-9 {
        return None;
    }
    let local_from_box = box_from_local.inverse();
    let origin = local_from_box.transform_point3(ray.origin);
    let dir = local_from_box.transform_vector3(*ray.direction);

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d.abs() < 1e-9 {
            if !(-0.5..=0.5).contains(&o) {
                return None;
            }
            continue;
        }
        let t0 = (-0.5 - o) / d;
        let t1 = (0.5 - o) / d;
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));
    }

    if t_max < t_min.max(0.0) {
        return None;
    }
    Some(t_min.max(0.0))
}

/// Computes the face normal of a triangle defined by three vertices.
///
/// Uses the cross product of edges `(v1 - v0)` and `(v2 - v0)`.
/// Returns `Vec3::ZERO` if the triangle is degenerate (collinear points).
pub fn compute_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    edge1.cross(edge2).normalize_or_zero()
}
