use bevy::asset::RenderAssetUsages;
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use hexx::{ColumnMeshBuilder, HexLayout, HexOrientation};

use super::HexFieldSettings;
use super::entities::{HexField, HexFieldLayout, HexInstance};
use crate::scene::{SceneConfig, SceneCtx, ViewportExtents};

// ── Mount ───────────────────────────────────────────────────────────

/// Spawns the [`HexField`] entity under the scene root.
///
/// The base mesh and material are created here, once per mount; instance
/// slots are left to [`rebuild_hex_field`].
pub fn spawn_hex_field(
    commands: &mut Commands,
    ctx: &mut SceneCtx,
    settings: &HexFieldSettings,
) -> Entity {
    let mesh = ctx.meshes.add(hex_column_mesh(settings));
    let material = ctx.material(&settings.color);

    commands
        .spawn((
            Name::new("HexField"),
            HexField::new(mesh, material),
            Transform::from_xyz(0.0, -settings.depth, 0.0),
            Visibility::default(),
            ChildOf(ctx.root),
        ))
        .id()
}

/// Extruded flat-top hexagon, `depth` tall, standing on `y = 0`.
fn hex_column_mesh(settings: &HexFieldSettings) -> Mesh {
    let layout = HexLayout {
        orientation: HexOrientation::Flat,
        scale: Vec2::splat(settings.radius),
        ..default()
    };
    let info = ColumnMeshBuilder::new(&layout, settings.depth).build();

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, info.vertices)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, info.normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, info.uvs)
    .with_inserted_indices(Indices::U16(info.indices))
}

// ── Update: re-tiling ───────────────────────────────────────────────

/// Re-tiles every [`HexField`] to cover the current [`ViewportExtents`].
///
/// Existing slots are moved in place, missing ones spawned, and slots past
/// the new `cols * rows` despawned. Running twice with the same viewport
/// leaves every transform untouched.
pub fn rebuild_hex_field(
    mut commands: Commands,
    viewport: Res<ViewportExtents>,
    cfg: Res<SceneConfig>,
    mut fields: Query<(Entity, &mut HexField)>,
    mut instances: Query<&mut Transform, With<HexInstance>>,
) {
    let layout = HexFieldLayout::cover(viewport.world, cfg.field.spacing());

    for (field_entity, mut field) in &mut fields {
        let HexField {
            mesh,
            material,
            slots,
            ..
        } = &mut *field;

        for (index, pos) in layout.positions.iter().enumerate() {
            let transform = Transform::from_xyz(pos.x, 0.0, pos.y);
            match slots.get(index) {
                Some(&slot) => {
                    if let Ok(mut current) = instances.get_mut(slot) {
                        current.set_if_neq(transform);
                    }
                }
                None => {
                    let slot = commands
                        .spawn((
                            Name::new(format!("Hex({index})")),
                            HexInstance,
                            Mesh3d(mesh.clone()),
                            MeshMaterial3d(material.clone()),
                            transform,
                            ChildOf(field_entity),
                        ))
                        .id();
                    slots.push(slot);
                }
            }
        }

        let trimmed = slots.len().saturating_sub(layout.positions.len());
        for stale in slots.drain(layout.positions.len()..) {
            commands.entity(stale).despawn();
        }

        if (field.cols, field.rows) != (layout.cols, layout.rows) {
            debug!(
                "hex field {}x{} -> {}x{} ({trimmed} slots trimmed)",
                field.cols, field.rows, layout.cols, layout.rows
            );
        }
        field.cols = layout.cols;
        field.rows = layout.rows;
    }
}
