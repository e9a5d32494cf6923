use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future};

use super::LabelSettings;
use super::entities::{
    AwaitingText, HitProxy, InteractiveLabel, LabelBounds, LabelLayout, LabelMaterials,
    LabelMeshReady, TextMesh, Underline,
};
use super::text_mesh::{FontBytes, FontData, PendingTextMeshes};
use crate::math;
use crate::scene::{HitProxies, SceneCtx, SceneGeneration, ViewportExtents};

// ── Mount ───────────────────────────────────────────────────────────

/// Spawns one label with a zero-sized hit proxy and a hidden underline. Its
/// text mesh is requested by [`queue_text_meshes`] once the font is loaded.
pub fn spawn_label(
    commands: &mut Commands,
    ctx: &mut SceneCtx,
    settings: &LabelSettings,
    hit_proxies: &mut HitProxies,
) -> Entity {
    let materials = LabelMaterials {
        base: ctx.material(&settings.color),
        hover: ctx.material(&settings.resolved_hover_color()),
        pressed: ctx.material(&settings.resolved_pressed_color()),
    };

    let proxy = commands
        .spawn((
            Name::new("HitProxy"),
            HitProxy,
            Transform::from_scale(Vec3::ZERO),
        ))
        .id();
    let underline = commands
        .spawn((
            Name::new("Underline"),
            Underline,
            Mesh3d(ctx.meshes.add(Cuboid::default())),
            MeshMaterial3d(materials.hover.clone()),
            Transform::from_scale(Vec3::ZERO),
            Visibility::Hidden,
            NotShadowCaster,
        ))
        .id();

    let label = commands
        .spawn((
            Name::new(format!("Label({})", settings.text)),
            InteractiveLabel::new(settings, materials, proxy, underline),
            AwaitingText,
            Transform::from_translation(settings.position),
            Visibility::default(),
            ChildOf(ctx.root),
        ))
        .add_children(&[proxy, underline])
        .id();

    hit_proxies.insert(proxy, label);
    label
}

// ── Update ──────────────────────────────────────────────────────────

/// Settles the font load started at mount.
pub fn track_font_load(
    server: Res<AssetServer>,
    fonts: Res<Assets<FontBytes>>,
    mut font: ResMut<FontData>,
) {
    font.resolve(&server, &fonts);
}

/// Starts text builds for labels spawned before the font was ready.
///
/// If the font failed, the labels stop waiting and keep only their hit
/// proxies.
pub fn queue_text_meshes(
    mut commands: Commands,
    font: Res<FontData>,
    generation: Res<SceneGeneration>,
    mut builds: ResMut<PendingTextMeshes>,
    waiting: Query<(Entity, &InteractiveLabel), With<AwaitingText>>,
) {
    let bytes = font.bytes();
    if bytes.is_none() && !font.is_failed() {
        return;
    }
    for (entity, label) in &waiting {
        commands.entity(entity).remove::<AwaitingText>();
        match bytes {
            Some(bytes) => builds.spawn(
                entity,
                generation.0,
                bytes,
                label.text.clone(),
                label.depth,
            ),
            None => debug!("label {:?} stays text-less", label.text),
        }
    }
}

/// Collects finished text builds.
///
/// Results from an older scene generation, or for labels that no longer
/// exist, are dropped. Failed builds leave the label with only its hit proxy.
pub fn poll_text_meshes(
    mut commands: Commands,
    mut builds: ResMut<PendingTextMeshes>,
    generation: Res<SceneGeneration>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut labels: Query<&mut InteractiveLabel>,
    mut parts: Query<&mut Transform, Or<(With<HitProxy>, With<Underline>)>>,
    mut ready: MessageWriter<LabelMeshReady>,
) {
    builds.0.retain_mut(|pending| {
        let Some(result) = block_on(future::poll_once(&mut pending.task)) else {
            return true;
        };
        if pending.generation != generation.0 {
            debug!(
                "dropping text mesh from generation {} (now {})",
                pending.generation, generation.0
            );
            return false;
        }
        let Ok(mut label) = labels.get_mut(pending.label) else {
            debug!("dropping text mesh for despawned label {:?}", pending.label);
            return false;
        };

        let geometry = match result {
            Ok(geometry) => geometry,
            Err(err) => {
                warn!("label {:?} has no text mesh: {err}", label.text);
                return false;
            }
        };

        let bounds = geometry.bounds;
        let layout = LabelLayout::new(bounds, label.size, label.alignment);
        let mesh = commands
            .spawn((
                Name::new("TextMesh"),
                TextMesh,
                Mesh3d(meshes.add(geometry.into_mesh())),
                MeshMaterial3d(label.material()),
                layout.mesh,
                NotShadowCaster,
                ChildOf(pending.label),
            ))
            .id();
        label.mesh = Some(mesh);

        if let Ok(mut proxy) = parts.get_mut(label.proxy) {
            *proxy = layout.proxy;
        }
        if let Ok(mut underline) = parts.get_mut(label.underline) {
            *underline = layout.underline;
        }
        commands.entity(pending.label).insert(bounds);
        ready.write(LabelMeshReady {
            label: pending.label,
            mesh,
        });
        false
    });
}

/// Shrinks labels wider than the padded viewport along X and Z.
///
/// Runs for every label when the viewport changes and for labels whose
/// bounds just arrived.
pub fn fit_labels_to_viewport(
    viewport: Option<Res<ViewportExtents>>,
    mut labels: Query<(Ref<LabelBounds>, &InteractiveLabel, &mut Transform)>,
) {
    let Some(viewport) = viewport else {
        return;
    };
    let all = viewport.is_changed();
    for (bounds, label, mut transform) in &mut labels {
        if !all && !bounds.is_added() {
            continue;
        }
        let layout = LabelLayout::new(*bounds, label.size, label.alignment);
        let scale = math::fit_scale(layout.width, viewport.world.x);
        let target = Vec3::new(scale, 1.0, scale);
        if transform.scale != target {
            transform.scale = target;
        }
    }
}

/// Pushes the state material onto a label's mesh and underline, and shows
/// the underline only while hovered.
pub fn apply_label_materials(
    labels: Query<&InteractiveLabel, Changed<InteractiveLabel>>,
    mut targets: Query<&mut MeshMaterial3d<StandardMaterial>>,
    mut visibility: Query<&mut Visibility, With<Underline>>,
) {
    for label in &labels {
        let material = label.material();
        for part in label.mesh.into_iter().chain([label.underline]) {
            if let Ok(mut current) = targets.get_mut(part)
                && current.0 != material
            {
                current.0 = material.clone();
            }
        }
        if let Ok(mut vis) = visibility.get_mut(label.underline) {
            vis.set_if_neq(if label.interaction.hovered() {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            });
        }
    }
}
