use bevy::ecs::system::SystemParam;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use super::CameraSettings;
use super::navigation::OpenUrl;
use crate::label::{HitProxy, InteractiveLabel};
use crate::materials::MaterialCache;
use crate::math;

/// Fallback when a configured color cannot be parsed.
const FALLBACK_COLOR: &str = "#cccccc";

/// Parent of every entity belonging to one mount of the scene.
#[derive(Component, Reflect)]
pub struct SceneRoot;

/// Marker for the top-down scene camera.
#[derive(Component, Reflect)]
pub struct SceneCamera;

/// Bumped on every mount and unmount.
///
/// Asynchronous work records the value it started under and drops its result
/// if the scene has moved on since.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneGeneration(pub u64);

/// Size of the window and of the ground area the camera sees.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportExtents {
    /// Logical window size in pixels.
    pub pixels: Vec2,
    /// Visible width/height at `y = 0` in world-units.
    pub world: Vec2,
}

impl ViewportExtents {
    /// Extents for a window of `pixels` seen through `camera`.
    pub fn new(pixels: Vec2, camera: &CameraSettings) -> Self {
        Self {
            pixels,
            world: math::ground_extents(camera.fov, camera.height, pixels),
        }
    }
}

/// Hit-test proxy entity → owning label entity.
#[derive(Resource, Default, Debug)]
pub struct HitProxies(HashMap<Entity, Entity>);

impl HitProxies {
    /// Registers `proxy` as the pick target of `label`.
    pub fn insert(&mut self, proxy: Entity, label: Entity) {
        self.0.insert(proxy, label);
    }

    /// Label owning `proxy`, if it is a registered proxy.
    pub fn label_for(&self, proxy: Entity) -> Option<Entity> {
        self.0.get(&proxy).copied()
    }

    /// Number of registered proxies.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// The label under the pointer.
#[derive(Resource, Default, Debug)]
pub struct PointerState {
    /// Label whose proxy the pointer is over.
    pub hovered: Option<Entity>,
}

/// Explicit scene context handed to every spawn helper during mount.
pub struct SceneCtx<'a> {
    /// Entity every scene entity is parented to.
    pub root: Entity,
    /// Mesh storage.
    pub meshes: &'a mut Assets<Mesh>,
    /// Material storage.
    pub materials: &'a mut Assets<StandardMaterial>,
    /// This mount's color → material cache.
    pub cache: &'a mut MaterialCache,
}

impl SceneCtx<'_> {
    /// Cached material for `color`, falling back to neutral gray when the
    /// color string is invalid.
    pub fn material(&mut self, color: &str) -> Handle<StandardMaterial> {
        match self.cache.get_or_create(color, self.materials) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("invalid color {color:?} ({err}); using {FALLBACK_COLOR}");
                self.cache
                    .get_or_create(FALLBACK_COLOR, self.materials)
                    .unwrap_or_default()
            }
        }
    }
}

/// Bundled parameters for pointer-driven label interaction.
#[derive(SystemParam)]
pub struct PointerCtx<'w, 's> {
    camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<SceneCamera>>,
    proxies: Query<'w, 's, (Entity, &'static GlobalTransform), With<HitProxy>>,
    hit_proxies: Res<'w, HitProxies>,
    labels: Query<'w, 's, &'static mut InteractiveLabel>,
    /// Shared pointer state.
    pub state: ResMut<'w, PointerState>,
    open: MessageWriter<'w, OpenUrl>,
}

impl PointerCtx<'_, '_> {
    /// World-space ray through `cursor` from the scene camera.
    pub fn ray(&self, cursor: Vec2) -> Option<Ray3d> {
        let (camera, camera_tf) = self.camera.single().ok()?;
        camera.viewport_to_world(camera_tf, cursor).ok()
    }

    /// Label whose proxy is nearest along `ray`.
    pub fn pick_label(&self, ray: Ray3d) -> Option<Entity> {
        self.proxies
            .iter()
            .filter_map(|(proxy, tf)| {
                math::ray_box_distance(ray, &tf.affine()).map(|distance| (proxy, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .and_then(|(proxy, _)| self.hit_proxies.label_for(proxy))
    }

    /// Moves hover from the previous label to `target`.
    pub fn hover(&mut self, target: Option<Entity>) {
        if self.state.hovered == target {
            return;
        }
        if let Some(previous) = self.state.hovered.take()
            && let Ok(mut label) = self.labels.get_mut(previous)
        {
            label.set_hovered(false);
        }
        if let Some(next) = target
            && let Ok(mut label) = self.labels.get_mut(next)
        {
            label.set_hovered(true);
        }
        self.state.hovered = target;
    }

    /// Pointer down over the hovered label.
    pub fn press(&mut self) {
        if let Some(hovered) = self.state.hovered
            && let Ok(mut label) = self.labels.get_mut(hovered)
        {
            label.set_pressed(true);
        }
    }

    /// Pointer up: releases every pressed label, navigating for the ones
    /// still hovered.
    pub fn release(&mut self) {
        for mut label in &mut self.labels {
            if !label.interaction.pressed() {
                continue;
            }
            if let Some(url) = label.set_pressed(false) {
                info!("opening {url} from label {:?}", label.text);
                self.open.write(OpenUrl(url));
            }
        }
    }
}
