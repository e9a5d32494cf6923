//! Scene orchestration: mount/unmount, camera, lights, input wiring.
//!
//! Everything a mount creates hangs off one [`SceneRoot`] entity or lives in
//! a per-scene resource, so unmounting is a single despawn plus a handful of
//! `remove_resource` calls. Input systems only run in [`SceneState::Mounted`].
//! Label clicks surface as [`OpenUrl`] messages; the host decides how to open
//! them.

mod entities;
pub mod navigation;
pub mod systems;

pub use entities::{HitProxies, SceneCamera, SceneCtx, SceneGeneration, SceneRoot, ViewportExtents};
pub use navigation::OpenUrl;

use bevy::prelude::*;

use crate::hex_field::{self, HexFieldSettings, HexInstance};
use crate::label::{
    self, Alignment, AwaitingText, FontBytes, FontBytesLoader, FontData, HitProxy,
    InteractiveLabel, LabelBounds, LabelMeshReady, LabelSettings, PendingTextMeshes, TextMesh,
    Underline,
};
use crate::light::{self, LightSettings, PointerLight};

/// Whether the scene currently exists.
#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash, Reflect)]
pub enum SceneState {
    /// Scene entities and listeners are live.
    #[default]
    Mounted,
    /// Nothing of the scene remains.
    Unmounted,
}

/// Nested configuration for the landing scene.
#[derive(Resource, Clone, Debug, Reflect)]
pub struct SceneConfig {
    /// Top-down camera framing.
    pub camera: CameraSettings,
    /// Hex backdrop.
    pub field: HexFieldSettings,
    /// Pointer-following light.
    pub light: LightSettings,
    /// Labels, in spawn order.
    pub labels: Vec<LabelSettings>,
    /// TTF/OTF asset path, relative to the asset folder, used for every label.
    pub font_path: String,
    /// Background clear color.
    pub clear_color: Color,
    /// Ambient brightness on the scene camera.
    pub ambient_brightness: f32,
    /// Illuminance of the directional fill light.
    pub fill_illuminance: f32,
    /// Direction the fill light shines toward.
    pub fill_direction: Vec3,
}

/// Camera placement.
#[derive(Clone, Debug, Reflect)]
pub struct CameraSettings {
    /// Distance above the ground plane.
    pub height: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraSettings {
                height: 50.0,
                fov: 0.8,
            },
            field: HexFieldSettings::default(),
            light: LightSettings::default(),
            labels: vec![
                LabelSettings::new("PHIL HARLOW", Vec3::new(0.0, 0.0, -5.0))
                    .with_size(3.0)
                    .with_depth(0.8)
                    .with_color("#dddddd"),
                LabelSettings::new("GITHUB", Vec3::new(-6.0, 0.0, 3.0))
                    .with_size(1.5)
                    .with_alignment(Alignment::Right)
                    .with_color("#5fa8d3")
                    .with_hover_color("#8cc7ea")
                    .with_url("https://github.com"),
                LabelSettings::new("LINKEDIN", Vec3::new(6.0, 0.0, 3.0))
                    .with_size(1.5)
                    .with_alignment(Alignment::Left)
                    .with_color("#5fa8d3")
                    .with_pressed_color("#ffffff")
                    .with_url("https://www.linkedin.com"),
            ],
            font_path: "fonts/DejaVuSans-Bold.ttf".into(),
            clear_color: Color::srgb(0.008, 0.012, 0.02),
            ambient_brightness: 80.0,
            fill_illuminance: 2000.0,
            fill_direction: Vec3::new(0.6, -0.55, 0.58),
        }
    }
}

/// Scene plugin: mount on entering [`SceneState::Mounted`], unmount on exit.
pub struct ScenePlugin(pub SceneConfig);

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SceneConfig>()
            .register_type::<SceneState>()
            .register_type::<SceneRoot>()
            .register_type::<SceneCamera>()
            .register_type::<HexInstance>()
            .register_type::<InteractiveLabel>()
            .register_type::<HitProxy>()
            .register_type::<Underline>()
            .register_type::<TextMesh>()
            .register_type::<AwaitingText>()
            .register_type::<LabelBounds>()
            .register_type::<PointerLight>()
            .insert_resource(self.0.clone())
            .insert_resource(ClearColor(self.0.clear_color))
            .init_state::<SceneState>()
            .init_resource::<SceneGeneration>()
            .init_resource::<PendingTextMeshes>()
            .init_resource::<FontData>()
            .init_asset::<FontBytes>()
            .init_asset_loader::<FontBytesLoader>()
            .add_message::<OpenUrl>()
            .add_message::<LabelMeshReady>()
            .add_systems(OnEnter(SceneState::Mounted), systems::mount_scene)
            .add_systems(OnExit(SceneState::Mounted), systems::unmount_scene)
            .add_systems(
                Update,
                (
                    systems::handle_window_resize,
                    hex_field::systems::rebuild_hex_field
                        .run_if(resource_exists_and_changed::<ViewportExtents>),
                    systems::track_pointer,
                    systems::handle_pointer_buttons,
                    systems::track_pointer_presence,
                    label::systems::fit_labels_to_viewport,
                    label::systems::apply_label_materials,
                    light::systems::advance_pointer_light,
                    systems::enable_label_shadows,
                )
                    .chain()
                    .run_if(in_state(SceneState::Mounted)),
            )
            .add_systems(
                Update,
                (
                    label::systems::track_font_load,
                    label::systems::queue_text_meshes,
                    label::systems::poll_text_meshes,
                )
                    .chain()
                    .before(label::systems::fit_labels_to_viewport),
            );
    }
}
