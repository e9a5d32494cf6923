#![warn(missing_docs)]
//! Interactive hex-tiled landing scene.
//!
//! A top-down camera looks at a field of extruded hexagons lit by a point
//! light that follows the pointer. Extruded text labels on the field act as
//! links.

mod hex_field;
mod label;
mod light;
mod materials;
pub mod math;
mod scene;

use bevy::prelude::*;
use bevy_inspector_egui::quick::WorldInspectorPlugin;

use label::HitProxy;
use light::PointerLight;
use scene::{SceneConfig, ScenePlugin, SceneState, navigation};

/// Host-level mode, used to gate debug tooling.
#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash, Reflect)]
pub enum GameState {
    /// Normal interaction.
    #[default]
    Running,
    /// Inspector and gizmo overlay visible (I to toggle).
    Debugging,
}

/// Command-line options for native builds.
#[cfg(feature = "native")]
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Font used for label text, as a path under `assets/`.
    #[arg(long)]
    font: Option<String>,
    /// Start with the world inspector open.
    #[arg(long)]
    inspector: bool,
}

struct HostOptions {
    font: Option<String>,
    inspector: bool,
}

#[cfg(feature = "native")]
fn host_options() -> HostOptions {
    let cli = <Cli as clap::Parser>::parse();
    HostOptions {
        font: cli.font,
        inspector: cli.inspector,
    }
}

#[cfg(not(feature = "native"))]
fn host_options() -> HostOptions {
    HostOptions {
        font: None,
        inspector: false,
    }
}

fn main() {
    let options = host_options();
    let mut config = SceneConfig::default();
    if let Some(font) = options.font {
        config.font_path = font;
    }
    let initial = if options.inspector {
        GameState::Debugging
    } else {
        GameState::Running
    };

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Hex Landing".into(),
            fit_canvas_to_parent: true,
            ..default()
        }),
        ..default()
    }))
    .register_type::<GameState>()
    .insert_state(initial)
    .add_plugins(bevy_egui::EguiPlugin::default())
    .add_plugins(ScenePlugin(config))
    .add_systems(
        Update,
        (toggle_inspector, reload_scene, navigation::open_requested_urls),
    )
    .add_systems(
        Update,
        draw_debug_gizmos.run_if(in_state(GameState::Debugging)),
    )
    .add_systems(OnEnter(SceneState::Unmounted), remount_scene)
    .add_plugins(WorldInspectorPlugin::new().run_if(in_state(GameState::Debugging)));

    app.run();
}

fn toggle_inspector(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::KeyI) {
        next.set(match state.get() {
            GameState::Running => GameState::Debugging,
            GameState::Debugging => GameState::Running,
        });
    } else if keys.just_pressed(KeyCode::Escape) && *state.get() == GameState::Debugging {
        next.set(GameState::Running);
    }
}

/// F5 tears the scene down; [`remount_scene`] brings it back next frame.
fn reload_scene(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<SceneState>>,
    mut next: ResMut<NextState<SceneState>>,
) {
    if keys.just_pressed(KeyCode::F5) && *state.get() == SceneState::Mounted {
        info!("reloading scene");
        next.set(SceneState::Unmounted);
    }
}

fn remount_scene(mut next: ResMut<NextState<SceneState>>) {
    next.set(SceneState::Mounted);
}

/// Outlines hit proxies and marks the light's goal.
fn draw_debug_gizmos(
    mut gizmos: Gizmos,
    proxies: Query<&GlobalTransform, With<HitProxy>>,
    lights: Query<&PointerLight>,
) {
    for proxy in &proxies {
        gizmos.cube(*proxy, Color::srgb(1.0, 0.3, 0.6));
    }
    for light in &lights {
        gizmos.sphere(
            Isometry3d::from_translation(light.goal),
            0.3,
            Color::srgb(1.0, 0.9, 0.4),
        );
    }
}
