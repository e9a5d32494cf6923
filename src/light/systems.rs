use bevy::prelude::*;

use super::LightSettings;
use super::entities::PointerLight;
use crate::math;
use crate::scene::{SceneConfig, SceneCtx};

/// Spawns the point light at the start of its orbit.
pub fn spawn_pointer_light(
    commands: &mut Commands,
    ctx: &SceneCtx,
    settings: &LightSettings,
) -> Entity {
    let start = math::orbit_point(0.0, settings.orbit_radius, settings.height);
    commands
        .spawn((
            Name::new("PointerLight"),
            PointerLight::new(settings),
            PointLight {
                color: settings.color,
                intensity: settings.intensity,
                range: settings.range,
                shadows_enabled: settings.shadows,
                ..default()
            },
            Transform::from_translation(start),
            ChildOf(ctx.root),
        ))
        .id()
}

/// Eases every [`PointerLight`] toward its goal once per frame.
pub fn advance_pointer_light(
    time: Res<Time>,
    cfg: Res<SceneConfig>,
    mut lights: Query<(&mut PointerLight, &mut Transform)>,
) {
    let dt_ms = time.delta_secs() * 1000.0;
    for (mut light, mut transform) in &mut lights {
        transform.translation = light.advance(transform.translation, dt_ms, &cfg.light);
    }
}
