use bevy::core_pipeline::tonemapping::{DebandDither, Tonemapping};
use bevy::ecs::system::SystemParam;
use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::window::{CursorEntered, CursorLeft, PrimaryWindow, WindowResized};

use super::SceneConfig;
use super::entities::{
    HitProxies, PointerCtx, PointerState, SceneCamera, SceneCtx, SceneGeneration, SceneRoot,
    ViewportExtents,
};
use crate::hex_field::systems::spawn_hex_field;
use crate::label::systems::spawn_label;
use crate::label::{FontData, LabelMeshReady};
use crate::light::PointerLight;
use crate::light::systems::spawn_pointer_light;
use crate::materials::MaterialCache;

/// Window size assumed when no primary window exists.
const FALLBACK_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

/// Bundled resources for mounting the scene.
#[derive(SystemParam)]
pub struct MountRes<'w> {
    /// Mesh storage.
    pub meshes: ResMut<'w, Assets<Mesh>>,
    /// Material storage.
    pub materials: ResMut<'w, Assets<StandardMaterial>>,
    /// Scene liveness token.
    pub generation: ResMut<'w, SceneGeneration>,
    /// Process-wide font.
    pub font: ResMut<'w, FontData>,
    /// Loads the font on first mount.
    pub asset_server: Res<'w, AssetServer>,
    /// Scene configuration.
    pub cfg: Res<'w, SceneConfig>,
}

// ── Mount / unmount ─────────────────────────────────────────────────

/// Builds the whole scene under a fresh [`SceneRoot`].
pub fn mount_scene(
    mut commands: Commands,
    mut res: MountRes,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    res.generation.0 += 1;
    let generation = res.generation.0;
    let cfg = &*res.cfg;

    res.font.request(&res.asset_server, &cfg.font_path);

    let pixels = windows
        .single()
        .map(|window| window.size())
        .unwrap_or(FALLBACK_VIEWPORT);
    let viewport = ViewportExtents::new(pixels, &cfg.camera);

    let root = commands
        .spawn((
            Name::new("SceneRoot"),
            SceneRoot,
            Transform::default(),
            Visibility::default(),
        ))
        .id();

    commands.spawn((
        Name::new("SceneCamera"),
        SceneCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: cfg.camera.fov,
            ..default()
        }),
        Tonemapping::TonyMcMapface,
        DebandDither::Enabled,
        AmbientLight {
            brightness: cfg.ambient_brightness,
            ..default()
        },
        Transform::from_xyz(0.0, cfg.camera.height, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
        ChildOf(root),
    ));

    commands.spawn((
        Name::new("FillLight"),
        DirectionalLight {
            illuminance: cfg.fill_illuminance,
            shadows_enabled: true,
            ..default()
        },
        Transform::default().looking_to(cfg.fill_direction, Vec3::Y),
        ChildOf(root),
    ));

    let mut cache = MaterialCache::default();
    let mut hit_proxies = HitProxies::default();
    let mut ctx = SceneCtx {
        root,
        meshes: &mut res.meshes,
        materials: &mut res.materials,
        cache: &mut cache,
    };

    spawn_hex_field(&mut commands, &mut ctx, &cfg.field);
    spawn_pointer_light(&mut commands, &ctx, &cfg.light);
    for settings in &cfg.labels {
        spawn_label(&mut commands, &mut ctx, settings, &mut hit_proxies);
    }

    info!(
        "mounted scene (generation {generation}): {} labels, {} materials, viewport {}x{}",
        hit_proxies.len(),
        cache.len(),
        viewport.pixels.x,
        viewport.pixels.y
    );
    commands.insert_resource(cache);
    commands.insert_resource(hit_proxies);
    commands.insert_resource(PointerState::default());
    commands.insert_resource(viewport);
}

/// Despawns every scene entity and drops the per-scene resources.
///
/// Safe to run when nothing is mounted.
pub fn unmount_scene(
    mut commands: Commands,
    roots: Query<Entity, With<SceneRoot>>,
    mut generation: ResMut<SceneGeneration>,
) {
    let mut despawned = 0;
    for root in &roots {
        commands.entity(root).despawn();
        despawned += 1;
    }
    commands.remove_resource::<MaterialCache>();
    commands.remove_resource::<HitProxies>();
    commands.remove_resource::<PointerState>();
    commands.remove_resource::<ViewportExtents>();
    generation.0 += 1;
    info!(
        "unmounted scene ({despawned} roots); generation now {}",
        generation.0
    );
}

// ── Input ───────────────────────────────────────────────────────────

/// Recomputes [`ViewportExtents`] from the latest primary-window resize.
pub fn handle_window_resize(
    mut resized: MessageReader<WindowResized>,
    primary: Query<(), With<PrimaryWindow>>,
    cfg: Res<SceneConfig>,
    mut viewport: ResMut<ViewportExtents>,
) {
    let Some(last) = resized
        .read()
        .filter(|ev| primary.contains(ev.window))
        .last()
    else {
        return;
    };
    let next = ViewportExtents::new(Vec2::new(last.width, last.height), &cfg.camera);
    if viewport.set_if_neq(next) {
        debug!("viewport {}x{}", next.pixels.x, next.pixels.y);
    }
}

/// Feeds cursor and touch positions to the light and to label hover.
pub fn track_pointer(
    mut cursor_moved: MessageReader<CursorMoved>,
    mut touches: MessageReader<TouchInput>,
    cfg: Res<SceneConfig>,
    mut lights: Query<&mut PointerLight>,
    mut pointer: PointerCtx,
) {
    let mut latest = cursor_moved.read().last().map(|ev| ev.position);
    for touch in touches.read() {
        if matches!(touch.phase, TouchPhase::Started | TouchPhase::Moved) {
            latest = Some(touch.position);
        }
    }
    let Some(cursor) = latest else {
        return;
    };
    let Some(ray) = pointer.ray(cursor) else {
        return;
    };
    for mut light in &mut lights {
        light.on_pointer_enter();
        light.set_goal_from_ray(ray, cfg.light.height);
    }
    let target = pointer.pick_label(ray);
    pointer.hover(target);
}

/// Left mouse button and touch contacts press and release labels.
pub fn handle_pointer_buttons(
    mouse: Res<ButtonInput<MouseButton>>,
    mut touches: MessageReader<TouchInput>,
    mut pointer: PointerCtx,
) {
    let mut pressed = mouse.just_pressed(MouseButton::Left);
    let mut released = mouse.just_released(MouseButton::Left);
    for touch in touches.read() {
        match touch.phase {
            TouchPhase::Started => pressed = true,
            TouchPhase::Ended => released = true,
            TouchPhase::Canceled => {
                pointer.hover(None);
                released = true;
            }
            TouchPhase::Moved => {}
        }
    }
    if pressed {
        pointer.press();
    }
    if released {
        pointer.release();
    }
}

/// Switches the light between tracking and orbiting as the pointer enters
/// and leaves the canvas. Leaving also clears hover.
pub fn track_pointer_presence(
    mut entered: MessageReader<CursorEntered>,
    mut left: MessageReader<CursorLeft>,
    mut touches: MessageReader<TouchInput>,
    mut lights: Query<&mut PointerLight>,
    mut pointer: PointerCtx,
) {
    let mut over = None;
    if entered.read().last().is_some() {
        over = Some(true);
    }
    if left.read().last().is_some() {
        over = Some(false);
    }
    for touch in touches.read() {
        match touch.phase {
            TouchPhase::Started => over = Some(true),
            TouchPhase::Ended | TouchPhase::Canceled => over = Some(false),
            TouchPhase::Moved => {}
        }
    }

    match over {
        Some(true) => lights.iter_mut().for_each(|mut l| l.on_pointer_enter()),
        Some(false) => {
            lights.iter_mut().for_each(|mut l| l.on_pointer_leave());
            pointer.hover(None);
        }
        None => {}
    }
}

/// Lets freshly built label meshes cast shadows from the point light.
pub fn enable_label_shadows(
    mut commands: Commands,
    mut ready: MessageReader<LabelMeshReady>,
    cfg: Res<SceneConfig>,
) {
    for ev in ready.read() {
        if !cfg.light.shadows {
            continue;
        }
        debug!("label {:?} casts shadows", ev.label);
        if let Ok(mut mesh) = commands.get_entity(ev.mesh) {
            mesh.remove::<NotShadowCaster>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex_field::HexInstance;
    use crate::label::{
        AwaitingText, HitProxy, InteractiveLabel, LabelMaterials, LabelSettings, PendingTextMeshes,
        TextMesh,
    };
    use crate::scene::{OpenUrl, ScenePlugin, SceneState};
    use bevy::ecs::message::{MessageCursor, Messages};
    use bevy::ecs::system::RunSystemOnce;
    use bevy::input::mouse::MouseButtonInput;
    use bevy::input::{ButtonState, InputPlugin};
    use bevy::state::app::StatesPlugin;
    use bevy::window::ExitCondition;
    use std::time::Duration;

    // ── mount / unmount ─────────────────────────────────────────────

    fn scene_app() -> App {
        scene_app_with(SceneConfig {
            font_path: "does/not/exist.ttf".into(),
            ..default()
        })
    }

    fn scene_app_with(config: SceneConfig) -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin::default(),
            StatesPlugin,
            InputPlugin,
            WindowPlugin {
                primary_window: None,
                exit_condition: ExitCondition::DontExit,
                ..default()
            },
        ))
        .init_asset::<Mesh>()
        .init_asset::<StandardMaterial>()
        .add_plugins(ScenePlugin(config));
        app
    }

    fn count<C: Component>(world: &mut World) -> usize {
        world.query::<&C>().iter(world).count()
    }

    /// Updates until `done` holds, giving background loads time to land.
    fn update_until(app: &mut App, mut done: impl FnMut(&mut World) -> bool) -> bool {
        for _ in 0..2000 {
            app.update();
            if done(app.world_mut()) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[derive(Debug, PartialEq)]
    struct Census {
        roots: usize,
        hexes: usize,
        labels: usize,
        entities: usize,
    }

    fn census(world: &mut World) -> Census {
        Census {
            roots: count::<SceneRoot>(world),
            hexes: count::<HexInstance>(world),
            labels: count::<InteractiveLabel>(world),
            entities: world.query::<Entity>().iter(world).count(),
        }
    }

    fn set_state(app: &mut App, state: SceneState) {
        app.world_mut()
            .resource_mut::<NextState<SceneState>>()
            .set(state);
        app.update();
    }

    #[test]
    fn mount_builds_scene() {
        let mut app = scene_app();
        app.update();

        let world = app.world_mut();
        let counts = census(world);
        assert_eq!(counts.roots, 1);
        assert_eq!(counts.labels, SceneConfig::default().labels.len());
        assert!(counts.hexes > 0);
        assert_eq!(world.resource::<HitProxies>().len(), counts.labels);
        assert_eq!(count::<SceneCamera>(world), 1);
        assert_eq!(count::<PointerLight>(world), 1);
    }

    #[test]
    fn default_config_builds_a_text_mesh_for_every_label() {
        let labels = SceneConfig::default().labels.len();
        let mut app = scene_app_with(SceneConfig::default());
        let built = update_until(&mut app, |world| count::<TextMesh>(world) == labels);
        assert!(built, "text meshes never arrived");

        let world = app.world_mut();
        assert!(world.resource::<FontData>().bytes().is_some());
        assert_eq!(count::<AwaitingText>(world), 0);
        assert!(world.resource::<PendingTextMeshes>().0.is_empty());
        let proxies: Vec<Entity> = world
            .query::<&InteractiveLabel>()
            .iter(world)
            .map(|label| {
                assert!(label.mesh.is_some(), "{} has no mesh", label.text);
                label.proxy
            })
            .collect();
        for proxy in proxies {
            assert_ne!(world.get::<Transform>(proxy).unwrap().scale, Vec3::ZERO);
        }
        let shadowless = world
            .query_filtered::<(), (With<TextMesh>, With<NotShadowCaster>)>()
            .iter(world)
            .count();
        assert_eq!(shadowless, 0);
    }

    #[test]
    fn missing_font_leaves_labels_without_text() {
        let mut app = scene_app();
        let settled = update_until(&mut app, |world| {
            world.resource::<FontData>().is_failed() && count::<AwaitingText>(world) == 0
        });
        assert!(settled);

        let world = app.world_mut();
        assert_eq!(count::<TextMesh>(world), 0);
        assert!(world.resource::<PendingTextMeshes>().0.is_empty());
        assert_eq!(
            count::<InteractiveLabel>(world),
            SceneConfig::default().labels.len()
        );
    }

    #[test]
    fn unmount_removes_everything() {
        let mut app = scene_app();
        app.update();
        set_state(&mut app, SceneState::Unmounted);

        let world = app.world_mut();
        let counts = census(world);
        assert_eq!((counts.roots, counts.hexes, counts.labels), (0, 0, 0));
        assert!(!world.contains_resource::<MaterialCache>());
        assert!(!world.contains_resource::<HitProxies>());
        assert!(!world.contains_resource::<ViewportExtents>());
    }

    #[test]
    fn remount_leaves_no_stale_entities() {
        let mut app = scene_app();
        app.update();
        let first = census(app.world_mut());
        let materials = app.world().resource::<MaterialCache>().len();
        let generation = app.world().resource::<SceneGeneration>().0;

        set_state(&mut app, SceneState::Unmounted);
        set_state(&mut app, SceneState::Mounted);

        assert_eq!(census(app.world_mut()), first);
        assert_eq!(app.world().resource::<MaterialCache>().len(), materials);
        assert_eq!(app.world().resource::<SceneGeneration>().0, generation + 2);
    }

    #[test]
    fn palette_colors_share_materials() {
        let mut app = scene_app();
        app.update();
        // field + (base, hover, pressed) per label, minus shared entries
        let cfg = SceneConfig::default();
        let mut colors: Vec<String> = vec![cfg.field.color.clone()];
        for label in &cfg.labels {
            colors.push(label.color.clone());
            colors.push(label.resolved_hover_color());
            colors.push(label.resolved_pressed_color());
        }
        colors.sort();
        colors.dedup();
        assert_eq!(app.world().resource::<MaterialCache>().len(), colors.len());
    }

    // ── pointer interaction ─────────────────────────────────────────

    fn pointer_world(proxy_scale: Vec3) -> World {
        let mut world = World::new();
        world.init_resource::<Messages<OpenUrl>>();
        world.init_resource::<PointerState>();
        let proxy = world
            .spawn((
                HitProxy,
                GlobalTransform::from(Transform::from_scale(proxy_scale)),
            ))
            .id();
        let settings = LabelSettings::new("GITHUB", Vec3::ZERO).with_url("https://github.com");
        let label = world
            .spawn(InteractiveLabel::new(
                &settings,
                LabelMaterials::default(),
                proxy,
                Entity::PLACEHOLDER,
            ))
            .id();
        let mut proxies = HitProxies::default();
        proxies.insert(proxy, label);
        world.insert_resource(proxies);
        world
    }

    fn sent_urls(world: &World) -> Vec<OpenUrl> {
        let messages = world.resource::<Messages<OpenUrl>>();
        messages.get_cursor().read(messages).cloned().collect()
    }

    fn down_ray() -> Ray3d {
        Ray3d::new(Vec3::new(0.5, 10.0, 0.2), Dir3::NEG_Y)
    }

    #[test]
    fn click_on_proxy_opens_url_once() {
        let mut world = pointer_world(Vec3::new(4.0, 1.0, 2.0));
        world
            .run_system_once(|mut pointer: PointerCtx| {
                let hit = pointer.pick_label(down_ray());
                assert!(hit.is_some());
                pointer.hover(hit);
                pointer.press();
                pointer.release();
                pointer.release();
            })
            .unwrap();
        assert_eq!(
            sent_urls(&world),
            vec![OpenUrl("https://github.com".into())]
        );
    }

    #[test]
    fn leaving_before_release_cancels_click() {
        let mut world = pointer_world(Vec3::new(4.0, 1.0, 2.0));
        world
            .run_system_once(|mut pointer: PointerCtx| {
                let hit = pointer.pick_label(down_ray());
                pointer.hover(hit);
                pointer.press();
                pointer.hover(None);
                pointer.release();
            })
            .unwrap();
        assert!(sent_urls(&world).is_empty());
    }

    #[test]
    fn unbuilt_label_cannot_be_picked() {
        let mut world = pointer_world(Vec3::ZERO);
        world
            .run_system_once(|pointer: PointerCtx| {
                assert!(pointer.pick_label(down_ray()).is_none());
            })
            .unwrap();
    }

    // ── input wiring ────────────────────────────────────────────────

    const GITHUB: &str = "https://github.com";

    fn linked_label(app: &mut App, url: &str) -> Entity {
        let world = app.world_mut();
        world
            .query::<(Entity, &InteractiveLabel)>()
            .iter(world)
            .find(|(_, label)| label.url.as_deref() == Some(url))
            .map(|(entity, _)| entity)
            .unwrap()
    }

    /// Mounted app with the pointer resting on the GitHub label.
    ///
    /// The test camera never gets a viewport, so no ray can pick; hover is
    /// placed directly and the input systems take it from there.
    fn hovering_app() -> (App, Entity) {
        let mut app = scene_app();
        app.update();
        let label = linked_label(&mut app, GITHUB);
        let world = app.world_mut();
        world
            .get_mut::<InteractiveLabel>(label)
            .unwrap()
            .set_hovered(true);
        world.resource_mut::<PointerState>().hovered = Some(label);
        (app, label)
    }

    fn url_cursor(app: &App) -> MessageCursor<OpenUrl> {
        app.world().resource::<Messages<OpenUrl>>().get_cursor()
    }

    fn opened(app: &App, cursor: &mut MessageCursor<OpenUrl>) -> Vec<String> {
        let messages = app.world().resource::<Messages<OpenUrl>>();
        cursor
            .read(messages)
            .map(|OpenUrl(url)| url.clone())
            .collect()
    }

    fn touch(app: &mut App, phase: TouchPhase) {
        app.world_mut().write_message(TouchInput {
            phase,
            position: Vec2::new(640.0, 360.0),
            window: Entity::PLACEHOLDER,
            force: None,
            id: 0,
        });
        app.update();
    }

    fn mouse(app: &mut App, state: ButtonState) {
        app.world_mut().write_message(MouseButtonInput {
            button: MouseButton::Left,
            state,
            window: Entity::PLACEHOLDER,
        });
        app.update();
    }

    fn pointer_over(app: &mut App) -> bool {
        let world = app.world_mut();
        world
            .query::<&PointerLight>()
            .single(world)
            .unwrap()
            .pointer_over
    }

    fn interaction(app: &App, label: Entity) -> (bool, bool) {
        let label = app.world().get::<InteractiveLabel>(label).unwrap();
        (label.interaction.hovered(), label.interaction.pressed())
    }

    #[test]
    fn touch_start_presses_and_touch_end_opens_once() {
        let (mut app, label) = hovering_app();
        let mut urls = url_cursor(&app);

        touch(&mut app, TouchPhase::Started);
        assert!(pointer_over(&mut app));
        assert_eq!(interaction(&app, label), (true, true));
        assert!(opened(&app, &mut urls).is_empty());

        touch(&mut app, TouchPhase::Ended);
        assert_eq!(opened(&app, &mut urls), vec![GITHUB.to_owned()]);
        assert!(!pointer_over(&mut app));
        assert_eq!(interaction(&app, label), (false, false));
        assert_eq!(app.world().resource::<PointerState>().hovered, None);

        app.update();
        assert!(opened(&app, &mut urls).is_empty());
    }

    #[test]
    fn touch_cancel_clears_hover_without_navigating() {
        let (mut app, label) = hovering_app();
        let mut urls = url_cursor(&app);

        touch(&mut app, TouchPhase::Started);
        touch(&mut app, TouchPhase::Canceled);
        assert!(opened(&app, &mut urls).is_empty());
        assert_eq!(interaction(&app, label), (false, false));
        assert_eq!(app.world().resource::<PointerState>().hovered, None);
        assert!(!pointer_over(&mut app));
    }

    #[test]
    fn mouse_click_on_hovered_link_opens_it() {
        let (mut app, _) = hovering_app();
        let mut urls = url_cursor(&app);

        mouse(&mut app, ButtonState::Pressed);
        assert!(opened(&app, &mut urls).is_empty());
        mouse(&mut app, ButtonState::Released);
        assert_eq!(opened(&app, &mut urls), vec![GITHUB.to_owned()]);
    }

    #[test]
    fn cursor_leaving_clears_hover_and_resumes_orbit() {
        let (mut app, label) = hovering_app();
        let window = Entity::PLACEHOLDER;

        app.world_mut().write_message(CursorEntered { window });
        app.update();
        assert!(pointer_over(&mut app));
        // as if the pointer had steered the light near the center
        let world = app.world_mut();
        world
            .query::<&mut PointerLight>()
            .single_mut(world)
            .unwrap()
            .goal = Vec3::new(1.0, 6.0, 1.0);

        app.world_mut().write_message(CursorLeft { window });
        app.update();
        assert!(!pointer_over(&mut app));
        assert_eq!(interaction(&app, label), (false, false));
        assert_eq!(app.world().resource::<PointerState>().hovered, None);

        let radius = app.world().resource::<SceneConfig>().light.orbit_radius;
        let world = app.world_mut();
        let goal = world.query::<&PointerLight>().single(world).unwrap().goal;
        assert!((Vec2::new(goal.x, goal.z).length() - radius).abs() < 1e-3);
    }

    #[test]
    fn cursor_moves_without_a_viewport_change_nothing() {
        let (mut app, label) = hovering_app();
        app.world_mut().write_message(CursorMoved {
            window: Entity::PLACEHOLDER,
            position: Vec2::new(10.0, 10.0),
            delta: None,
        });
        app.update();
        assert!(!pointer_over(&mut app));
        assert_eq!(interaction(&app, label), (true, false));
        assert_eq!(app.world().resource::<PointerState>().hovered, Some(label));
    }

    // ── shadows ─────────────────────────────────────────────────────

    fn shadow_world(shadows: bool) -> (World, Entity) {
        let mut world = World::new();
        let mut cfg = SceneConfig::default();
        cfg.light.shadows = shadows;
        world.insert_resource(cfg);
        world.init_resource::<Messages<LabelMeshReady>>();
        let label = world.spawn_empty().id();
        let mesh = world.spawn(NotShadowCaster).id();
        world
            .resource_mut::<Messages<LabelMeshReady>>()
            .write(LabelMeshReady { label, mesh });
        (world, mesh)
    }

    #[test]
    fn ready_text_mesh_casts_shadows() {
        let (mut world, mesh) = shadow_world(true);
        world.run_system_once(enable_label_shadows).unwrap();
        assert!(world.get::<NotShadowCaster>(mesh).is_none());
    }

    #[test]
    fn text_mesh_stays_shadowless_when_light_shadows_are_off() {
        let (mut world, mesh) = shadow_world(false);
        world.run_system_once(enable_label_shadows).unwrap();
        assert!(world.get::<NotShadowCaster>(mesh).is_some());
    }
}
