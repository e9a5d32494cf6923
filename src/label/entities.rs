use bevy::prelude::*;

use super::LabelSettings;

/// Which part of the text sits on the label's anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum Alignment {
    /// Text starts at the anchor.
    Left,
    /// Text is centered on the anchor.
    #[default]
    Center,
    /// Text ends at the anchor.
    Right,
}

impl Alignment {
    /// Multiple of the half-width the text is shifted left by.
    pub fn factor(self) -> f32 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => 1.0,
            Alignment::Right => 2.0,
        }
    }
}

/// Visible interaction state of a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelState {
    /// Not under the pointer.
    Idle,
    /// Under the pointer.
    Hovered,
    /// Pointer went down on it and has not been released.
    Pressed,
}

/// Hover/press flags. Navigation fires on the pressed → released edge, and
/// only while still hovered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub struct LabelInteraction {
    hovered: bool,
    pressed: bool,
}

impl LabelInteraction {
    /// `true` while the pointer is over the label.
    pub fn hovered(&self) -> bool {
        self.hovered
    }

    /// `true` between press and release.
    pub fn pressed(&self) -> bool {
        self.pressed
    }

    /// Updates the hover flag.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Updates the press flag; returns `true` when this is a release that
    /// should navigate.
    pub fn set_pressed(&mut self, pressed: bool) -> bool {
        let navigate = self.hovered && self.pressed && !pressed;
        self.pressed = pressed;
        navigate
    }

    /// State derived from the two flags; pressed wins over hovered.
    pub fn state(&self) -> LabelState {
        if self.pressed {
            LabelState::Pressed
        } else if self.hovered {
            LabelState::Hovered
        } else {
            LabelState::Idle
        }
    }
}

/// One material per interaction state.
#[derive(Clone, Debug, Default, Reflect)]
pub struct LabelMaterials {
    /// Idle material.
    pub base: Handle<StandardMaterial>,
    /// Hover material.
    pub hover: Handle<StandardMaterial>,
    /// Pressed material.
    pub pressed: Handle<StandardMaterial>,
}

impl LabelMaterials {
    /// Material shown in `state`.
    pub fn for_state(&self, state: LabelState) -> &Handle<StandardMaterial> {
        match state {
            LabelState::Idle => &self.base,
            LabelState::Hovered => &self.hover,
            LabelState::Pressed => &self.pressed,
        }
    }
}

/// Root component of a clickable text label.
#[derive(Component, Reflect, Debug, Clone)]
pub struct InteractiveLabel {
    /// Rendered string.
    pub text: String,
    /// Navigation target; `None` makes the label inert.
    pub url: Option<String>,
    /// Glyph height in world-units.
    pub size: f32,
    /// Horizontal alignment around the anchor.
    pub alignment: Alignment,
    /// Unscaled extrusion depth.
    pub depth: f32,
    /// Hover/press flags.
    pub interaction: LabelInteraction,
    /// Per-state materials.
    pub materials: LabelMaterials,
    /// Invisible hit-test box child.
    pub proxy: Entity,
    /// Underline child.
    pub underline: Entity,
    /// Text mesh child, once the async build has finished.
    pub mesh: Option<Entity>,
}

impl InteractiveLabel {
    /// Label for `settings` with its proxy and underline already spawned.
    pub fn new(
        settings: &LabelSettings,
        materials: LabelMaterials,
        proxy: Entity,
        underline: Entity,
    ) -> Self {
        Self {
            text: settings.text.clone(),
            url: settings.url.clone(),
            size: settings.size,
            alignment: settings.alignment,
            depth: settings.depth,
            interaction: LabelInteraction::default(),
            materials,
            proxy,
            underline,
            mesh: None,
        }
    }

    /// Current interaction state.
    pub fn state(&self) -> LabelState {
        self.interaction.state()
    }

    /// Hover enter/leave. Ignored for labels without a URL.
    pub fn set_hovered(&mut self, hovered: bool) {
        if self.url.is_none() {
            return;
        }
        self.interaction.set_hovered(hovered);
    }

    /// Press/release. Returns the URL to open when a release completes a
    /// click. Ignored for labels without a URL.
    pub fn set_pressed(&mut self, pressed: bool) -> Option<String> {
        let url = self.url.as_ref()?;
        self.interaction.set_pressed(pressed).then(|| url.clone())
    }

    /// Material for the current state.
    pub fn material(&self) -> Handle<StandardMaterial> {
        self.materials.for_state(self.state()).clone()
    }
}

/// Marker for a label's invisible hit-test box.
#[derive(Component, Reflect)]
pub struct HitProxy;

/// Marker for a label's underline strip.
#[derive(Component, Reflect)]
pub struct Underline;

/// Marker for a label's generated text mesh.
#[derive(Component, Reflect)]
pub struct TextMesh;

/// Label whose text build waits for the font.
#[derive(Component, Reflect)]
pub struct AwaitingText;

/// Measured bounds of the unscaled text mesh.
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq)]
pub struct LabelBounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl LabelBounds {
    /// Half the size along each axis.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Midpoint.
    pub fn center(&self) -> Vec3 {
        (self.max + self.min) * 0.5
    }
}

/// Child placements derived from measured bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLayout {
    /// Local transform of the text mesh.
    pub mesh: Transform,
    /// Local transform of the unit-cube hit proxy.
    pub proxy: Transform,
    /// Local transform of the unit-cube underline.
    pub underline: Transform,
    /// On-ground width of the text at unit root scale.
    pub width: f32,
}

impl LabelLayout {
    /// Lays out a label whose unscaled mesh spans `bounds`.
    pub fn new(bounds: LabelBounds, size: f32, alignment: Alignment) -> Self {
        let ext = bounds.half_extents() * size;
        let shift = -alignment.factor() * ext.x;
        let center = bounds.center() * size;
        let center_x = shift + ext.x;

        let mesh = Transform::from_xyz(shift - bounds.min.x * size, 0.0, 0.0)
            .with_scale(Vec3::splat(size));
        let proxy = Transform::from_xyz(center_x, center.y, center.z)
            .with_scale((ext * 2.0).max(Vec3::splat(0.01)));
        // screen-down is +Z under the top-down camera
        let underline = Transform::from_xyz(center_x, 0.05, bounds.max.z * size + 0.15 * size)
            .with_scale(Vec3::new(ext.x * 2.0, 0.05 * size, 0.08 * size));

        Self {
            mesh,
            proxy,
            underline,
            width: ext.x * 2.0,
        }
    }
}

/// Written once a label's text mesh has been spawned.
#[derive(Message, Debug, Clone, Copy)]
pub struct LabelMeshReady {
    /// Owning label.
    pub label: Entity,
    /// New text mesh entity.
    pub mesh: Entity,
}
