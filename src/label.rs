//! Clickable 3D text labels.
//!
//! A label is an extruded text mesh with an invisible hit-test box and an
//! underline strip. Geometry is built off-thread once the font has loaded;
//! until it arrives the label exists with a zero-sized hit box and cannot be
//! picked.

mod entities;
pub mod systems;
mod text_mesh;

pub use entities::{
    Alignment, AwaitingText, HitProxy, InteractiveLabel, LabelBounds, LabelMeshReady, TextMesh,
    Underline,
};
#[cfg(test)]
pub use entities::LabelMaterials;
pub use text_mesh::{FontBytes, FontBytesLoader, FontData, PendingTextMeshes};

use bevy::prelude::*;

use crate::materials::lighten;

/// Declarative description of one label.
#[derive(Clone, Debug, Reflect)]
pub struct LabelSettings {
    /// Rendered string.
    pub text: String,
    /// Anchor on the ground plane.
    pub position: Vec3,
    /// Glyph height in world-units.
    pub size: f32,
    /// Extrusion depth of the text, before `size` is applied.
    pub depth: f32,
    /// Which part of the text sits on `position`.
    pub alignment: Alignment,
    /// Idle color.
    pub color: String,
    /// Hover color; derived from `color` when unset.
    pub hover_color: Option<String>,
    /// Pressed color; derived from `color` when unset.
    pub pressed_color: Option<String>,
    /// Navigation target. Labels without one ignore hover and press.
    pub url: Option<String>,
}

impl LabelSettings {
    /// Centered, gray label with no link.
    pub fn new(text: impl Into<String>, position: Vec3) -> Self {
        Self {
            text: text.into(),
            position,
            size: 2.0,
            depth: 0.5,
            alignment: Alignment::Center,
            color: "#cccccc".into(),
            hover_color: None,
            pressed_color: None,
            url: None,
        }
    }

    /// Sets the glyph height.
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Sets the extrusion depth.
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the horizontal alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the idle color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Overrides the derived hover color.
    pub fn with_hover_color(mut self, color: impl Into<String>) -> Self {
        self.hover_color = Some(color.into());
        self
    }

    /// Overrides the derived pressed color.
    pub fn with_pressed_color(mut self, color: impl Into<String>) -> Self {
        self.pressed_color = Some(color.into());
        self
    }

    /// Makes the label a link.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Hover color, or the idle color lightened by 0.1.
    pub fn resolved_hover_color(&self) -> String {
        self.resolve(self.hover_color.as_deref(), 0.1)
    }

    /// Pressed color, or the idle color lightened by 0.2.
    pub fn resolved_pressed_color(&self) -> String {
        self.resolve(self.pressed_color.as_deref(), 0.2)
    }

    fn resolve(&self, explicit: Option<&str>, amount: f32) -> String {
        match explicit {
            Some(color) => color.to_owned(),
            None => lighten(&self.color, amount).unwrap_or_else(|_| self.color.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_colors_lighten_base() {
        let settings = LabelSettings::new("A", Vec3::ZERO);
        assert_eq!(settings.resolved_hover_color(), "#e6e6e6");
        assert_eq!(settings.resolved_pressed_color(), "#ffffff");
    }

    #[test]
    fn explicit_colors_win() {
        let settings = LabelSettings::new("A", Vec3::ZERO)
            .with_hover_color("#112233")
            .with_pressed_color("#445566");
        assert_eq!(settings.resolved_hover_color(), "#112233");
        assert_eq!(settings.resolved_pressed_color(), "#445566");
    }

    #[test]
    fn invalid_base_color_is_passed_through() {
        let settings = LabelSettings::new("A", Vec3::ZERO).with_color("nope");
        assert_eq!(settings.resolved_hover_color(), "nope");
    }
}
