//! Color → material memoization.
//!
//! Every color string used by the scene resolves to one shared
//! [`StandardMaterial`] handle, so labels that share a palette entry also share
//! the GPU resource. The cache lives for one mount of the scene and is never
//! evicted; the palette is small and fixed.

use bevy::color::HexColorError;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

/// Per-scene mapping from normalized hex color to material handle.
#[derive(Resource, Default)]
pub struct MaterialCache {
    materials: HashMap<String, Handle<StandardMaterial>>,
}

impl MaterialCache {
    /// Returns the cached material for `color`, creating it on first use.
    ///
    /// `color` is a CSS-style hex string (`#rgb`, `#rrggbb`, with or without
    /// `#`, any case). Spellings of the same color share one entry.
    pub fn get_or_create(
        &mut self,
        color: &str,
        materials: &mut Assets<StandardMaterial>,
    ) -> Result<Handle<StandardMaterial>, HexColorError> {
        let key = normalize(color);
        if let Some(handle) = self.materials.get(&key) {
            return Ok(handle.clone());
        }

        let srgba = Srgba::hex(&key)?;
        let handle = materials.add(StandardMaterial {
            base_color: srgba.into(),
            // matte, no specular highlight
            reflectance: 0.0,
            perceptual_roughness: 1.0,
            cull_mode: None,
            double_sided: true,
            ..default()
        });
        self.materials.insert(key, handle.clone());
        Ok(handle)
    }

    /// Number of distinct colors materialized so far.
    pub fn len(&self) -> usize {
        self.materials.len()
    }
}

/// Adds `amount` to each RGB channel of `color`, clamped to 1.
pub fn lighten(color: &str, amount: f32) -> Result<String, HexColorError> {
    let c = Srgba::hex(color.trim())?;
    Ok(to_hex(Srgba::rgb(
        (c.red + amount).min(1.0),
        (c.green + amount).min(1.0),
        (c.blue + amount).min(1.0),
    )))
}

fn to_hex(c: Srgba) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(c.red),
        channel(c.green),
        channel(c.blue)
    )
}

/// `#rrggbb[aa]` in lowercase; `#rgb[a]` shorthand is expanded.
fn normalize(color: &str) -> String {
    let digits = color.trim().trim_start_matches('#').to_ascii_lowercase();
    let mut key = String::with_capacity(9);
    key.push('#');
    if matches!(digits.len(), 3 | 4) {
        for c in digits.chars() {
            key.extend([c, c]);
        }
    } else {
        key.push_str(&digits);
    }
    key
}
