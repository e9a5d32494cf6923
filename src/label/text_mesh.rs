//! Off-thread text tessellation.

use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext, LoadState, RenderAssetUsages};
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use meshtext::{MeshGenerator, MeshText, TextSection};
use thiserror::Error;

use super::entities::LabelBounds;
use crate::math;

/// Why a label's text mesh could not be produced.
#[derive(Debug, Error)]
pub enum TextMeshError {
    /// The font could not shape or tessellate the text.
    #[error("failed to tessellate {text:?}: {reason}")]
    Tessellation {
        /// Text being built.
        text: String,
        /// Error reported by the tessellator.
        reason: String,
    },
    /// Tessellation succeeded but produced no triangles.
    #[error("text {0:?} produced no geometry")]
    Empty(String),
}

/// Raw bytes of a TrueType or OpenType font file.
#[derive(Asset, TypePath, Debug)]
pub struct FontBytes(pub Vec<u8>);

/// Loads `.ttf`/`.otf` files as [`FontBytes`].
#[derive(Default, TypePath)]
pub struct FontBytesLoader;

impl AssetLoader for FontBytesLoader {
    type Asset = FontBytes;
    type Settings = ();
    type Error = std::io::Error;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<FontBytes, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(FontBytes(bytes))
    }

    fn extensions(&self) -> &[&str] {
        &["ttf", "otf"]
    }
}

#[derive(Debug, Default)]
enum FontState {
    #[default]
    Unrequested,
    Loading(Handle<FontBytes>),
    Loaded(&'static [u8]),
    Failed,
}

/// Font shared by every label for the life of the process.
///
/// Requested through the [`AssetServer`] on the first mount; once the asset
/// arrives its bytes are kept for good, so remounts never load it again.
#[derive(Resource, Debug, Default)]
pub struct FontData {
    path: String,
    state: FontState,
}

impl FontData {
    /// Starts loading the font at asset path `path`. Later calls are no-ops.
    pub fn request(&mut self, server: &AssetServer, path: &str) {
        if matches!(self.state, FontState::Unrequested) {
            debug!("loading font {path}");
            self.path = path.to_owned();
            self.state = FontState::Loading(server.load(path.to_owned()));
        }
    }

    /// Moves a pending load to loaded or failed once the server knows.
    pub fn resolve(&mut self, server: &AssetServer, fonts: &Assets<FontBytes>) {
        let FontState::Loading(handle) = &self.state else {
            return;
        };
        if let Some(font) = fonts.get(handle) {
            info!("loaded font {} ({} bytes)", self.path, font.0.len());
            self.state = FontState::Loaded(Box::leak(font.0.clone().into_boxed_slice()));
        } else if let LoadState::Failed(err) = server.load_state(handle.id()) {
            warn!("labels will have no visible text: {err}");
            self.state = FontState::Failed;
        }
    }

    /// Loaded font bytes.
    pub fn bytes(&self) -> Option<&'static [u8]> {
        match self.state {
            FontState::Loaded(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// `true` once loading has failed for good.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, FontState::Failed)
    }
}

/// Tessellated, unscaled text ready to become a [`Mesh`].
#[derive(Debug, Clone)]
pub struct TextGeometry {
    /// Non-indexed triangle list.
    pub positions: Vec<[f32; 3]>,
    /// Flat per-triangle normals.
    pub normals: Vec<[f32; 3]>,
    /// Bounds of `positions`.
    pub bounds: LabelBounds,
}

impl TextGeometry {
    /// Converts into a render mesh.
    pub fn into_mesh(self) -> Mesh {
        let uvs = vec![[0.0_f32, 0.0]; self.positions.len()];
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    }
}

/// Shapes and extrudes `text` with `font`, `depth` units tall.
pub fn build_text_geometry(
    font: &'static [u8],
    text: &str,
    depth: f32,
) -> Result<TextGeometry, TextMeshError> {
    let mut generator = MeshGenerator::new(font);
    let raw: MeshText = generator
        .generate_section(text, false, None)
        .map_err(|err| TextMeshError::Tessellation {
            text: text.to_owned(),
            reason: err.to_string(),
        })?;
    bake(&raw.vertices, depth).ok_or_else(|| TextMeshError::Empty(text.to_owned()))
}

/// Lays glyph-space triangles flat on the ground.
///
/// Glyph `x` stays `x`, glyph `y` (up the page) becomes `-z` (up the screen
/// under the top-down camera) and the extrusion axis becomes `y`, rescaled
/// to `[0, depth]`.
pub fn bake(vertices: &[f32], depth: f32) -> Option<TextGeometry> {
    let (z_min, z_max) = vertices
        .chunks_exact(3)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v[2]), hi.max(v[2]))
        });
    let thickness = z_max - z_min;
    let lift = |z: f32| {
        if thickness > f32::EPSILON {
            (z - z_min) / thickness * depth
        } else {
            0.0
        }
    };

    let points: Vec<Vec3> = vertices
        .chunks_exact(3)
        .map(|v| Vec3::new(v[0], lift(v[2]), -v[1]))
        .collect();
    if points.len() < 3 {
        return None;
    }

    let mut normals = Vec::with_capacity(points.len());
    for tri in points.chunks_exact(3) {
        let n = math::compute_normal(tri[0], tri[1], tri[2]);
        normals.extend([n.to_array(); 3]);
    }
    let points = &points[..normals.len()];

    let (min, max) = points.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );

    Some(TextGeometry {
        positions: points.iter().map(|p| p.to_array()).collect(),
        normals,
        bounds: LabelBounds { min, max },
    })
}

/// One in-flight text build.
pub struct PendingTextMesh {
    /// Label the mesh belongs to.
    pub label: Entity,
    /// Scene generation the build was started under.
    pub generation: u64,
    /// Background task.
    pub task: Task<Result<TextGeometry, TextMeshError>>,
}

/// Text builds not yet collected by `poll_text_meshes`.
///
/// Held outside the label entities so despawning a scene leaves running
/// builds alone; their results are dropped when they finish.
#[derive(Resource, Default)]
pub struct PendingTextMeshes(pub Vec<PendingTextMesh>);

impl PendingTextMeshes {
    /// Starts building `text` for `label` on the async compute pool.
    pub fn spawn(
        &mut self,
        label: Entity,
        generation: u64,
        font: &'static [u8],
        text: String,
        depth: f32,
    ) {
        let task = AsyncComputeTaskPool::get()
            .spawn(async move { build_text_geometry(font, &text, depth) });
        self.0.push(PendingTextMesh {
            label,
            generation,
            task,
        });
    }
}
