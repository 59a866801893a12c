pub mod accessor;
pub mod buffer;
pub mod glb;
pub mod mesh;
pub mod parser;
pub mod schema;
pub mod store;

use std::path::PathBuf;

use accessor::AccessorReader;
use buffer::ByteBufferStore;
use mesh::PrimitiveData;

use crate::{error::LoadError, scene_graph::SceneGraph, skinning::Skin};

pub use parser::AssetParser;
pub use store::{AssetId, AssetStore};

/// A fully loaded scene asset. Immutable once built and shared between scene
/// instances; `scene` is the bind-pose template every instance clones.
#[derive(Debug)]
pub struct Asset {
    pub document: schema::Document,
    pub buffers: ByteBufferStore,
    pub scene: SceneGraph,
    pub skins: Vec<Skin>,
    pub base_path: PathBuf,
}

impl Asset {
    pub fn reader(&self) -> AccessorReader<'_> {
        AccessorReader {
            buffer_views: &self.document.buffer_views,
            accessors: &self.document.accessors,
            buffers: &self.buffers,
        }
    }

    pub fn animation_count(&self) -> usize {
        self.document.animations.len()
    }

    pub fn find_animation(&self, name: &str) -> Option<usize> {
        self.document
            .animations
            .iter()
            .position(|a| a.name.as_deref() == Some(name))
    }

    /// Nodes of the default scene, or every root when no scene is declared.
    pub fn scene_roots(&self) -> Vec<usize> {
        let scene = self.document.scene.unwrap_or(0);
        match self.document.scenes.get(scene) {
            Some(scene) => scene.nodes.clone(),
            None => self.scene.roots().to_vec(),
        }
    }

    pub fn primitive_data(&self, mesh: usize, primitive: usize) -> Result<PrimitiveData, LoadError> {
        let meshes = &self.document.meshes;
        let m = meshes
            .get(mesh)
            .ok_or_else(|| LoadError::missing("meshes", mesh, meshes.len(), "primitive lookup"))?;
        let p = m.primitives.get(primitive).ok_or_else(|| {
            LoadError::missing("primitives", primitive, m.primitives.len(), format!("mesh {}", mesh))
        })?;
        PrimitiveData::read(&self.reader(), p)
    }
}
