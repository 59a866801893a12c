use std::path::Path;

use super::{
    buffer::{ByteBufferStore, FileSource},
    glb::{self, Glb},
    schema::Document,
    Asset,
};
use crate::{config::ImportConfig, error::LoadError, scene_graph::SceneGraph, skinning::Skin};

fn check_index(table: &'static str, index: usize, len: usize, referrer: impl FnOnce() -> String) -> Result<(), LoadError> {
    if index < len {
        Ok(())
    } else {
        Err(LoadError::missing(table, index, len, referrer()))
    }
}

/// Cross-table references that are cheap to check up front. Accessor byte
/// ranges are left to the first read.
fn validate_tables(doc: &Document, buffers: &ByteBufferStore) -> Result<(), LoadError> {
    for (i, view) in doc.buffer_views.iter().enumerate() {
        let buffer = buffers
            .get(view.buffer)
            .ok_or_else(|| LoadError::missing("buffers", view.buffer, buffers.len(), format!("bufferView {}", i)))?;
        let fits = view.byte_offset.checked_add(view.byte_length).is_some_and(|end| end <= buffer.len());
        if !fits {
            return Err(LoadError::BufferViewRange {
                view: i,
                offset: view.byte_offset,
                length: view.byte_length,
                buffer_len: buffer.len(),
            });
        }
    }

    let views = doc.buffer_views.len();
    for (i, accessor) in doc.accessors.iter().enumerate() {
        if let Some(view) = accessor.buffer_view {
            check_index("bufferViews", view, views, || format!("accessor {}", i))?;
        }
        if let Some(sparse) = &accessor.sparse {
            check_index("bufferViews", sparse.indices.buffer_view, views, || format!("sparse indices of accessor {}", i))?;
            check_index("bufferViews", sparse.values.buffer_view, views, || format!("sparse values of accessor {}", i))?;
        }
    }

    for (i, image) in doc.images.iter().enumerate() {
        if let Some(view) = image.buffer_view {
            check_index("bufferViews", view, views, || format!("image {}", i))?;
        }
    }
    for (i, texture) in doc.textures.iter().enumerate() {
        if let Some(source) = texture.source {
            check_index("images", source, doc.images.len(), || format!("texture {}", i))?;
        }
        if let Some(sampler) = texture.sampler {
            check_index("samplers", sampler, doc.samplers.len(), || format!("texture {}", i))?;
        }
    }
    for (i, material) in doc.materials.iter().enumerate() {
        let pbr = &material.pbr_metallic_roughness;
        let textures = [
            &pbr.base_color_texture,
            &pbr.metallic_roughness_texture,
            &material.normal_texture,
            &material.occlusion_texture,
            &material.emissive_texture,
        ];
        for info in textures.into_iter().flatten() {
            check_index("textures", info.index, doc.textures.len(), || format!("material {}", i))?;
        }
    }

    let accessors = doc.accessors.len();
    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, primitive) in mesh.primitives.iter().enumerate() {
            let referrer = || format!("mesh {} primitive {}", m, p);
            for &accessor in primitive.attributes.values() {
                check_index("accessors", accessor, accessors, referrer)?;
            }
            if let Some(indices) = primitive.indices {
                check_index("accessors", indices, accessors, referrer)?;
            }
            if let Some(material) = primitive.material {
                check_index("materials", material, doc.materials.len(), referrer)?;
            }
        }
    }

    for (i, node) in doc.nodes.iter().enumerate() {
        if let Some(mesh) = node.mesh {
            check_index("meshes", mesh, doc.meshes.len(), || format!("node {}", i))?;
        }
        if let Some(skin) = node.skin {
            check_index("skins", skin, doc.skins.len(), || format!("node {}", i))?;
        }
    }
    for (i, scene) in doc.scenes.iter().enumerate() {
        for &node in &scene.nodes {
            check_index("nodes", node, doc.nodes.len(), || format!("scene {}", i))?;
        }
    }
    if let Some(scene) = doc.scene {
        check_index("scenes", scene, doc.scenes.len(), || "default scene".to_string())?;
    }
    Ok(())
}

/// Turns a scene description (JSON or binary container) into an [`Asset`].
pub struct AssetParser<'a> {
    source: &'a dyn FileSource,
    config: ImportConfig,
}

impl<'a> AssetParser<'a> {
    pub fn new(source: &'a dyn FileSource, config: ImportConfig) -> Self {
        Self { source, config }
    }

    /// External buffers resolve against the file's directory.
    pub fn parse_file(&self, path: &Path) -> Result<Asset, LoadError> {
        let bytes = self.source.read(path).map_err(|e| LoadError::io(path, e))?;
        let base_path = path.parent().unwrap_or(Path::new(""));
        self.parse(&bytes, base_path)
    }

    pub fn parse(&self, bytes: &[u8], base_path: &Path) -> Result<Asset, LoadError> {
        let (json, bin) = if glb::is_glb(bytes) {
            let container = Glb::parse(bytes)?;
            (container.json, container.bin.map(<[u8]>::to_vec))
        } else {
            (bytes, None)
        };

        let document: Document = serde_json::from_slice(json)?;
        let buffers = ByteBufferStore::load(&document.buffers, base_path, self.source, bin, self.config.max_buffer_bytes)?;
        validate_tables(&document, &buffers)?;

        let scene = SceneGraph::from_nodes(&document.nodes)?;

        let reader = super::accessor::AccessorReader {
            buffer_views: &document.buffer_views,
            accessors: &document.accessors,
            buffers: &buffers,
        };
        let skins = document
            .skins
            .iter()
            .enumerate()
            .map(|(i, skin)| Skin::load(i, skin, &reader, scene.len()))
            .collect::<Result<Vec<_>, _>>()?;

        let shown = if base_path.as_os_str().is_empty() { Path::new(".") } else { base_path };
        tracing::info!(
            "loaded asset from {}: {} buffers, {} accessors, {} nodes, {} meshes, {} skins, {} animations",
            shown.display(),
            buffers.len(),
            document.accessors.len(),
            scene.len(),
            document.meshes.len(),
            skins.len(),
            document.animations.len(),
        );

        Ok(Asset {
            document,
            buffers,
            scene,
            skins,
            base_path: base_path.to_path_buf(),
        })
    }
}
