use glam::{Vec2, Vec3, Vec4};

use super::{accessor::AccessorReader, schema};
use crate::error::LoadError;

/// Vertex and index data of one primitive, decoded for the render backend.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveData {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_coords: Option<Vec<Vec2>>,
    pub joints: Option<Vec<[u16; 4]>>,
    pub weights: Option<Vec<Vec4>>,
    pub indices: Option<Vec<u32>>,
    pub material: Option<usize>,
    pub mode: schema::PrimitiveMode,
}

impl PrimitiveData {
    pub fn read(reader: &AccessorReader, primitive: &schema::Primitive) -> Result<Self, LoadError> {
        let attribute = |name: &str| primitive.attributes.get(name).copied();

        let positions = match attribute("POSITION") {
            Some(accessor) => reader.read_vec3s(accessor)?,
            None => vec![],
        };
        let normals = attribute("NORMAL").map(|a| reader.read_vec3s(a)).transpose()?;
        let tex_coords = attribute("TEXCOORD_0").map(|a| reader.read_vec2s(a)).transpose()?;
        let joints = attribute("JOINTS_0").map(|a| reader.read_joint_indices(a)).transpose()?;
        // weights may be normalized u8/u16, read_vec4s converts them
        let weights = attribute("WEIGHTS_0").map(|a| reader.read_vec4s(a)).transpose()?;
        let indices = primitive.indices.map(|a| reader.read_indices(a)).transpose()?;

        Ok(Self {
            positions,
            normals,
            tex_coords,
            joints,
            weights,
            indices,
            material: primitive.material,
            mode: primitive.mode,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
