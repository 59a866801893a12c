use glam::Mat4;
use serde::Serialize;

use crate::sim::SceneInstance;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuMat4 {
    /// column-major
    pub cols: [[f32; 4]; 4],
}
impl Default for GpuMat4 {
    fn default() -> Self {
        Self::from(Mat4::IDENTITY)
    }
}
impl From<Mat4> for GpuMat4 {
    fn from(m: Mat4) -> Self {
        Self { cols: m.to_cols_array_2d() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeshInstance {
    pub node: usize,
    pub mesh: usize,
    /// skin index, matches `PaletteSnapshot::skin`
    pub skin: Option<usize>,
    pub transform: GpuMat4,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaletteSnapshot {
    pub skin: usize,
    pub joints: Vec<GpuMat4>,
}

/// Everything the render backend needs from one scene instance for a frame.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub time: f32,
    pub world_matrices: Vec<GpuMat4>,
    pub mesh_instances: Vec<MeshInstance>,
    pub palettes: Vec<PaletteSnapshot>,
}

fn accumulate_mesh_instances(instance: &SceneInstance, node: usize, out: &mut Vec<MeshInstance>) {
    let Some(n) = instance.graph.node(node) else {
        return;
    };
    if let Some(mesh) = n.mesh {
        out.push(MeshInstance { node, mesh, skin: n.skin, transform: n.world().into() });
    }
    for &child in &n.children {
        accumulate_mesh_instances(instance, child, out);
    }
}

impl RenderSnapshot {
    pub fn build(instance: &SceneInstance, time: f32) -> Self {
        let world_matrices = instance.graph.nodes().iter().map(|n| n.world().into()).collect();

        let mut mesh_instances = vec![];
        for root in instance.asset.scene_roots() {
            accumulate_mesh_instances(instance, root, &mut mesh_instances);
        }

        let palettes = instance
            .palettes
            .iter()
            .map(|p| PaletteSnapshot {
                skin: p.skin,
                joints: p.matrices.iter().map(|&m| m.into()).collect(),
            })
            .collect();

        Self { time, world_matrices, mesh_instances, palettes }
    }

    /// Joint matrices of one skin as raw bytes, ready for a storage buffer.
    pub fn palette_bytes(&self, skin: usize) -> Option<&[u8]> {
        self.palettes
            .iter()
            .find(|p| p.skin == skin)
            .map(|p| bytemuck::cast_slice(&p.joints))
    }
}
